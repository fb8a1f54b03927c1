//! HTML extraction
//!
//! Extractors turn a fetched page body into zero or more records. They
//! are the second injectable seam of the retry loop: extraction failures
//! count as fetch failures and trigger a retry of the whole item.

mod metadata;
mod search;

pub use metadata::PageMetadataExtractor;
pub use search::SearchResultExtractor;

use crate::record::Record;
use thiserror::Error;

/// Errors that can occur while extracting records from a page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Missing {element} in page at {url}")]
    MissingElement { element: &'static str, url: String },

    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Trait for pulling records out of a fetched page
pub trait Extractor: Send + Sync {
    /// Extracts records from a page body
    ///
    /// # Arguments
    ///
    /// * `body` - The fetched HTML
    /// * `target` - The URL the body was fetched from
    ///
    /// # Returns
    ///
    /// Zero or more records. An empty result is success, not an error;
    /// errors mean the page did not have the shape this extractor
    /// requires.
    fn extract(&self, body: &str, target: &str) -> ExtractResult<Vec<Record>>;
}
