//! Duckdive: a batch-oriented search result harvester
//!
//! This crate fetches search-result pages and the pages they point to,
//! extracts structured records from the HTML, deduplicates them per run,
//! and persists them in bounded batches to CSV or JSON targets.

pub mod config;
pub mod crawl;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod record;
pub mod sink;
pub mod worker;

use thiserror::Error;

/// Main error type for Duckdive operations
#[derive(Debug, Error)]
pub enum DuckdiveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] fetch::FetchError),

    #[error("Extraction error: {0}")]
    Extract(#[from] extract::ExtractError),

    #[error("Work item error: {0}")]
    Item(#[from] fetch::ItemError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for Duckdive operations
pub type Result<T> = std::result::Result<T, DuckdiveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawl::{harvest, RunSummary};
pub use pipeline::Pipeline;
pub use record::{PageMetadata, Record, SearchResult};
