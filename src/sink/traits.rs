//! Sink trait and error types
//!
//! A sink is a durable, format-specific writer for batches of records.
//! Sinks are stateless between calls apart from the file they target, and
//! are only ever invoked by a pipeline flush.

use crate::record::Record;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while writing a batch to a sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Corrupted sink {path}: {message}")]
    Corrupted { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Trait for durable batch writers
///
/// Implementations must be safe to call from multiple threads, although
/// the pipeline's flush guard already serializes calls on a single
/// pipeline. An empty batch must be a no-op that touches nothing on disk.
pub trait Sink: Send + Sync {
    /// Persists one batch of records
    ///
    /// # Arguments
    ///
    /// * `batch` - The records to write, in submission order
    fn write_batch(&self, batch: &[Record]) -> SinkResult<()>;

    /// The file this sink writes to
    fn target(&self) -> &Path;
}
