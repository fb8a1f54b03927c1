//! Durable record sinks
//!
//! This module provides the format-specific writers that pipeline flushes
//! hand their batches to:
//! - `CsvSink`: append rows, header written once per file
//! - `JsonSink`: merge batches into a single top-level JSON array

mod csv_sink;
mod json_sink;
mod traits;

pub use csv_sink::CsvSink;
pub use json_sink::JsonSink;
pub use traits::{Sink, SinkError, SinkResult};

use crate::ConfigError;
use std::path::Path;

/// Output format tag for a sink target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    /// Parses a format tag from configuration
    ///
    /// An unrecognized tag is a configuration error, fatal to the job that
    /// would have used it; it is surfaced before any write is attempted.
    pub fn parse(tag: &str) -> Result<Self, ConfigError> {
        match tag.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// File extension conventionally used for this format
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Builds a sink for the given target path and format
pub fn build_sink(path: &Path, format: OutputFormat) -> Box<dyn Sink> {
    match format {
        OutputFormat::Csv => Box::new(CsvSink::new(path)),
        OutputFormat::Json => Box::new(JsonSink::new(path)),
    }
}
