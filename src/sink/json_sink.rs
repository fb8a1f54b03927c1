//! Merge-JSON sink
//!
//! The target file holds a single JSON array of record objects. A flush is
//! not a plain append: the existing array is read back (treated as empty
//! when the file is missing or blank), the new batch is appended, and the
//! whole array is rewritten. Existing content that is not a valid JSON
//! array is reported as a corrupted sink and left untouched.

use crate::record::Record;
use crate::sink::traits::{Sink, SinkError, SinkResult};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// JSON sink that merges batches into a single top-level array
#[derive(Debug)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    /// Creates a JSON sink targeting the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the existing array from the target file
    ///
    /// A missing or blank file yields an empty array. Anything else that
    /// is not a well-formed JSON array is a corrupted sink.
    fn read_existing(&self) -> SinkResult<Vec<serde_json::Value>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(serde_json::Value::Array(items)) => Ok(items),
            Ok(other) => Err(SinkError::Corrupted {
                path: self.path.display().to_string(),
                message: format!("expected a top-level array, found {}", json_type_name(&other)),
            }),
            Err(e) => Err(SinkError::Corrupted {
                path: self.path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

impl Sink for JsonSink {
    fn write_batch(&self, batch: &[Record]) -> SinkResult<()> {
        // Empty batches must not create or rewrite the file
        if batch.is_empty() {
            return Ok(());
        }

        // Read back before opening for write so a corrupted target is
        // never clobbered
        let mut items = self.read_existing()?;

        for record in batch {
            items.push(record.to_json_value()?);
        }

        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &items)?;
        Ok(())
    }

    fn target(&self) -> &Path {
        &self.path
    }
}

/// Human-readable name of a JSON value's type, for error messages
fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
