//! Append-only CSV sink
//!
//! Each flush appends one row per record. The header row is written only
//! when the target file does not exist yet or is empty, so repeated
//! flushes into the same file produce a single header followed by data
//! rows from every batch.

use crate::record::Record;
use crate::sink::traits::{Sink, SinkResult};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// CSV sink that appends batches to a single file
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Creates a CSV sink targeting the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns true when the target needs a header row
    fn needs_header(&self) -> bool {
        match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        }
    }
}

impl Sink for CsvSink {
    fn write_batch(&self, batch: &[Record]) -> SinkResult<()> {
        // Empty batches must not create the file
        let Some(first) = batch.first() else {
            return Ok(());
        };

        let needs_header = self.needs_header();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(first.field_names())?;
        }

        for record in batch {
            match record {
                Record::Search(r) => writer.serialize(r)?,
                Record::Page(r) => writer.serialize(r)?,
            }
        }

        writer.flush()?;
        Ok(())
    }

    fn target(&self) -> &Path {
        &self.path
    }
}
