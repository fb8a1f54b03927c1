//! Record pipeline: dedup, batching, and flush triggering
//!
//! A `Pipeline` owns one `DedupeBuffer` and one `Sink`. Fetch workers call
//! `submit` concurrently; the pipeline admits or drops each record, and
//! when the pending batch reaches capacity it flushes synchronously to the
//! sink. `close` drains whatever remains at job end.
//!
//! The buffer is the only state shared across workers, so every mutation
//! goes through one mutex. Sink I/O happens outside the lock: a flush
//! swaps the batch out under the lock, writes without it, then clears the
//! flush guard and wakes anyone waiting in `close`.

mod dedupe;

pub use dedupe::{Admission, DedupeBuffer};

use crate::record::Record;
use crate::sink::{Sink, SinkResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

/// Outcome of submitting a record to a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The record was admitted (and possibly flushed)
    Admitted,

    /// The record was dropped as a duplicate
    Duplicate,
}

/// Counters describing what a pipeline has processed so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Records admitted into the buffer
    pub admitted: usize,

    /// Records dropped as duplicates
    pub duplicates: usize,

    /// Non-empty batches handed to the sink
    pub flushes: usize,
}

/// Deduplicating, batching record pipeline over a single sink
///
/// Create one per logical job, share it across workers via `Arc`, and call
/// `close` exactly once when the job ends. Submitting after `close` is a
/// programming error; the precondition is checked in debug builds only.
pub struct Pipeline {
    buffer: Mutex<DedupeBuffer>,
    flush_done: Condvar,
    sink: Box<dyn Sink>,
    capacity: usize,
    closed: AtomicBool,
    admitted: AtomicUsize,
    duplicates: AtomicUsize,
    flushes: AtomicUsize,
}

impl Pipeline {
    /// Creates a pipeline flushing to `sink` every `capacity` records
    pub fn new(sink: Box<dyn Sink>, capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(DedupeBuffer::new(capacity)),
            flush_done: Condvar::new(),
            sink,
            capacity,
            closed: AtomicBool::new(false),
            admitted: AtomicUsize::new(0),
            duplicates: AtomicUsize::new(0),
            flushes: AtomicUsize::new(0),
        }
    }

    /// Submits one record
    ///
    /// Duplicates (same normalized name as an earlier submission) are
    /// logged and dropped; this is a success path, not an error. When the
    /// pending batch reaches capacity and no flush is already in flight,
    /// the batch is flushed synchronously before this call returns. Sink
    /// failures during that flush propagate to the submitter and are
    /// fatal to the job.
    pub fn submit(&self, record: Record) -> SinkResult<Submission> {
        debug_assert!(
            !self.closed.load(Ordering::SeqCst),
            "submit called on a closed pipeline"
        );

        let mut buffer = self.buffer.lock().unwrap();
        match buffer.admit(record) {
            Admission::Duplicate { name } => {
                drop(buffer);
                self.duplicates.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Duplicate item found: {}. Item dropped.", name);
                Ok(Submission::Duplicate)
            }
            Admission::Admitted { at_capacity } => {
                self.admitted.fetch_add(1, Ordering::Relaxed);
                if at_capacity && !buffer.flush_in_progress() {
                    let batch = buffer.begin_flush();
                    drop(buffer);
                    self.complete_flush(batch)?;
                }
                Ok(Submission::Admitted)
            }
        }
    }

    /// Flushes the pending batch, if any
    ///
    /// Waits for an in-flight flush to finish first, so callers observe
    /// either the pre-swap or post-swap state, never a partial one. An
    /// empty pending batch results in zero sink calls.
    pub fn flush(&self) -> SinkResult<()> {
        let mut buffer = self.buffer.lock().unwrap();
        while buffer.flush_in_progress() {
            buffer = self.flush_done.wait(buffer).unwrap();
        }

        if !buffer.has_pending() {
            return Ok(());
        }

        let batch = buffer.begin_flush();
        drop(buffer);
        self.complete_flush(batch)
    }

    /// Closes the pipeline, draining any remaining records
    ///
    /// Waits for an in-flight flush, then flushes the remainder
    /// unconditionally (it is usually below capacity). Must be called
    /// exactly once per pipeline, after all submitters are done.
    pub fn close(&self) -> SinkResult<()> {
        let was_closed = self.closed.swap(true, Ordering::SeqCst);
        debug_assert!(!was_closed, "pipeline closed twice");

        self.flush()
    }

    /// Snapshot of the pipeline's counters
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
        }
    }

    /// Number of records currently awaiting flush
    pub fn pending_len(&self) -> usize {
        self.buffer.lock().unwrap().pending_len()
    }

    /// The flush threshold this pipeline was created with
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Writes a captured batch and clears the flush guard
    ///
    /// The guard is cleared and waiters are woken even when the sink
    /// write fails, so a failed flush cannot wedge `close`.
    fn complete_flush(&self, batch: Vec<Record>) -> SinkResult<()> {
        let result = if batch.is_empty() {
            Ok(())
        } else {
            tracing::debug!(
                "Flushing {} records to {}",
                batch.len(),
                self.sink.target().display()
            );
            self.sink.write_batch(&batch)
        };

        let mut buffer = self.buffer.lock().unwrap();
        buffer.finish_flush();
        drop(buffer);
        self.flush_done.notify_all();

        if result.is_ok() && !batch.is_empty() {
            self.flushes.fetch_add(1, Ordering::Relaxed);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{PageMetadata, SearchResult};
    use crate::sink::SinkError;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Sink that records every batch it receives
    struct RecordingSink {
        batches: Mutex<Vec<Vec<Record>>>,
        target: PathBuf,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                target: PathBuf::from("recording"),
            }
        }
    }

    impl Sink for RecordingSink {
        fn write_batch(&self, batch: &[Record]) -> SinkResult<()> {
            self.batches.lock().unwrap().push(batch.to_vec());
            Ok(())
        }

        fn target(&self) -> &Path {
            &self.target
        }
    }

    /// Sink that always fails
    struct FailingSink {
        target: PathBuf,
    }

    impl Sink for FailingSink {
        fn write_batch(&self, _batch: &[Record]) -> SinkResult<()> {
            Err(SinkError::Corrupted {
                path: "failing".to_string(),
                message: "always fails".to_string(),
            })
        }

        fn target(&self) -> &Path {
            &self.target
        }
    }

    fn record(name: &str) -> Record {
        SearchResult::new(name, "https://example.com", "https://example.com/x", 0).into()
    }

    fn pipeline_with_recorder(capacity: usize) -> (Arc<Pipeline>, Arc<RecordingSink>) {
        // The pipeline owns its sink; keep a second handle for assertions
        let sink = Arc::new(RecordingSink::new());
        let handle = Arc::clone(&sink);

        struct SharedSink(Arc<RecordingSink>);
        impl Sink for SharedSink {
            fn write_batch(&self, batch: &[Record]) -> SinkResult<()> {
                self.0.write_batch(batch)
            }
            fn target(&self) -> &Path {
                self.0.target()
            }
        }

        let pipeline = Arc::new(Pipeline::new(Box::new(SharedSink(sink)), capacity));
        (pipeline, handle)
    }

    #[test]
    fn test_flush_triggers_at_capacity() {
        let (pipeline, sink) = pipeline_with_recorder(3);

        pipeline.submit(record("a")).unwrap();
        pipeline.submit(record("b")).unwrap();
        assert_eq!(pipeline.pending_len(), 2);
        assert!(sink.batches.lock().unwrap().is_empty());

        pipeline.submit(record("c")).unwrap();
        assert_eq!(pipeline.pending_len(), 0);

        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
    }

    #[test]
    fn test_pending_never_exceeds_capacity_after_submit() {
        let (pipeline, _sink) = pipeline_with_recorder(4);

        for i in 0..20 {
            pipeline.submit(record(&format!("item-{}", i))).unwrap();
            assert!(pipeline.pending_len() < 4);
        }
    }

    #[test]
    fn test_duplicate_dropped_and_counted() {
        let (pipeline, sink) = pipeline_with_recorder(10);

        assert_eq!(pipeline.submit(record("same")).unwrap(), Submission::Admitted);
        assert_eq!(pipeline.submit(record("same")).unwrap(), Submission::Duplicate);

        pipeline.close().unwrap();

        let stats = pipeline.stats();
        assert_eq!(stats.admitted, 1);
        assert_eq!(stats.duplicates, 1);

        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
    }

    #[test]
    fn test_dedup_key_spans_record_kinds() {
        // Identity is the normalized name, not the full record shape
        let (pipeline, _sink) = pipeline_with_recorder(10);

        let search: Record =
            SearchResult::new("Shared Title", "https://a.example", "https://a.example/1", 0).into();
        let page: Record =
            PageMetadata::new("Shared Title", "https://b.example/2", "desc").into();

        assert_eq!(pipeline.submit(search).unwrap(), Submission::Admitted);
        assert_eq!(pipeline.submit(page).unwrap(), Submission::Duplicate);
    }

    #[test]
    fn test_dedup_survives_flushes() {
        let (pipeline, sink) = pipeline_with_recorder(2);

        pipeline.submit(record("a")).unwrap();
        pipeline.submit(record("b")).unwrap(); // flush happens here
        assert_eq!(sink.batches.lock().unwrap().len(), 1);

        assert_eq!(pipeline.submit(record("a")).unwrap(), Submission::Duplicate);
        pipeline.close().unwrap();

        let batches = sink.batches.lock().unwrap();
        let all_names: Vec<String> = batches
            .iter()
            .flatten()
            .map(|r| r.dedup_key().to_string())
            .collect();
        assert_eq!(all_names, ["a", "b"]);
    }

    #[test]
    fn test_close_flushes_remainder() {
        let (pipeline, sink) = pipeline_with_recorder(100);

        pipeline.submit(record("a")).unwrap();
        pipeline.submit(record("b")).unwrap();
        pipeline.close().unwrap();

        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }

    #[test]
    fn test_close_with_empty_pending_touches_nothing() {
        let (pipeline, sink) = pipeline_with_recorder(2);

        pipeline.submit(record("a")).unwrap();
        pipeline.submit(record("b")).unwrap(); // flushed here
        pipeline.close().unwrap();

        assert_eq!(sink.batches.lock().unwrap().len(), 1);
        assert_eq!(pipeline.stats().flushes, 1);
    }

    #[test]
    fn test_explicit_flush_on_empty_pipeline_is_noop() {
        let (pipeline, sink) = pipeline_with_recorder(5);
        pipeline.flush().unwrap();
        assert!(sink.batches.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sink_failure_propagates_through_submit() {
        let pipeline = Pipeline::new(
            Box::new(FailingSink {
                target: PathBuf::from("failing"),
            }),
            1,
        );

        let result = pipeline.submit(record("a"));
        assert!(matches!(result, Err(SinkError::Corrupted { .. })));
    }

    #[test]
    fn test_sink_failure_does_not_wedge_close() {
        let pipeline = Pipeline::new(
            Box::new(FailingSink {
                target: PathBuf::from("failing"),
            }),
            1,
        );

        let _ = pipeline.submit(record("a"));
        // The failed flush cleared its guard; close must not block
        assert!(pipeline.close().is_ok());
    }

    #[test]
    fn test_concurrent_submits_keep_dedup_exact() {
        let (pipeline, sink) = pipeline_with_recorder(7);

        // Four threads submit overlapping name sets; each name must be
        // flushed at most once no matter the interleaving
        let mut handles = Vec::new();
        for _ in 0..4 {
            let pipeline = Arc::clone(&pipeline);
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    pipeline.submit(record(&format!("name-{}", i))).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        pipeline.close().unwrap();

        let batches = sink.batches.lock().unwrap();
        let mut seen = std::collections::HashSet::new();
        for record in batches.iter().flatten() {
            assert!(
                seen.insert(record.dedup_key().to_string()),
                "name {} flushed twice",
                record.dedup_key()
            );
        }
        assert_eq!(seen.len(), 50);

        let stats = pipeline.stats();
        assert_eq!(stats.admitted, 50);
        assert_eq!(stats.duplicates, 150);
    }
}
