//! Dedup buffer state
//!
//! `DedupeBuffer` holds the per-run seen-set, the pending batch, the flush
//! threshold, and the flush-in-progress guard. It is plain single-threaded
//! state; `Pipeline` owns one behind a mutex and is responsible for all
//! locking.

use crate::record::Record;
use std::collections::HashSet;

/// Outcome of offering a record to the buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Record was added to the pending batch
    Admitted {
        /// Pending batch has reached the flush threshold
        at_capacity: bool,
    },

    /// A record with the same name was already admitted this run
    Duplicate {
        /// The colliding name, for logging
        name: String,
    },
}

/// In-memory seen-set plus bounded pending queue
///
/// The seen-set grows monotonically for the lifetime of the buffer: once a
/// name is admitted it stays, even after the record itself is flushed out.
#[derive(Debug)]
pub struct DedupeBuffer {
    seen: HashSet<String>,
    pending: Vec<Record>,
    capacity: usize,
    flushing: bool,
}

impl DedupeBuffer {
    /// Creates a buffer that signals a flush at `capacity` pending records
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::new(),
            pending: Vec::new(),
            capacity,
            flushing: false,
        }
    }

    /// Admits a record or rejects it as a duplicate
    ///
    /// The dedup key is the record's normalized name. On admission the
    /// record is appended to the pending batch in arrival order.
    pub fn admit(&mut self, record: Record) -> Admission {
        let key = record.dedup_key();
        if self.seen.contains(key) {
            return Admission::Duplicate {
                name: key.to_string(),
            };
        }

        self.seen.insert(key.to_string());
        self.pending.push(record);
        Admission::Admitted {
            at_capacity: self.pending.len() >= self.capacity,
        }
    }

    /// Whether a flush is currently in progress
    pub fn flush_in_progress(&self) -> bool {
        self.flushing
    }

    /// Marks a flush as started and takes the pending batch
    ///
    /// The caller must eventually call `finish_flush`, whether or not the
    /// sink write succeeds.
    pub fn begin_flush(&mut self) -> Vec<Record> {
        self.flushing = true;
        std::mem::take(&mut self.pending)
    }

    /// Marks the in-progress flush as finished
    pub fn finish_flush(&mut self) {
        self.flushing = false;
    }

    /// Number of records awaiting flush
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of distinct names admitted so far
    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    /// Whether any records await flush
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
