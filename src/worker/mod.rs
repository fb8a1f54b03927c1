//! Bounded worker pool over a list of work items
//!
//! The pool keeps at most `W` fetches in flight at once: it fills a
//! `JoinSet` up to the bound, then refills as tasks finish, until the
//! item list is drained. Every item reaches exactly one terminal state
//! (success or exhaustion), and no item failure aborts its siblings —
//! the run-level result is best-effort, partial success.

use crate::extract::Extractor;
use crate::fetch::{fetch_with_retry, FetchOutcome, Fetcher, ItemError, RetryPolicy};
use crate::pipeline::Pipeline;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Aggregate result of running a pool over a batch of work items
#[derive(Debug, Default)]
pub struct PoolReport {
    /// Items that reached Success
    pub succeeded: usize,

    /// Items that exhausted their retries
    pub exhausted: usize,

    /// Records admitted into the pipeline across all items
    pub admitted: usize,

    /// Records dropped as duplicates across all items
    pub duplicates: usize,

    /// Every item-level error, in completion order
    pub failures: Vec<ItemError>,
}

impl PoolReport {
    /// Items that reached a terminal state
    pub fn total_terminal(&self) -> usize {
        self.succeeded + self.exhausted
    }

    /// Removes and returns the first job-fatal failure, if any
    ///
    /// Exhausted items are not fatal; pipeline (sink) failures are.
    pub fn take_fatal(&mut self) -> Option<ItemError> {
        let position = self
            .failures
            .iter()
            .position(|failure| matches!(failure, ItemError::Pipeline { .. }))?;
        Some(self.failures.swap_remove(position))
    }

    fn tally(&mut self, outcome: Result<FetchOutcome, ItemError>) {
        match outcome {
            Ok(outcome) => {
                self.succeeded += 1;
                self.admitted += outcome.admitted;
                self.duplicates += outcome.duplicates;
            }
            Err(error) => {
                if matches!(error, ItemError::RetriesExhausted { .. }) {
                    self.exhausted += 1;
                }
                self.failures.push(error);
            }
        }
    }
}

/// Fixed-bound concurrent runner for fetch work items
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    max_workers: usize,
}

impl WorkerPool {
    /// Creates a pool running at most `max_workers` items concurrently
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    /// Runs every target to a terminal state and returns the tally
    ///
    /// Returns only after all items have completed. The caller is
    /// responsible for closing the shared pipeline afterward.
    ///
    /// # Arguments
    ///
    /// * `targets` - Work items, attempted exactly once each
    /// * `fetcher` - Shared network collaborator
    /// * `extractor` - Shared extraction collaborator
    /// * `pipeline` - Shared record destination
    /// * `policy` - Retry parameters applied to every item
    pub async fn run(
        &self,
        targets: Vec<String>,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        pipeline: Arc<Pipeline>,
        policy: RetryPolicy,
    ) -> PoolReport {
        let total = targets.len();
        let mut queue = targets.into_iter();
        let mut in_flight: JoinSet<Result<FetchOutcome, ItemError>> = JoinSet::new();
        let mut report = PoolReport::default();
        let policy = Arc::new(policy);

        loop {
            // Keep the window full while items remain
            while in_flight.len() < self.max_workers {
                let Some(target) = queue.next() else {
                    break;
                };
                let fetcher = Arc::clone(&fetcher);
                let extractor = Arc::clone(&extractor);
                let pipeline = Arc::clone(&pipeline);
                let policy = Arc::clone(&policy);

                in_flight.spawn(async move {
                    fetch_with_retry(
                        fetcher.as_ref(),
                        extractor.as_ref(),
                        pipeline.as_ref(),
                        &target,
                        &policy,
                    )
                    .await
                });
            }

            match in_flight.join_next().await {
                Some(Ok(outcome)) => report.tally(outcome),
                Some(Err(join_error)) => {
                    tracing::error!("Worker task failed: {}", join_error);
                }
                None => break,
            }
        }

        tracing::info!(
            "Worker pool finished: {} succeeded, {} exhausted of {} items",
            report.succeeded,
            report.exhausted,
            total
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::SearchResultExtractor;
    use crate::fetch::{FetchError, FetchResponse};
    use crate::record::Record;
    use crate::sink::{Sink, SinkResult};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fetcher that fails for chosen targets and tracks concurrency
    struct GaugeFetcher {
        failing: Vec<String>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl GaugeFetcher {
        fn new(failing: Vec<String>) -> Self {
            Self {
                failing,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Fetcher for GaugeFetcher {
        async fn fetch(&self, target: &str) -> Result<FetchResponse, FetchError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            // Hold the slot long enough for overlap to be observable
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.iter().any(|f| f == target) {
                return Ok(FetchResponse {
                    status: 500,
                    body: String::new(),
                });
            }

            let slug = target.rsplit('/').next().unwrap_or("page");
            Ok(FetchResponse {
                status: 200,
                body: format!(r#"<h2><a href="{}">Result {}</a></h2>"#, target, slug),
            })
        }
    }

    struct CountingSink {
        records: Mutex<Vec<Record>>,
        target: PathBuf,
    }

    impl CountingSink {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                target: PathBuf::from("counting"),
            }
        }
    }

    impl Sink for CountingSink {
        fn write_batch(&self, batch: &[Record]) -> SinkResult<()> {
            self.records.lock().unwrap().extend_from_slice(batch);
            Ok(())
        }

        fn target(&self) -> &Path {
            &self.target
        }
    }

    fn targets(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("https://site.example/item-{}", i))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_all_items_reach_terminal_state() {
        let failing = vec![
            "https://site.example/item-2".to_string(),
            "https://site.example/item-7".to_string(),
        ];
        let fetcher = Arc::new(GaugeFetcher::new(failing));
        let pipeline = Arc::new(Pipeline::new(Box::new(CountingSink::new()), 100));

        let report = WorkerPool::new(3)
            .run(
                targets(10),
                fetcher,
                Arc::new(SearchResultExtractor),
                Arc::clone(&pipeline),
                RetryPolicy::immediate(1),
            )
            .await;

        assert_eq!(report.total_terminal(), 10);
        assert_eq!(report.succeeded, 8);
        assert_eq!(report.exhausted, 2);
        assert_eq!(report.admitted, 8);

        pipeline.close().unwrap();
        assert_eq!(pipeline.stats().admitted, 8);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrency_stays_within_bound() {
        let fetcher = Arc::new(GaugeFetcher::new(Vec::new()));
        let pipeline = Arc::new(Pipeline::new(Box::new(CountingSink::new()), 100));

        WorkerPool::new(3)
            .run(
                targets(12),
                Arc::clone(&fetcher) as Arc<dyn Fetcher>,
                Arc::new(SearchResultExtractor),
                pipeline,
                RetryPolicy::immediate(0),
            )
            .await;

        let observed = fetcher.max_in_flight.load(Ordering::SeqCst);
        assert!(observed <= 3, "observed {} concurrent fetches", observed);
        assert!(observed >= 2, "expected overlapping fetches, got {}", observed);
    }

    #[tokio::test]
    async fn test_empty_target_list_is_a_noop() {
        let fetcher = Arc::new(GaugeFetcher::new(Vec::new()));
        let pipeline = Arc::new(Pipeline::new(Box::new(CountingSink::new()), 100));

        let report = WorkerPool::new(5)
            .run(
                Vec::new(),
                fetcher,
                Arc::new(SearchResultExtractor),
                pipeline,
                RetryPolicy::immediate(0),
            )
            .await;

        assert_eq!(report.total_terminal(), 0);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_take_fatal_ignores_exhaustion() {
        let mut report = PoolReport {
            failures: vec![ItemError::RetriesExhausted {
                url: "https://site.example".to_string(),
                attempts: 3,
            }],
            exhausted: 1,
            ..Default::default()
        };
        assert!(report.take_fatal().is_none());
    }
}
