//! Bounded retry around fetch + extract + submit
//!
//! One call to `fetch_with_retry` drives a single work item through its
//! state machine: attempt, then either success, another attempt, or
//! exhaustion. A policy with `max_retries = R` allows exactly `R + 1`
//! attempts. Non-200 statuses, transport errors, and extraction errors
//! are all retryable; pipeline (sink) failures are fatal to the job and
//! are never retried.

use crate::extract::{ExtractError, Extractor};
use crate::fetch::client::{FetchError, Fetcher};
use crate::pipeline::{Pipeline, Submission};
use crate::sink::SinkError;
use std::time::Duration;
use thiserror::Error;

/// Retry parameters shared by every work item in a run
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,

    /// Fixed delay between attempts; zero retries immediately
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with a fixed delay in milliseconds
    pub fn new(max_retries: u32, delay_ms: u64) -> Self {
        Self {
            max_retries,
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Creates a policy that retries with no delay
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, 0)
    }
}

/// Terminal failure of one work item
///
/// Exhaustion is contained at the worker-pool boundary; a pipeline
/// failure aborts the enclosing job.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Max retries exceeded for {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },

    #[error("Pipeline failure while processing {url}: {source}")]
    Pipeline {
        url: String,
        #[source]
        source: SinkError,
    },
}

/// Successful terminal state of one work item
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOutcome {
    /// Attempts used, including the successful one
    pub attempts: u32,

    /// Records admitted into the pipeline
    pub admitted: usize,

    /// Records dropped as duplicates
    pub duplicates: usize,
}

/// Why a single attempt failed
enum AttemptFailure {
    Fetch(FetchError),
    Extract(ExtractError),
    Pipeline(SinkError),
}

impl AttemptFailure {
    fn describe(&self) -> String {
        match self {
            AttemptFailure::Fetch(e) => e.to_string(),
            AttemptFailure::Extract(e) => e.to_string(),
            AttemptFailure::Pipeline(e) => e.to_string(),
        }
    }
}

/// Fetches one target with bounded retry, submitting extracted records
///
/// # Arguments
///
/// * `fetcher` - Network collaborator
/// * `extractor` - Record extraction collaborator
/// * `pipeline` - Destination for extracted records
/// * `target` - The URL to process
/// * `policy` - Shared retry parameters
///
/// # Returns
///
/// * `Ok(FetchOutcome)` - The item succeeded; records were submitted
/// * `Err(ItemError::RetriesExhausted)` - Every attempt failed
/// * `Err(ItemError::Pipeline)` - A sink failure surfaced through submit
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    extractor: &dyn Extractor,
    pipeline: &Pipeline,
    target: &str,
    policy: &RetryPolicy,
) -> Result<FetchOutcome, ItemError> {
    let mut tries: u32 = 0;

    loop {
        match attempt(fetcher, extractor, pipeline, target).await {
            Ok((admitted, duplicates)) => {
                tracing::info!("Successfully parsed data from: {}", target);
                return Ok(FetchOutcome {
                    attempts: tries + 1,
                    admitted,
                    duplicates,
                });
            }

            Err(AttemptFailure::Pipeline(source)) => {
                // Sink failures are not the network's fault; retrying
                // would just hammer a broken sink
                return Err(ItemError::Pipeline {
                    url: target.to_string(),
                    source,
                });
            }

            Err(failure) => {
                tries += 1;
                let remaining = policy.max_retries + 1 - tries;

                if remaining == 0 {
                    tracing::error!(
                        "Max retries exceeded for {}: {}",
                        target,
                        failure.describe()
                    );
                    return Err(ItemError::RetriesExhausted {
                        url: target.to_string(),
                        attempts: tries,
                    });
                }

                tracing::warn!(
                    "Attempt {} failed for {}: {}. Retries left: {}",
                    tries,
                    target,
                    failure.describe(),
                    remaining
                );

                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
}

/// Runs one attempt: fetch, classify, extract, submit
///
/// Records are only submitted after the whole page extracted cleanly, so
/// a retried attempt never leaves a partial submission behind.
async fn attempt(
    fetcher: &dyn Fetcher,
    extractor: &dyn Extractor,
    pipeline: &Pipeline,
    target: &str,
) -> Result<(usize, usize), AttemptFailure> {
    let response = fetcher
        .fetch(target)
        .await
        .map_err(AttemptFailure::Fetch)?;

    tracing::info!("Received [{}] from: {}", response.status, target);

    if !response.is_success() {
        return Err(AttemptFailure::Fetch(FetchError::BadStatus {
            url: target.to_string(),
            status: response.status,
        }));
    }

    let records = extractor
        .extract(&response.body, target)
        .map_err(AttemptFailure::Extract)?;

    let mut admitted = 0;
    let mut duplicates = 0;
    for record in records {
        match pipeline.submit(record) {
            Ok(Submission::Admitted) => admitted += 1,
            Ok(Submission::Duplicate) => duplicates += 1,
            Err(e) => return Err(AttemptFailure::Pipeline(e)),
        }
    }

    Ok((admitted, duplicates))
}
