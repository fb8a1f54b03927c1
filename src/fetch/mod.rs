//! Fetching module: HTTP client, relay envelope, and bounded retry
//!
//! This module contains:
//! - The `Fetcher` trait and its reqwest-backed `HttpFetcher`
//! - Search and relay URL construction
//! - `fetch_with_retry`, the per-item retry loop that feeds extracted
//!   records into a pipeline

mod client;
mod query;
mod retry;

pub use client::{build_http_client, FetchError, FetchResponse, Fetcher, HttpFetcher};
pub use query::{relay_url, search_url, RelayTarget};
pub use retry::{fetch_with_retry, FetchOutcome, ItemError, RetryPolicy};
