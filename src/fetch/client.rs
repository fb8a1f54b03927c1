//! HTTP fetcher implementation
//!
//! The `Fetcher` trait is the seam between the retry loop and the
//! network: production code uses the reqwest-backed `HttpFetcher`
//! (optionally wrapping every request in a relay envelope), tests inject
//! fakes with scripted responses.

use crate::fetch::query::{relay_url, RelayTarget};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Errors from a single fetch attempt
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request for {url} returned status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid relay endpoint: {0}")]
    RelayUrl(#[from] url::ParseError),
}

/// Raw result of a fetch: the HTTP status and the body text
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,
}

impl FetchResponse {
    /// Whether the response counts as a successful fetch
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Trait for fetching a target URL
///
/// Implementations must be shareable across worker tasks.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches one target
    ///
    /// Returns the response for any completed HTTP exchange, including
    /// non-200 statuses; errors are reserved for transport failures and
    /// bad relay configuration. The retry layer classifies statuses.
    async fn fetch(&self, target: &str) -> Result<FetchResponse, FetchError>;
}

/// Builds the shared HTTP client
///
/// One client is built per run and cloned into each fetcher; reqwest
/// clients share their connection pool across clones.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(format!("duckdive/{}", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by reqwest, optionally routed through a relay
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    relay: Option<RelayTarget>,
}

impl HttpFetcher {
    /// Creates a fetcher that requests targets directly
    pub fn direct(client: Client) -> Self {
        Self {
            client,
            relay: None,
        }
    }

    /// Creates a fetcher that wraps every target in the relay envelope
    pub fn via_relay(client: Client, relay: RelayTarget) -> Self {
        Self {
            client,
            relay: Some(relay),
        }
    }

    /// The URL actually requested for a target
    fn request_url(&self, target: &str) -> Result<String, FetchError> {
        match &self.relay {
            Some(relay) => Ok(relay_url(relay, target)?),
            None => Ok(target.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, target: &str) -> Result<FetchResponse, FetchError> {
        let request_url = self.request_url(target)?;

        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: target.to_string(),
                source: e,
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| FetchError::Transport {
            url: target.to_string(),
            source: e,
        })?;

        Ok(FetchResponse { status, body })
    }
}
