use serde::Deserialize;

/// Main configuration structure for Duckdive
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub relay: Option<RelayConfig>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Retries allowed per work item after the first attempt
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Maximum number of concurrent page fetches
    #[serde(rename = "max-workers")]
    pub max_workers: u32,

    /// Delay between retry attempts (milliseconds, 0 retries immediately)
    #[serde(rename = "retry-delay-ms", default)]
    pub retry_delay_ms: u64,
}

/// Proxy relay configuration
///
/// When present, every request is routed through the relay endpoint with
/// the target URL carried as a query parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Relay account API key
    #[serde(rename = "api-key")]
    pub api_key: String,

    /// Relay endpoint URL
    #[serde(default = "default_relay_endpoint")]
    pub endpoint: String,

    /// Country/location hint passed to the relay
    #[serde(default = "default_location")]
    pub location: String,

    /// Render wait passed to the relay for search pages only
    #[serde(rename = "search-wait", default)]
    pub search_wait: Option<u64>,
}

/// Pipeline buffering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of pending records that triggers a flush
    #[serde(rename = "batch-capacity", default = "default_batch_capacity")]
    pub batch_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_capacity: default_batch_capacity(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory for per-keyword result files
    #[serde(rename = "results-dir", default = "default_results_dir")]
    pub results_dir: String,

    /// Format tag for per-keyword result files
    #[serde(rename = "results-format", default = "default_results_format")]
    pub results_format: String,

    /// Path of the merged metadata report
    #[serde(rename = "metadata-path", default = "default_metadata_path")]
    pub metadata_path: String,

    /// Format tag for the metadata report
    #[serde(rename = "metadata-format", default = "default_metadata_format")]
    pub metadata_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            results_format: default_results_format(),
            metadata_path: default_metadata_path(),
            metadata_format: default_metadata_format(),
        }
    }
}

fn default_relay_endpoint() -> String {
    "https://proxy.scrapeops.io/v1/".to_string()
}

fn default_location() -> String {
    "us".to_string()
}

fn default_batch_capacity() -> usize {
    50
}

fn default_results_dir() -> String {
    ".".to_string()
}

fn default_results_format() -> String {
    "csv".to_string()
}

fn default_metadata_path() -> String {
    "metadata-report.json".to_string()
}

fn default_metadata_format() -> String {
    "json".to_string()
}
