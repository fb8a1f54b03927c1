//! Harvest coordinator - run orchestration logic
//!
//! The coordinator drives a full run in two phases:
//! 1. Crawl: for each keyword, fetch its search-result page (with retry)
//!    through a fresh pipeline into a per-keyword results file.
//! 2. Metadata: read the result URLs back from the aggregate files and
//!    fan them out over the worker pool, collecting page metadata into a
//!    single merged report through one shared pipeline, closed once at
//!    the end.
//!
//! Keyword- and item-level retry exhaustion is contained (the run keeps
//! going, best-effort); pipeline/sink failures abort the run.

use crate::config::Config;
use crate::extract::{PageMetadataExtractor, SearchResultExtractor};
use crate::fetch::{
    build_http_client, fetch_with_retry, search_url, Fetcher, HttpFetcher, ItemError,
    RelayTarget, RetryPolicy,
};
use crate::pipeline::{Pipeline, PipelineStats};
use crate::record::SearchResult;
use crate::sink::{build_sink, OutputFormat, SinkError};
use crate::worker::WorkerPool;
use crate::{DuckdiveError, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a whole run accomplished
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Keywords attempted
    pub keywords: usize,

    /// Keywords whose search page exhausted its retries
    pub keywords_failed: usize,

    /// Search records written across all keywords
    pub search_records: usize,

    /// Search records dropped as duplicates
    pub search_duplicates: usize,

    /// Result files produced by the crawl phase
    pub aggregate_files: Vec<PathBuf>,

    /// Pages attempted in the metadata phase
    pub metadata_items: usize,

    /// Pages that yielded metadata
    pub metadata_succeeded: usize,

    /// Pages that exhausted their retries
    pub metadata_exhausted: usize,

    /// Metadata records written
    pub metadata_records: usize,

    /// Metadata records dropped as duplicates
    pub metadata_duplicates: usize,

    /// The metadata report, when the phase ran
    pub metadata_path: Option<PathBuf>,
}

impl RunSummary {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            keywords: 0,
            keywords_failed: 0,
            search_records: 0,
            search_duplicates: 0,
            aggregate_files: Vec::new(),
            metadata_items: 0,
            metadata_succeeded: 0,
            metadata_exhausted: 0,
            metadata_records: 0,
            metadata_duplicates: 0,
            metadata_path: None,
        }
    }

    /// Wall-clock duration of the run
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Terminal state of one keyword in the crawl phase
enum KeywordOutcome {
    /// Records were written to the given file
    Harvested(PathBuf),

    /// The search page fetched fine but held no results
    Empty,

    /// Every fetch attempt failed
    Exhausted,
}

struct KeywordReport {
    outcome: KeywordOutcome,
    stats: PipelineStats,
}

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Config,
    results_format: OutputFormat,
    metadata_format: OutputFormat,
    search_fetcher: Arc<dyn Fetcher>,
    page_fetcher: Arc<dyn Fetcher>,
    policy: RetryPolicy,
}

impl Coordinator {
    /// Creates a coordinator from a validated configuration
    ///
    /// Format tags are resolved here, so a bad tag is fatal before any
    /// network or file activity.
    pub fn new(config: Config) -> Result<Self> {
        let results_format = OutputFormat::parse(&config.output.results_format)?;
        let metadata_format = OutputFormat::parse(&config.output.metadata_format)?;

        let client = build_http_client()?;

        // Search pages get the relay's render wait; target pages do not
        let search_fetcher: Arc<dyn Fetcher> = match &config.relay {
            Some(relay) => Arc::new(HttpFetcher::via_relay(
                client.clone(),
                relay_target(relay, relay.search_wait),
            )),
            None => Arc::new(HttpFetcher::direct(client.clone())),
        };
        let page_fetcher: Arc<dyn Fetcher> = match &config.relay {
            Some(relay) => Arc::new(HttpFetcher::via_relay(client, relay_target(relay, None))),
            None => Arc::new(HttpFetcher::direct(client)),
        };

        let policy = RetryPolicy::new(config.crawler.max_retries, config.crawler.retry_delay_ms);

        Ok(Self {
            config,
            results_format,
            metadata_format,
            search_fetcher,
            page_fetcher,
            policy,
        })
    }

    /// Runs the full harvest
    ///
    /// # Arguments
    ///
    /// * `skip_metadata` - Stop after the crawl phase
    pub async fn run(&self, skip_metadata: bool) -> Result<RunSummary> {
        let mut summary = RunSummary::new(Utc::now());
        tracing::info!("Crawl starting...");

        if self.config.keywords.is_empty() {
            tracing::warn!("No keywords configured; nothing to do");
        }

        let results_dir = PathBuf::from(&self.config.output.results_dir);
        std::fs::create_dir_all(&results_dir)?;

        // Phase 1: one pipeline per keyword, search results to disk
        for keyword in &self.config.keywords {
            summary.keywords += 1;
            let report = self.crawl_keyword(keyword, &results_dir).await?;
            summary.search_records += report.stats.admitted;
            summary.search_duplicates += report.stats.duplicates;

            match report.outcome {
                KeywordOutcome::Harvested(path) => summary.aggregate_files.push(path),
                KeywordOutcome::Empty => {
                    tracing::info!("No results for keyword '{}'", keyword);
                }
                KeywordOutcome::Exhausted => summary.keywords_failed += 1,
            }
        }
        tracing::info!("Crawl complete.");

        // Phase 2: one shared pipeline over every harvested URL
        if !skip_metadata && !summary.aggregate_files.is_empty() {
            self.collect_metadata(&mut summary).await?;
        }

        summary.finished_at = Utc::now();
        Ok(summary)
    }

    /// Crawls one keyword's search-result page into its own file
    async fn crawl_keyword(&self, keyword: &str, results_dir: &Path) -> Result<KeywordReport> {
        let filename = format!("{}.{}", keyword_slug(keyword), self.results_format.extension());
        let path = results_dir.join(filename);

        let pipeline = Pipeline::new(
            build_sink(&path, self.results_format),
            self.config.pipeline.batch_capacity,
        );
        let target = search_url(keyword);
        tracing::info!("Crawling keyword '{}' into {}", keyword, path.display());

        match fetch_with_retry(
            self.search_fetcher.as_ref(),
            &SearchResultExtractor,
            &pipeline,
            &target,
            &self.policy,
        )
        .await
        {
            Ok(_) => {
                pipeline.close()?;
                let stats = pipeline.stats();
                let outcome = if path.exists() {
                    KeywordOutcome::Harvested(path)
                } else {
                    // Nothing was ever flushed, so no file was created
                    KeywordOutcome::Empty
                };
                Ok(KeywordReport { outcome, stats })
            }
            Err(ItemError::RetriesExhausted { .. }) => {
                tracing::error!("Giving up on keyword '{}'", keyword);
                pipeline.close()?;
                Ok(KeywordReport {
                    outcome: KeywordOutcome::Exhausted,
                    stats: pipeline.stats(),
                })
            }
            Err(fatal) => Err(fatal.into()),
        }
    }

    /// Fans the harvested URLs out over the worker pool for metadata
    async fn collect_metadata(&self, summary: &mut RunSummary) -> Result<()> {
        let urls = self.load_work_items(&summary.aggregate_files)?;
        let metadata_path = PathBuf::from(&self.config.output.metadata_path);
        summary.metadata_items = urls.len();

        tracing::info!(
            "Processing {} result pages into {}",
            urls.len(),
            metadata_path.display()
        );

        let pipeline = Arc::new(Pipeline::new(
            build_sink(&metadata_path, self.metadata_format),
            self.config.pipeline.batch_capacity,
        ));

        let pool = WorkerPool::new(self.config.crawler.max_workers as usize);
        let mut report = pool
            .run(
                urls,
                Arc::clone(&self.page_fetcher),
                Arc::new(PageMetadataExtractor),
                Arc::clone(&pipeline),
                self.policy.clone(),
            )
            .await;

        if let Some(fatal) = report.take_fatal() {
            return Err(fatal.into());
        }

        pipeline.close()?;
        let stats = pipeline.stats();

        summary.metadata_succeeded = report.succeeded;
        summary.metadata_exhausted = report.exhausted;
        summary.metadata_records = stats.admitted;
        summary.metadata_duplicates = stats.duplicates;
        summary.metadata_path = Some(metadata_path);
        Ok(())
    }

    /// Reads the `url` column back from every aggregate file
    fn load_work_items(&self, files: &[PathBuf]) -> Result<Vec<String>> {
        let mut urls = Vec::new();

        for path in files {
            match self.results_format {
                OutputFormat::Csv => {
                    let mut reader = csv::Reader::from_path(path)?;
                    for row in reader.deserialize() {
                        let record: SearchResult = row?;
                        urls.push(record.url);
                    }
                }
                OutputFormat::Json => {
                    let content = std::fs::read_to_string(path)?;
                    let records: Vec<SearchResult> = serde_json::from_str(&content)
                        .map_err(|e| {
                            DuckdiveError::Sink(SinkError::Corrupted {
                                path: path.display().to_string(),
                                message: e.to_string(),
                            })
                        })?;
                    urls.extend(records.into_iter().map(|r| r.url));
                }
            }
        }

        Ok(urls)
    }
}

/// Maps the relay config onto a per-role relay target
fn relay_target(relay: &crate::config::RelayConfig, wait: Option<u64>) -> RelayTarget {
    RelayTarget {
        endpoint: relay.endpoint.clone(),
        api_key: relay.api_key.clone(),
        location: relay.location.clone(),
        wait,
    }
}

/// Filename slug for a keyword: trimmed, spaces become hyphens
pub fn keyword_slug(keyword: &str) -> String {
    keyword.trim().replace(' ', "-")
}

/// Runs a complete harvest with the given configuration
///
/// This is the main library entry point: it builds a coordinator and
/// drives both phases.
///
/// # Arguments
///
/// * `config` - The validated run configuration
/// * `skip_metadata` - Stop after the crawl phase
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run finished (possibly with contained
///   item-level failures)
/// * `Err(DuckdiveError)` - A configuration or sink failure aborted it
pub async fn harvest(config: Config, skip_metadata: bool) -> Result<RunSummary> {
    Coordinator::new(config)?.run(skip_metadata).await
}
