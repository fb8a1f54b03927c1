//! Duckdive main entry point
//!
//! This is the command-line interface for the Duckdive search harvester.

use anyhow::Context;
use clap::Parser;
use duckdive::config::load_config_with_hash;
use duckdive::crawl::harvest;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Duckdive: a batch-oriented search result harvester
///
/// Duckdive fetches search-result pages for a list of keywords, follows
/// the results, and writes deduplicated records to CSV/JSON files in
/// bounded batches.
#[derive(Parser, Debug)]
#[command(name = "duckdive")]
#[command(version = "1.0.0")]
#[command(about = "A batch-oriented search result harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching
    #[arg(long)]
    dry_run: bool,

    /// Run only the crawl phase, skipping the metadata pass
    #[arg(long)]
    skip_metadata: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let summary = harvest(config, cli.skip_metadata)
        .await
        .context("harvest run failed")?;
    print_summary(&summary);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("duckdive=info,warn"),
            1 => EnvFilter::new("duckdive=debug,info"),
            2 => EnvFilter::new("duckdive=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the plan
fn handle_dry_run(config: &duckdive::Config) {
    println!("=== Duckdive Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Max workers: {}", config.crawler.max_workers);
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);

    match &config.relay {
        Some(relay) => {
            println!("\nRelay:");
            println!("  Endpoint: {}", relay.endpoint);
            println!("  Location: {}", relay.location);
            match relay.search_wait {
                Some(wait) => println!("  Search wait: {}", wait),
                None => println!("  Search wait: none"),
            }
        }
        None => println!("\nRelay: none (direct fetching)"),
    }

    println!("\nPipeline:");
    println!("  Batch capacity: {}", config.pipeline.batch_capacity);

    println!("\nOutput:");
    println!(
        "  Results: {}/<keyword>.{}",
        config.output.results_dir, config.output.results_format
    );
    println!(
        "  Metadata: {} ({})",
        config.output.metadata_path, config.output.metadata_format
    );

    println!("\nKeywords ({}):", config.keywords.len());
    for keyword in &config.keywords {
        println!("  - {}", keyword);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would harvest {} keyword(s)", config.keywords.len());
}

/// Prints the end-of-run summary
fn print_summary(summary: &duckdive::RunSummary) {
    println!("\n=== Harvest Summary ===\n");
    println!("Started:  {}", summary.started_at.to_rfc3339());
    println!("Finished: {}", summary.finished_at.to_rfc3339());
    println!("Duration: {}s", summary.duration().num_seconds());

    println!("\nCrawl phase:");
    println!(
        "  Keywords: {} attempted, {} failed",
        summary.keywords, summary.keywords_failed
    );
    println!(
        "  Search records: {} written, {} duplicates dropped",
        summary.search_records, summary.search_duplicates
    );
    for file in &summary.aggregate_files {
        println!("  - {}", file.display());
    }

    match &summary.metadata_path {
        Some(path) => {
            println!("\nMetadata phase:");
            println!(
                "  Pages: {} attempted, {} succeeded, {} exhausted",
                summary.metadata_items, summary.metadata_succeeded, summary.metadata_exhausted
            );
            println!(
                "  Records: {} written, {} duplicates dropped",
                summary.metadata_records, summary.metadata_duplicates
            );
            println!("  - {}", path.display());
        }
        None => println!("\nMetadata phase: skipped"),
    }
}
