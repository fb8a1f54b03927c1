//! Harvest orchestration
//!
//! This module contains the run-level driver that wires the pipeline,
//! fetchers, extractors, and worker pool together:
//! - Crawl phase: search-result pages into per-keyword files
//! - Metadata phase: harvested URLs into a single merged report

mod coordinator;

pub use coordinator::{harvest, keyword_slug, Coordinator, RunSummary};
