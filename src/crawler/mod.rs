//! Crawler module for populating the vehicle database
//!
//! This module contains the crawl orchestration, including:
//! - Years discovery and per-year resume
//! - Fan-out over years and makes under one global request ceiling
//! - Progress reporting as years finish

mod coordinator;
mod progress;

pub use coordinator::{CrawlReport, Crawler, YearOutcome};
pub use progress::{ProgressReporter, SilentProgress, StderrProgress};

use crate::api::{ApiClient, Endpoints, FailureLog, HttpFetcher};
use crate::config::Config;
use crate::storage::open_shared_storage;
use crate::Result;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete populate operation
///
/// This is the main entry point for a crawl. It will:
/// 1. Open (or create) the database
/// 2. Build the HTTP client from the `[api]` section
/// 3. Crawl every year not already completed
///
/// # Arguments
///
/// * `config` - Validated configuration
/// * `progress` - Receives one event per finished year
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl ran; pending years are retried next time
/// * `Err(VehicleDbError)` - Setup failed or the years list was unavailable
pub async fn populate(config: &Config, progress: &dyn ProgressReporter) -> Result<CrawlReport> {
    let storage = open_shared_storage(Path::new(&config.output.database_path))?;
    let endpoints = Endpoints::new(&config.api.base_url)?;
    let client = ApiClient::new(&config.api.http_settings())?;
    let failures = FailureLog::new();
    let fetcher = Arc::new(HttpFetcher::new(client, failures.clone()));

    tracing::info!(
        "Populating {} from {} with at most {} concurrent requests",
        config.output.database_path,
        endpoints.base(),
        config.crawler.max_concurrent_requests
    );

    let crawler = Crawler::new(
        fetcher,
        failures,
        storage,
        endpoints,
        config.crawler.max_concurrent_requests as usize,
    );

    crawler.run(progress).await
}
