//! Crawler module for page fetching and scrape orchestration
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with classified errors
//! - Parsed documents with URL resolution
//! - Rate limiting and retry with backoff
//! - The pagination, list/detail and multi-page walks

mod document;
mod fetcher;
mod limiter;
mod retry;
mod walker;

pub use document::{element_text, Document};
pub use fetcher::{build_http_client, FetchedPage, Fetcher};
pub use limiter::{RateLimiter, MAX_INTERVAL};
pub use retry::{RetryPolicy, MAX_RETRY_DELAY};
pub use walker::{
    collect_detail_links, find_next_link, ScrapedPage, Scraper, DEFAULT_PAGE_DELAY,
};

use crate::config::Config;
use crate::output::HarvestStats;
use crate::HarvestError;

/// Runs a complete scrape job
///
/// This is the main entry point for a job. It will:
/// 1. Build the fetcher and the configured politeness layers
/// 2. Run the walk named by the `[job]` section
/// 3. Return the scraped pages in request order, with run statistics
///
/// # Returns
///
/// * `Ok((pages, stats))` - The job ran; skipped pages are counted in `stats`
/// * `Err(HarvestError)` - The job could not be set up
pub async fn run_job(config: &Config) -> Result<(Vec<ScrapedPage>, HarvestStats), HarvestError> {
    let mut scraper = Scraper::from_config(config)?;
    let pages = scraper.run(&config.job).await?;
    Ok((pages, scraper.into_stats()))
}
