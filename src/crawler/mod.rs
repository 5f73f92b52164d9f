//! Crawler module for listing page fetching and processing
//!
//! This module contains the core crawling pipeline:
//! - HTTP fetching with retry and backoff
//! - Record extraction from listing pages
//! - Pagination and persistence coordination

mod coordinator;
mod fetcher;
mod parser;
mod retry;

pub use coordinator::{page_url, CrawlReport, Crawler, StopReason};
pub use fetcher::{
    build_http_client, classify_status, FetchOutcome, Fetcher, Page, PageSource, StatusClass,
};
pub use parser::{resolve_link, Extractor};
pub use retry::{Pause, RetryPolicy, TokioPause};

use crate::config::Config;
use crate::storage::Storage;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client
/// 2. Walk the listing pages from page 1
/// 3. Extract and persist each page's records
/// 4. Return the records gathered in this session
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `storage` - Where records are persisted
pub async fn crawl(config: &Config, storage: &mut dyn Storage) -> crate::Result<CrawlReport> {
    storage.ensure_schema()?;
    Crawler::from_config(config)?.run(storage).await
}
