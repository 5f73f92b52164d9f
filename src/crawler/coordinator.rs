//! Crawler coordinator - pagination state machine
//!
//! Drives one page at a time through fetch, extract and persist until the
//! site runs out of pages, a page comes back empty, or the page ceiling is
//! reached. A fetch that gives up aborts the whole crawl; records stored
//! before that point stay stored.

use crate::config::{Config, CrawlConfig};
use crate::crawler::fetcher::{FetchOutcome, Fetcher, Page, PageSource};
use crate::crawler::parser::Extractor;
use crate::crawler::retry::{Pause, TokioPause};
use crate::record::Record;
use crate::storage::Storage;
use crate::FetchError;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Why a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The next page returned HTTP 404
    NotFound,
    /// The next page had no well-formed items
    EmptyPage,
    /// The configured page ceiling was reached
    MaxPages,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "page not found"),
            Self::EmptyPage => write!(f, "empty page"),
            Self::MaxPages => write!(f, "page limit reached"),
        }
    }
}

/// Result of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Every record extracted during this session, in crawl order
    pub records: Vec<Record>,
    /// Pages whose records were persisted
    pub pages_crawled: u32,
    /// Records that were new to the store
    pub inserted: usize,
    pub stop_reason: StopReason,
}

enum CrawlState {
    Fetching(u32),
    Extracting(u32, Page),
    Persisting(u32, Vec<Record>),
    Done(StopReason),
}

/// URL of listing page `page` (1-based)
///
/// Page 1 is the base URL itself; later pages are `base + "news?p=N"`.
pub fn page_url(base_url: &Url, page: u32) -> Result<Url, url::ParseError> {
    if page <= 1 {
        Ok(base_url.clone())
    } else {
        Url::parse(&format!("{}news?p={}", base_url, page))
    }
}

/// Main crawler structure
pub struct Crawler<S, P = TokioPause> {
    source: S,
    pause: P,
    extractor: Extractor,
    max_pages: u32,
    page_delay: Duration,
}

impl Crawler<Fetcher, TokioPause> {
    /// Builds a live HTTP crawler from the configuration
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let base_url = Url::parse(&config.site.base_url)?;
        let fetcher = Fetcher::new(&config.fetch)?;
        Self::new(fetcher, TokioPause, base_url, &config.crawl)
    }
}

impl<S: PageSource, P: Pause> Crawler<S, P> {
    /// Creates a crawler over an arbitrary page source
    ///
    /// # Arguments
    ///
    /// * `source` - Where pages come from
    /// * `pause` - Used for the politeness delay between pages
    /// * `base_url` - Root listing URL, also the base for relative links
    /// * `crawl` - Page ceiling and inter-page delay
    pub fn new(
        source: S,
        pause: P,
        base_url: Url,
        crawl: &CrawlConfig,
    ) -> crate::Result<Self> {
        Ok(Self {
            source,
            pause,
            extractor: Extractor::new(base_url)?,
            max_pages: crawl.max_pages.max(1),
            page_delay: Duration::from_millis(crawl.page_delay_ms),
        })
    }

    pub fn base_url(&self) -> &Url {
        self.extractor.base_url()
    }

    /// Runs the crawl to completion
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Pagination ended normally
    /// * `Err(HarvestError::Fetch)` - A page could not be fetched
    /// * `Err(HarvestError::Storage)` - A batch could not be persisted
    pub async fn run(&self, storage: &mut dyn Storage) -> crate::Result<CrawlReport> {
        let mut records = Vec::new();
        let mut inserted = 0;
        let mut pages_crawled = 0;
        let mut state = CrawlState::Fetching(1);

        let stop_reason = loop {
            state = match state {
                CrawlState::Fetching(page) => {
                    let url = page_url(self.base_url(), page)?;
                    tracing::info!("Scraping page {}: {}", page, url);

                    match self.source.fetch(&url).await {
                        FetchOutcome::Fetched(fetched) => CrawlState::Extracting(page, fetched),
                        FetchOutcome::NotFound => {
                            tracing::info!("Stop: page {} not found", page);
                            CrawlState::Done(StopReason::NotFound)
                        }
                        FetchOutcome::GaveUp { attempts, cause } => {
                            tracing::error!("Aborting crawl at page {}", page);
                            return Err(FetchError::Exhausted {
                                url: url.to_string(),
                                attempts,
                                cause,
                            }
                            .into());
                        }
                    }
                }

                CrawlState::Extracting(page, fetched) => {
                    let found = self.extractor.extract(&fetched.body);
                    tracing::info!("Parsed {} posts from page {}", found.len(), page);

                    if found.is_empty() {
                        tracing::info!("Stop: empty page");
                        CrawlState::Done(StopReason::EmptyPage)
                    } else {
                        CrawlState::Persisting(page, found)
                    }
                }

                CrawlState::Persisting(page, found) => {
                    let new_rows = storage.insert_batch(&found)?;
                    tracing::debug!(
                        "Stored {} new of {} posts from page {}",
                        new_rows,
                        found.len(),
                        page
                    );
                    inserted += new_rows;
                    records.extend(found);
                    pages_crawled = page;

                    self.pause.pause(self.page_delay).await;

                    if page >= self.max_pages {
                        tracing::info!("Stop: reached page limit {}", self.max_pages);
                        CrawlState::Done(StopReason::MaxPages)
                    } else {
                        CrawlState::Fetching(page + 1)
                    }
                }

                CrawlState::Done(reason) => break reason,
            };
        };

        tracing::info!(
            "TOTAL collected: {} posts across {} pages ({})",
            records.len(),
            pages_crawled,
            stop_reason
        );

        Ok(CrawlReport {
            records,
            pages_crawled,
            inserted,
            stop_reason,
        })
    }
}
