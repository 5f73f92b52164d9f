use serde::Deserialize;

/// Main configuration structure for HN-Harvest
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
}

/// The crawled site
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root listing URL; also the base origin for relative links
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://news.ycombinator.com/".to_string(),
        }
    }
}

/// HTTP fetch and retry behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Total attempts per URL, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds); doubles each retry
    #[serde(rename = "base-backoff-ms")]
    pub base_backoff_ms: u64,

    /// Upper bound of the uniform jitter added to each delay (milliseconds)
    #[serde(rename = "jitter-max-ms")]
    pub jitter_max_ms: u64,

    /// Statuses that are always retried
    #[serde(rename = "retryable-statuses")]
    pub retryable_statuses: Vec<u16>,

    /// Retry 4xx statuses outside `retryable-statuses` instead of failing
    #[serde(rename = "retry-client-errors")]
    pub retry_client_errors: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0"
                .to_string(),
            timeout_secs: 15,
            max_attempts: 3,
            base_backoff_ms: 1000,
            jitter_max_ms: 500,
            retryable_statuses: vec![429, 500, 502, 503, 504],
            retry_client_errors: false,
        }
    }
}

/// Pagination behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Hard ceiling on the number of pages visited in one run
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Politeness delay between pages (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 9999,
            page_delay_ms: 700,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the CSV export of the session
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Path to the spreadsheet export of the session
    #[serde(rename = "xlsx-path")]
    pub xlsx_path: String,

    /// Path to the persistent log file
    #[serde(rename = "log-path")]
    pub log_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "hn_posts.db".to_string(),
            csv_path: "hn_posts.csv".to_string(),
            xlsx_path: "hn_posts.xlsx".to_string(),
            log_path: "hn_scraper.log".to_string(),
        }
    }
}
