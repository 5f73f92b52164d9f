//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with a browser-like user agent and timeout
//! - Classifying responses (page, not found, transient, fatal)
//! - Retrying transient failures with exponential backoff and jitter

use crate::config::FetchConfig;
use crate::crawler::retry::{Pause, RetryPolicy, TokioPause};
use crate::FetchFailure;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// A successfully fetched listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// URL the page was requested from
    pub url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Raw HTML body
    pub body: String,
}

/// Result of fetching one URL, after retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was fetched
    Fetched(Page),

    /// HTTP 404: there is no such page
    NotFound,

    /// Retries ran out (or the failure was not worth retrying)
    GaveUp {
        /// Attempts actually made
        attempts: u32,
        /// Failure seen on the last attempt
        cause: FetchFailure,
    },
}

/// Source of listing pages
///
/// Implemented by [`Fetcher`] for live HTTP; tests script their own.
pub trait PageSource {
    fn fetch(&self, url: &Url) -> impl Future<Output = FetchOutcome>;
}

/// How a response status is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    NotFound,
    Retry,
    Fatal,
}

/// Classifies a response status
///
/// | Status | Action |
/// |--------|--------|
/// | 2xx | Success |
/// | 404 | NotFound, no retry |
/// | in `retryable_statuses` | Retry |
/// | other 4xx | Fatal, or Retry with `retry_client_errors` |
/// | anything else | Retry |
pub fn classify_status(status: StatusCode, config: &FetchConfig) -> StatusClass {
    if status.is_success() {
        return StatusClass::Success;
    }
    if status == StatusCode::NOT_FOUND {
        return StatusClass::NotFound;
    }
    if config.retryable_statuses.contains(&status.as_u16()) {
        return StatusClass::Retry;
    }
    if status.is_client_error() && !config.retry_client_errors {
        return StatusClass::Fatal;
    }
    StatusClass::Retry
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use hn_harvest::config::FetchConfig;
/// use hn_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Outcome of a single request
enum Attempt {
    Page(Page),
    NotFound,
    Transient(FetchFailure),
    Fatal(FetchFailure),
}

fn classify_error(error: &reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout
    } else if error.is_connect() {
        FetchFailure::Connect(error.to_string())
    } else {
        FetchFailure::Network(error.to_string())
    }
}

/// Retrying HTTP fetcher
pub struct Fetcher<P = TokioPause> {
    client: Client,
    policy: RetryPolicy,
    config: FetchConfig,
    pause: P,
}

impl Fetcher<TokioPause> {
    /// Creates a fetcher that sleeps on the tokio timer between retries
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Self::with_pause(config, TokioPause)
    }
}

impl<P: Pause> Fetcher<P> {
    /// Creates a fetcher with a custom pause between retries
    pub fn with_pause(config: &FetchConfig, pause: P) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            policy: RetryPolicy::from_config(config),
            config: config.clone(),
            pause,
        })
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// Returns [`FetchOutcome::GaveUp`] once `max_attempts` requests have
    /// failed, or straight away on a fatal status.
    pub async fn fetch_page(&self, url: &Url) -> FetchOutcome {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let cause = match self.attempt(url).await {
                Attempt::Page(page) => {
                    tracing::info!("OK {} | {} | attempt {}", page.status_code, url, attempt);
                    return FetchOutcome::Fetched(page);
                }
                Attempt::NotFound => {
                    tracing::warn!("404 Not Found: {}", url);
                    return FetchOutcome::NotFound;
                }
                Attempt::Fatal(cause) => {
                    tracing::error!("Not retrying {} | {}", url, cause);
                    return FetchOutcome::GaveUp {
                        attempts: attempt,
                        cause,
                    };
                }
                Attempt::Transient(cause) => cause,
            };

            if attempt >= max_attempts {
                tracing::error!("Failed after {} attempts | {} | {}", attempt, url, cause);
                return FetchOutcome::GaveUp {
                    attempts: attempt,
                    cause,
                };
            }

            let delay = self.policy.delay_for(attempt);
            tracing::warn!(
                "Retry {}/{} in {:.1}s | {} | {}",
                attempt,
                max_attempts,
                delay.as_secs_f64(),
                url,
                cause
            );
            self.pause.pause(delay).await;
        }
    }

    async fn attempt(&self, url: &Url) -> Attempt {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Transient(classify_error(&e)),
        };

        let status = response.status();
        match classify_status(status, &self.config) {
            StatusClass::Success => match response.text().await {
                Ok(body) => Attempt::Page(Page {
                    url: url.clone(),
                    status_code: status.as_u16(),
                    body,
                }),
                Err(e) => Attempt::Transient(classify_error(&e)),
            },
            StatusClass::NotFound => Attempt::NotFound,
            StatusClass::Retry => Attempt::Transient(FetchFailure::Status(status.as_u16())),
            StatusClass::Fatal => Attempt::Fatal(FetchFailure::Status(status.as_u16())),
        }
    }
}

impl<P: Pause> PageSource for Fetcher<P> {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        self.fetch_page(url).await
    }
}
