use crate::config::types::{Config, CrawlConfig, FetchConfig, OutputConfig, SiteConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_site_config(&config.site)?;
    validate_fetch_config(&config.fetch)?;
    validate_crawl_config(&config.crawl)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site base URL
fn validate_site_config(config: &SiteConfig) -> ConfigResult<()> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    // Page URLs are built by appending "news?p=N" to the base
    if !url.path().ends_with('/') || url.query().is_some() {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must end with '/' and carry no query",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates fetch and retry settings
fn validate_fetch_config(config: &FetchConfig) -> ConfigResult<()> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.base_backoff_ms < 1 {
        return Err(ConfigError::Validation(
            "base_backoff_ms must be >= 1".to_string(),
        ));
    }

    // Keeps successive backoff delays strictly increasing
    if config.jitter_max_ms >= config.base_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "jitter_max_ms ({}) must be smaller than base_backoff_ms ({})",
            config.jitter_max_ms, config.base_backoff_ms
        )));
    }

    for status in &config.retryable_statuses {
        if *status == 404 || !(100..600).contains(status) || (200..300).contains(status) {
            return Err(ConfigError::Validation(format!(
                "retryable_statuses cannot contain {}",
                status
            )));
        }
    }

    Ok(())
}

/// Validates pagination settings
fn validate_crawl_config(config: &CrawlConfig) -> ConfigResult<()> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    for (name, value) in [
        ("database_path", &config.database_path),
        ("csv_path", &config.csv_path),
        ("xlsx_path", &config.xlsx_path),
        ("log_path", &config.log_path),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_base_url() {
        let site = |url: &str| SiteConfig {
            base_url: url.to_string(),
        };

        assert!(validate_site_config(&site("https://news.ycombinator.com/")).is_ok());
        assert!(validate_site_config(&site("http://127.0.0.1:8080/")).is_ok());
        // The url crate adds the root slash itself
        assert!(validate_site_config(&site("https://news.ycombinator.com")).is_ok());

        assert!(validate_site_config(&site("not a url")).is_err());
        assert!(validate_site_config(&site("ftp://example.com/")).is_err());
        assert!(validate_site_config(&site("https://example.com/news")).is_err());
        assert!(validate_site_config(&site("https://example.com/?p=1")).is_err());
    }

    #[test]
    fn test_jitter_must_stay_below_base_delay() {
        let mut fetch = FetchConfig::default();
        fetch.jitter_max_ms = fetch.base_backoff_ms;
        assert!(validate_fetch_config(&fetch).is_err());

        fetch.jitter_max_ms = 0;
        assert!(validate_fetch_config(&fetch).is_ok());
    }

    #[test]
    fn test_retryable_statuses_rejects_not_found_and_success() {
        let mut fetch = FetchConfig::default();
        fetch.retryable_statuses = vec![404];
        assert!(validate_fetch_config(&fetch).is_err());

        fetch.retryable_statuses = vec![200];
        assert!(validate_fetch_config(&fetch).is_err());

        fetch.retryable_statuses = vec![403, 429];
        assert!(validate_fetch_config(&fetch).is_ok());
    }

    #[test]
    fn test_max_attempts_bounds() {
        let mut fetch = FetchConfig::default();
        fetch.max_attempts = 0;
        assert!(validate_fetch_config(&fetch).is_err());

        fetch.max_attempts = 1;
        assert!(validate_fetch_config(&fetch).is_ok());
    }

    #[test]
    fn test_empty_output_path() {
        let mut output = OutputConfig::default();
        output.xlsx_path.clear();
        assert!(validate_output_config(&output).is_err());
    }
}
