//! HN-Harvest main entry point
//!
//! This is the command-line interface for the HN-Harvest listing crawler.

use anyhow::Context;
use clap::Parser;
use hn_harvest::config::{load_config_with_hash, validate, Config};
use hn_harvest::crawler::{crawl, page_url};
use hn_harvest::output::export_session;
use hn_harvest::storage::{open_storage, Storage};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use url::Url;

/// HN-Harvest: a polite, incremental listing crawler
///
/// Walks the listing pages from the front page onwards, stores every item
/// once in SQLite and exports this session's items to CSV and XLSX.
#[derive(Parser, Debug)]
#[command(name = "hn-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite, incremental listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used without one)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the listing root URL
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Override the page ceiling
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the number of stored records and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging needs the log path, so configuration comes first
    let (config, config_hash) = match load_effective_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = setup_logging(cli.verbose, cli.quiet, Path::new(&config.output.log_path)) {
        eprintln!("Failed to set up logging: {:#}", e);
        return ExitCode::from(2);
    }

    if let Some(hash) = config_hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    let result = if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(&config).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(severity = "critical", "Unexpected error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Loads the configuration file (if any) and applies command-line overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("reading {}", path.display()))?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(base_url) = &cli.base_url {
        config.site.base_url = base_url.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawl.max_pages = max_pages;
    }
    validate(&config).context("invalid command-line override")?;

    Ok((config, hash))
}

/// Sets up a console layer and an append-only log file layer
fn setup_logging(verbose: u8, quiet: bool, log_path: &Path) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("hn_harvest=info,warn"),
            1 => EnvFilter::new("hn_harvest=debug,info"),
            2 => EnvFilter::new("hn_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    Ok(())
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== HN-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);

    println!("\nFetch:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!(
        "  Backoff: {}ms doubling, jitter up to {}ms",
        config.fetch.base_backoff_ms, config.fetch.jitter_max_ms
    );
    println!("  Retryable statuses: {:?}", config.fetch.retryable_statuses);
    println!("  Retry other 4xx: {}", config.fetch.retry_client_errors);

    println!("\nCrawl:");
    println!("  Max pages: {}", config.crawl.max_pages);
    println!("  Delay between pages: {}ms", config.crawl.page_delay_ms);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  CSV: {}", config.output.csv_path);
    println!("  Spreadsheet: {}", config.output.xlsx_path);
    println!("  Log: {}", config.output.log_path);

    let base_url = Url::parse(&config.site.base_url)?;
    println!("\nFirst pages:");
    for page in 1..=config.crawl.max_pages.min(3) {
        println!("  {}. {}", page, page_url(&base_url, page)?);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --stats mode: shows the store's record count
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.output.database_path))?;
    println!("Database: {}", config.output.database_path);
    println!("Total in DB: {}", storage.count()?);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Starting crawl of {} (max {} pages)",
        config.site.base_url,
        config.crawl.max_pages
    );

    let mut storage = open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("opening database {}", config.output.database_path))?;

    let report = crawl(config, &mut storage).await?;
    let total = storage.count()?;

    export_session(&report.records, &config.output)?;
    tracing::info!("Saved to SQLite. Total rows in DB: {}", total);

    println!(
        "Scraped session: {} | Total in DB: {}",
        report.records.len(),
        total
    );
    println!(
        "✓ Data saved to {}, {} and {}",
        config.output.database_path, config.output.csv_path, config.output.xlsx_path
    );

    Ok(())
}
