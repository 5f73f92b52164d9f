//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing pages and test the full
//! fetch, extract, persist and export cycle end-to-end.

use hn_harvest::config::{Config, CrawlConfig, FetchConfig, OutputConfig, SiteConfig};
use hn_harvest::crawler::{crawl, StopReason};
use hn_harvest::output::export_session;
use hn_harvest::storage::{SqliteStorage, Storage};
use hn_harvest::{FetchError, FetchFailure, HarvestError};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, dir: &TempDir) -> Config {
    Config {
        site: SiteConfig {
            base_url: format!("{}/", base_url),
        },
        fetch: FetchConfig {
            timeout_secs: 5,
            max_attempts: 3,
            base_backoff_ms: 20,
            jitter_max_ms: 5,
            ..FetchConfig::default()
        },
        crawl: CrawlConfig {
            max_pages: 50,
            page_delay_ms: 1, // Very short for testing
        },
        output: OutputConfig {
            database_path: dir.path().join("hn_posts.db").display().to_string(),
            csv_path: dir.path().join("hn_posts.csv").display().to_string(),
            xlsx_path: dir.path().join("hn_posts.xlsx").display().to_string(),
            log_path: dir.path().join("hn_scraper.log").display().to_string(),
        },
    }
}

/// Builds a listing page with one item per id
fn listing_html(ids: &[u32]) -> String {
    let rows: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<tr class="athing submission" id="{id}">
                    <td class="title"><span class="titleline"><a href="item?id={id}">Post {id}</a></span></td>
                </tr>
                <tr>
                    <td class="subtext"><span class="subline">
                        <span class="score" id="score_{id}">{id} points</span> by
                        <a href="user?id=user{id}" class="hnuser">user{id}</a>
                        <span class="age"><a href="item?id={id}">{id} minutes ago</a></span>
                    </span></td>
                </tr>
                <tr class="spacer"></tr>"#,
                id = id
            )
        })
        .collect();

    format!(
        r#"<html><head><title>Listing</title></head><body><table id="hnmain"><tr><td><table>{}</table></td></tr></table></body></html>"#,
        rows
    )
}

async fn mount_page(server: &MockServer, page: u32, ids: &[u32]) {
    let response = ResponseTemplate::new(200)
        .set_body_string(listing_html(ids))
        .insert_header("content-type", "text/html");

    if page == 1 {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(response)
            .mount(server)
            .await;
    } else {
        Mock::given(method("GET"))
            .and(path("/news"))
            .and(query_param("p", page.to_string()))
            .respond_with(response)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_crawl_stops_on_not_found() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, &[1, 2, 3]).await;
    mount_page(&mock_server, 2, &[4, 5]).await;
    // Page 3 is not mounted, wiremock answers 404

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    let mut storage = SqliteStorage::new(std::path::Path::new(&config.output.database_path))
        .expect("Failed to open DB");

    let report = crawl(&config, &mut storage).await.expect("Crawl failed");

    assert_eq!(report.stop_reason, StopReason::NotFound);
    assert_eq!(report.pages_crawled, 2);
    let ids: Vec<&str> = report.records.iter().map(|r| r.item_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(storage.count().unwrap(), 5);

    let stored = storage.get("4").unwrap().expect("record 4 stored");
    assert_eq!(stored.record.title, "Post 4");
    assert_eq!(stored.record.points, 4);
    assert_eq!(stored.record.author, "user4");
    assert_eq!(stored.record.age_text, "4 minutes ago");
    assert_eq!(stored.record.url, format!("{}/item?id=4", mock_server.uri()));
    assert_eq!(
        stored.record.comments_link,
        format!("{}/item?id=4", mock_server.uri())
    );
}

#[tokio::test]
async fn test_crawl_stops_on_empty_page() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, &[10, 11]).await;
    mount_page(&mock_server, 2, &[]).await;

    // Must never be requested
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("p", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[12])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    let report = crawl(&config, &mut storage).await.expect("Crawl failed");

    assert_eq!(report.stop_reason, StopReason::EmptyPage);
    assert_eq!(report.records.len(), 2);
    assert_eq!(storage.count().unwrap(), 2);
}

#[tokio::test]
async fn test_crawl_respects_page_limit() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, &[1]).await;
    mount_page(&mock_server, 2, &[2]).await;
    mount_page(&mock_server, 3, &[3]).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), &dir);
    config.crawl.max_pages = 2;
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    let report = crawl(&config, &mut storage).await.expect("Crawl failed");

    assert_eq!(report.stop_reason, StopReason::MaxPages);
    assert_eq!(report.records.len(), 2);
}

#[tokio::test]
async fn test_crawl_recovers_from_transient_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, 1, &[7, 8]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    let report = crawl(&config, &mut storage).await.expect("Crawl failed");

    assert_eq!(report.records.len(), 2);
    assert_eq!(storage.count().unwrap(), 2);
}

#[tokio::test]
async fn test_exhausted_retries_abort_crawl_but_keep_earlier_pages() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, &[1, 2]).await;

    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    let err = crawl(&config, &mut storage)
        .await
        .expect_err("Crawl should fail");

    match err {
        HarvestError::Fetch(FetchError::Exhausted {
            attempts, cause, ..
        }) => {
            assert_eq!(attempts, 3);
            assert_eq!(cause, FetchFailure::Status(500));
        }
        other => panic!("Expected fetch error, got {:?}", other),
    }
    assert_eq!(storage.count().unwrap(), 2);
}

#[tokio::test]
async fn test_recrawl_does_not_duplicate_records() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, &[1, 2, 3]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    let mut storage = SqliteStorage::new(std::path::Path::new(&config.output.database_path))
        .expect("Failed to open DB");

    let first = crawl(&config, &mut storage).await.expect("First crawl failed");
    let first_seen = storage.get("2").unwrap().unwrap();

    let second = crawl(&config, &mut storage).await.expect("Second crawl failed");

    assert_eq!(first.inserted, 3);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.records.len(), 3);
    assert_eq!(storage.count().unwrap(), 3);
    assert_eq!(storage.get("2").unwrap().unwrap(), first_seen);
}

#[tokio::test]
async fn test_session_export_contains_only_session_records() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, &[21, 22]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    let mut storage = SqliteStorage::new(std::path::Path::new(&config.output.database_path))
        .expect("Failed to open DB");

    // A record from an earlier run
    let earlier = hn_harvest::Record {
        item_id: "1".to_string(),
        title: "Old".to_string(),
        url: "https://example.com/old".to_string(),
        points: 1,
        author: String::new(),
        age_text: String::new(),
        comments_link: String::new(),
    };
    storage.insert_batch(&[earlier]).unwrap();

    let report = crawl(&config, &mut storage).await.expect("Crawl failed");
    export_session(&report.records, &config.output).expect("Export failed");

    assert_eq!(storage.count().unwrap(), 3);

    let mut reader = csv::Reader::from_path(&config.output.csv_path).unwrap();
    let ids: Vec<String> = reader
        .records()
        .map(|row| row.unwrap()[0].to_string())
        .collect();
    assert_eq!(ids, vec!["21", "22"]);
    assert!(std::path::Path::new(&config.output.xlsx_path).exists());
}
