//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive the real
//! `HttpFetcher` and `SqliteStorage` through the crawl engine end-to-end.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use trawl::config::{CrawlerConfig, UserAgentConfig};
use trawl::crawler::{CrawlEngine, CrawlSummary, EngineConfig, FetchError, Fetcher, HttpFetcher};
use trawl::storage::SqliteStorage;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXPECTED_USER_AGENT: &str = "TestBot/1.0.0 (+https://example.com/contact; test@example.com)";

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn crawler_config() -> CrawlerConfig {
    CrawlerConfig {
        workers: 4,
        requests_per_second: 100,
        queue_capacity: 64,
        fetch_timeout_secs: 5,
        max_body_bytes: 64 * 1024,
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

async fn fetch(fetcher: &HttpFetcher, url: &str) -> Result<Vec<u8>, FetchError> {
    fetcher.fetch(&CancellationToken::new(), url).await
}

/// Polls the engine until `done` holds for its counters
async fn wait_for(engine: &CrawlEngine, done: impl Fn(&CrawlSummary) -> bool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !done(&engine.stats()) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("crawl did not reach the expected state in time");
}

#[tokio::test]
async fn test_fetch_html_with_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", EXPECTED_USER_AGENT))
        .respond_with(html("<html><head><title>Home</title></head></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&crawler_config(), &user_agent()).expect("Failed to build fetcher");
    let body = fetch(&fetcher, &format!("{}/", mock_server.uri()))
        .await
        .expect("Fetch failed");

    assert_eq!(body, b"<html><head><title>Home</title></head></html>".to_vec());
}

#[tokio::test]
async fn test_fetch_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&crawler_config(), &user_agent()).unwrap();

    let result = fetch(&fetcher, &format!("{}/missing", mock_server.uri())).await;
    assert!(matches!(result, Err(FetchError::Status(404))));

    let result = fetch(&fetcher, &format!("{}/broken", mock_server.uri())).await;
    assert!(matches!(result, Err(FetchError::Status(503))));
}

#[tokio::test]
async fn test_fetch_rejects_non_html() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"{}".to_vec(), "application/json"))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&crawler_config(), &user_agent()).unwrap();
    let result = fetch(&fetcher, &format!("{}/data.json", mock_server.uri())).await;

    match result {
        Err(FetchError::ContentMismatch(content_type)) => {
            assert!(content_type.starts_with("application/json"))
        }
        other => panic!("expected ContentMismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_rejects_oversized_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/huge"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![b'a'; 4096], "text/html"))
        .mount(&mock_server)
        .await;

    let config = CrawlerConfig {
        max_body_bytes: 1024,
        ..crawler_config()
    };
    let fetcher = HttpFetcher::new(&config, &user_agent()).unwrap();
    let result = fetch(&fetcher, &format!("{}/huge", mock_server.uri())).await;

    assert!(matches!(
        result,
        Err(FetchError::BodyTooLarge { limit: 1024 })
    ));
}

#[tokio::test]
async fn test_fetch_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<p>late</p>").set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let config = CrawlerConfig {
        fetch_timeout_secs: 1,
        ..crawler_config()
    };
    let fetcher = HttpFetcher::new(&config, &user_agent()).unwrap();
    let result = fetch(&fetcher, &format!("{}/slow", mock_server.uri())).await;

    assert!(matches!(result, Err(FetchError::Timeout)));
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r##"<html><head><title>Home</title></head><body>
                <p>Welcome to the rust crawler test site</p>
                <a href="/page1">Page 1</a>
                <a href="/page1#details">Page 1 again</a>
                <a href="page2">Page 2</a>
                <a href="/gone">Gone</a>
                <a href="mailto:someone@example.com">Mail</a>
                <a href="#top">Top</a>
            </body></html>"##,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(
            r#"<html><head><title>Page One</title><style>p { color: red }</style></head>
               <body><p>First page about crawling</p><a href="/">Home</a></body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html(
            r#"<html><body><p>Second page</p><script>trackVisitor()</script><a href="/page1">One</a></body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("crawl.db");
    let storage = Arc::new(SqliteStorage::new(&db_path).expect("Failed to open DB"));
    let fetcher = Arc::new(HttpFetcher::new(&crawler_config(), &user_agent()).unwrap());

    let mut engine = CrawlEngine::new(
        EngineConfig::from(&crawler_config()),
        fetcher,
        storage.clone(),
    );
    engine
        .start(CancellationToken::new(), [format!("{}/", mock_server.uri())])
        .await;

    // Home, page1 and page2 stored; /gone fails; back links all deduplicated
    wait_for(&engine, |s| {
        s.pages_stored == 3 && s.fetch_failures == 1 && s.duplicates_skipped == 3
    })
    .await;
    let summary = engine.stop().await;

    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(summary.store_failures, 0);
    assert_eq!(storage.count_pages().unwrap(), 3);
    assert_eq!(storage.count_titled().unwrap(), 2);

    let home = storage
        .get_page_by_url(&format!("{}/", mock_server.uri()))
        .unwrap()
        .expect("home page stored");
    assert_eq!(home.title, "Home");
    assert!(home.body.contains("Welcome to the rust crawler test site"));

    let page2 = storage
        .get_page_by_url(&format!("{}/page2", mock_server.uri()))
        .unwrap()
        .expect("page2 stored");
    assert_eq!(page2.title, "");
    assert!(page2.body.contains("Second page"));
    assert!(!page2.body.contains("trackVisitor"));

    let hits = storage.search_pages("crawling", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Page One");

    // Mock expectations (each page fetched exactly once) are verified on drop
}

#[tokio::test]
async fn test_recrawl_overwrites_stored_page() {
    let mock_server = MockServer::start().await;
    let url = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<title>Version</title><p>latest text</p>"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("crawl.db");
    let storage = Arc::new(SqliteStorage::new(&db_path).unwrap());

    // Two engines: the visited set does not outlive an engine
    for _ in 0..2 {
        let fetcher = Arc::new(HttpFetcher::new(&crawler_config(), &user_agent()).unwrap());
        let mut engine = CrawlEngine::new(
            EngineConfig::from(&crawler_config()),
            fetcher,
            storage.clone(),
        );
        engine.start(CancellationToken::new(), [url.as_str()]).await;
        let summary = engine.stop().await;
        assert_eq!(summary.pages_stored, 1);
    }

    assert_eq!(storage.count_pages().unwrap(), 1);
    let page = storage.get_page_by_url(&url).unwrap().unwrap();
    assert_eq!(page.title, "Version");
}

#[tokio::test]
async fn test_fetch_page_reports_redirect_target() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new/"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new/"))
        .respond_with(html("<p>moved</p>"))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&crawler_config(), &user_agent()).unwrap();
    let response = fetcher
        .fetch_page(&CancellationToken::new(), &format!("{}/old", mock_server.uri()))
        .await
        .expect("redirect should be followed");

    assert_eq!(response.final_url, format!("{}/new/", mock_server.uri()));
    assert_eq!(response.body, b"<p>moved</p>".to_vec());
}

#[tokio::test]
async fn test_crawl_resolves_links_after_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dir"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/dir/"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dir/"))
        .respond_with(html(r#"<title>Index</title><a href="x">relative</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dir/x"))
        .respond_with(html("<title>X</title>"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(html("<title>Wrong</title>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let storage = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let fetcher = Arc::new(HttpFetcher::new(&crawler_config(), &user_agent()).unwrap());
    let mut engine = CrawlEngine::new(
        EngineConfig::from(&crawler_config()),
        fetcher,
        storage.clone(),
    );

    engine
        .start(CancellationToken::new(), [format!("{}/dir", mock_server.uri())])
        .await;
    wait_for(&engine, |s| s.pages_stored == 2).await;
    let summary = engine.stop().await;

    assert_eq!(summary.fetch_failures, 0);
    let index = storage
        .get_page_by_url(&format!("{}/dir", mock_server.uri()))
        .unwrap()
        .expect("redirected page stored under the requested URL");
    assert_eq!(index.title, "Index");
    assert!(storage
        .get_page_by_url(&format!("{}/dir/x", mock_server.uri()))
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_cancel_interrupts_slow_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>slow</p>").set_delay(Duration::from_secs(4)))
        .mount(&mock_server)
        .await;

    let storage = Arc::new(SqliteStorage::new_in_memory().unwrap());
    let fetcher = Arc::new(HttpFetcher::new(&crawler_config(), &user_agent()).unwrap());
    let mut engine = CrawlEngine::new(
        EngineConfig::from(&crawler_config()),
        fetcher,
        storage.clone(),
    );
    let cancel = CancellationToken::new();

    engine
        .start(cancel.clone(), [format!("{}/", mock_server.uri())])
        .await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    cancel.cancel();
    let summary = tokio::time::timeout(Duration::from_secs(2), engine.stop())
        .await
        .expect("stop should not wait for the slow response");

    assert_eq!(summary.pages_fetched, 0);
    assert_eq!(storage.count_pages().unwrap(), 0);
}
