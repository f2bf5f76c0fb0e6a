//! Tests for the reqwest fetcher and fetch retries against a mock server

use mockito::Server;
use std::time::Duration;

use schemascrape::crawl_engine::{CrawlRateLimiter, PageTask, RetryPolicy, fetch_page};
use schemascrape::{DiscoveryConfig, FetchStatus, Fetcher, HttpFetcher, discover};

fn fetcher() -> HttpFetcher {
    HttpFetcher::new("SchemaScrapeTest/1.0", Duration::from_secs(5)).unwrap()
}

fn unlimited() -> CrawlRateLimiter {
    CrawlRateLimiter::from_millis(0)
}

fn task(url: String) -> PageTask {
    PageTask {
        url,
        depth: 1,
        origin_domain: "127.0.0.1".into(),
        sequence: 4,
    }
}

#[tokio::test]
async fn test_fetch_returns_status_body_and_content_type() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/page")
        .match_header("user-agent", "SchemaScrapeTest/1.0")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body("<html><body>hi</body></html>")
        .create_async()
        .await;

    let response = fetcher().fetch(&format!("{}/page", server.url())).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, 200);
    assert!(response.is_html());
    assert!(response.body.contains("hi"));
}

#[tokio::test]
async fn test_server_errors_are_retried_then_recorded() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/flaky")
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let retry = RetryPolicy {
        max_retries: 2,
        backoff_ms: 1,
    };
    let url = format!("{}/flaky", server.url());
    let record = fetch_page(&fetcher(), &unlimited(), &task(url), retry).await;

    mock.assert_async().await;
    assert_eq!(record.status, FetchStatus::HttpError { status: 503 });
    assert!(record.markup.is_empty());
    assert_eq!(record.sequence, 4);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let retry = RetryPolicy {
        max_retries: 3,
        backoff_ms: 1,
    };
    let url = format!("{}/missing", server.url());
    let record = fetch_page(&fetcher(), &unlimited(), &task(url), retry).await;

    mock.assert_async().await;
    assert_eq!(record.status, FetchStatus::HttpError { status: 404 });
}

#[tokio::test]
async fn test_non_html_is_unsupported() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/file.pdf")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body("%PDF-1.4")
        .create_async()
        .await;

    let retry = RetryPolicy {
        max_retries: 0,
        backoff_ms: 1,
    };
    let url = format!("{}/file.pdf", server.url());
    let record = fetch_page(&fetcher(), &unlimited(), &task(url), retry).await;
    assert_eq!(
        record.status,
        FetchStatus::UnsupportedContent {
            content_type: "application/pdf".into()
        }
    );
    assert!(record.markup.is_empty());
}

#[tokio::test]
async fn test_discover_over_http() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(
            r#"<html><head><title>Home</title>
               <script type="application/ld+json">{"@type": "WebSite", "name": "Mock"}</script>
               </head><body></body></html>"#,
        )
        .create_async()
        .await;

    let config = DiscoveryConfig::builder()
        .seed_url(format!("{}/", server.url()))
        .max_depth(0)
        .per_domain_interval_ms(0)
        .build()
        .unwrap();
    let report = discover(config).await.unwrap();

    assert!(!report.cancelled);
    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.documents[0].document["name"], "Mock");
}
