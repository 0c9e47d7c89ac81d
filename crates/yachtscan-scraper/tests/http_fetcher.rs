//! Integration tests for `HttpFetcher` and `ExtractionSession` over HTTP.
//!
//! Uses `wiremock` to stand up a local server per test so no real network
//! traffic is made.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use yachtscan_core::ExtractionConfig;
use yachtscan_scraper::fetch::BROWSER_FALLBACK_UA;
use yachtscan_scraper::{ExtractionSession, HttpFetcher, ScraperError};

const TEST_UA: &str = "yachtscan-test/0.1";

fn test_fetcher() -> HttpFetcher {
    HttpFetcher::new(5, TEST_UA).expect("failed to build test HttpFetcher")
}

fn inventory_html(titles: &[&str]) -> String {
    let cards: String = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            format!(
                r#"<div class="yacht-listing"><h3><a href="/yacht/{i}">{title}</a></h3>
                   <div class="price">$4{i}5,000</div><img src="/img/{i}.jpg"></div>"#
            )
        })
        .collect();
    format!("<html><body><h1>Yachts for sale</h1><p>boat marina brokerage</p>{cards}</body></html>")
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_returns_body_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory"))
        .and(header("user-agent", TEST_UA))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>boats</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let body = test_fetcher()
        .fetch_html(&format!("{}/inventory", server.uri()))
        .await
        .expect("fetch should succeed");
    assert_eq!(body, "<html>boats</html>");
}

#[tokio::test]
async fn fetch_retries_with_browser_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory"))
        .and(header("user-agent", TEST_UA))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/inventory"))
        .and(header("user-agent", BROWSER_FALLBACK_UA))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>yachts</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let body = test_fetcher()
        .fetch_html(&format!("{}/inventory", server.uri()))
        .await
        .expect("fallback user agent should succeed");
    assert_eq!(body, "<html>yachts</html>");
}

#[tokio::test]
async fn fetch_reports_status_when_every_attempt_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let result = test_fetcher()
        .fetch_html(&format!("{}/inventory", server.uri()))
        .await;
    assert!(
        matches!(result, Err(ScraperError::UnexpectedStatus { status: 503, .. })),
        "expected UnexpectedStatus(503), got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_rejects_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blank"))
        .respond_with(ResponseTemplate::new(200).set_body_string("   \n"))
        .mount(&server)
        .await;

    let result = test_fetcher()
        .fetch_html(&format!("{}/blank", server.uri()))
        .await;
    assert!(
        matches!(result, Err(ScraperError::EmptyBody { .. })),
        "expected EmptyBody, got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_rejects_invalid_url_without_network() {
    let result = test_fetcher().fetch_html("mailto:sales@broker.example.com").await;
    assert!(
        matches!(result, Err(ScraperError::InvalidUrl { .. })),
        "expected InvalidUrl, got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// ExtractionSession over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn session_pools_pages_and_skips_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(inventory_html(&["Fleming 55 pilothouse", "Nordhavn 60"])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/inventory/page/2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(inventory_html(&["Fleming 55 pilothouse"])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/inventory/page/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut session = ExtractionSession::new(test_fetcher(), ExtractionConfig::default());
    let start = format!("{}/inventory", server.uri());
    let discovered = vec![
        format!("{}/inventory/page/2", server.uri()),
        format!("{}/inventory/page/3", server.uri()),
    ];

    let outcome = session.run(&start, &discovered).await;

    assert_eq!(outcome.error, None);
    assert_eq!(outcome.pages_processed, 2);
    assert_eq!(outcome.failed_pages, vec![discovered[1].clone()]);
    // Page two repeats the first listing under the same detail URL.
    assert_eq!(outcome.total_found, 2);
    assert_eq!(
        session.last_report().map(|r| r.source_url.as_str()),
        Some(discovered[0].as_str())
    );
}

#[tokio::test]
async fn session_reports_failed_initial_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut session = ExtractionSession::new(test_fetcher(), ExtractionConfig::default());
    let outcome = session
        .run(&format!("{}/inventory", server.uri()), &[])
        .await;

    let error = outcome.error.expect("initial failure must be reported");
    assert!(error.contains("404"), "{error}");
    assert!(outcome.records.is_empty());
}
