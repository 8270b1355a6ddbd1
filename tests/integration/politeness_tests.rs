//! robots.txt, retry, cache and rate limiting around real requests

use crate::common::{bare_scraper, hits, page, serve_html, title_fields};
use reqwest::Client;
use std::time::{Duration, Instant};
use sumi_harvest::{
    Fetcher, HarvestError, PageCache, PageOutcome, RateLimiter, RetryPolicy, RobotsPolicy,
    RobotsPrecedence,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_robots_disallow_skips_page() {
    let server = MockServer::start().await;
    serve_html(&server, "/robots.txt", "User-agent: *\nDisallow: /private\n").await;
    serve_html(&server, "/public", &page("Public", "")).await;
    serve_html(&server, "/private/x", &page("Secret", "")).await;

    let mut scraper = bare_scraper(title_fields())
        .with_robots(RobotsPolicy::new("TestBot", RobotsPrecedence::FirstMatch));

    let urls = vec![
        format!("{}/private/x", server.uri()),
        format!("{}/public", server.uri()),
    ];
    let pages = scraper.scrape_pages(&urls).await;

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].url, urls[1]);
    assert_eq!(hits(&server, "/private/x").await, 0);
    // Fetched once per site
    assert_eq!(hits(&server, "/robots.txt").await, 1);
    assert_eq!(scraper.stats().count(PageOutcome::RobotsDenied), 1);
}

#[tokio::test]
async fn test_robots_allow_overrides_matching_disallow() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/robots.txt",
        "User-agent: *\nDisallow: /docs\nAllow: /docs/public\n",
    )
    .await;
    serve_html(&server, "/docs/public/intro", &page("Intro", "")).await;

    let mut scraper = bare_scraper(title_fields())
        .with_robots(RobotsPolicy::new("TestBot", RobotsPrecedence::FirstMatch));

    let scraped = scraper
        .scrape_page(&format!("{}/docs/public/intro", server.uri()))
        .await;
    assert!(scraped.is_some());

    let denied = scraper
        .scrape_page(&format!("{}/docs/private", server.uri()))
        .await;
    assert!(denied.is_none());
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let server = MockServer::start().await;
    serve_html(&server, "/anything", &page("Anything", "")).await;

    let mut scraper = bare_scraper(title_fields())
        .with_robots(RobotsPolicy::new("TestBot", RobotsPrecedence::FirstMatch));

    assert!(scraper
        .scrape_page(&format!("{}/anything", server.uri()))
        .await
        .is_some());
}

#[tokio::test]
async fn test_retry_recovers_from_transient_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    serve_html(&server, "/flaky", &page("Recovered", "")).await;

    let mut scraper = bare_scraper(title_fields())
        .with_retry(RetryPolicy::new(3, Duration::from_millis(5), 2.0));

    let scraped = scraper
        .scrape_page(&format!("{}/flaky", server.uri()))
        .await;

    assert!(scraped.is_some());
    assert_eq!(hits(&server, "/flaky").await, 3);
    assert_eq!(scraper.stats().count(PageOutcome::Scraped), 1);
}

#[tokio::test]
async fn test_retry_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let mut scraper = bare_scraper(title_fields())
        .with_retry(RetryPolicy::new(3, Duration::from_millis(5), 2.0));

    assert!(scraper
        .scrape_page(&format!("{}/down", server.uri()))
        .await
        .is_none());
    assert_eq!(hits(&server, "/down").await, 3);
    assert_eq!(scraper.stats().count(PageOutcome::HttpFailure), 1);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut scraper = bare_scraper(title_fields())
        .with_retry(RetryPolicy::new(5, Duration::from_millis(5), 2.0));

    assert!(scraper
        .scrape_page(&format!("{}/gone", server.uri()))
        .await
        .is_none());
    assert_eq!(hits(&server, "/gone").await, 1);
}

#[tokio::test]
async fn test_cache_serves_repeat_requests() {
    let server = MockServer::start().await;
    serve_html(&server, "/cached", &page("Cached", "")).await;

    let mut scraper = bare_scraper(title_fields())
        .with_cache(PageCache::new(16, Duration::from_secs(3600)));

    let url = format!("{}/cached", server.uri());
    let first = scraper.scrape_page(&url).await.unwrap();
    let second = scraper
        .scrape_page(&format!("{}#section", url))
        .await
        .unwrap();

    assert_eq!(first.fields, second.fields);
    assert_eq!(hits(&server, "/cached").await, 1);
    assert_eq!(scraper.stats().count(PageOutcome::Cached), 1);
    assert_eq!(scraper.cache().map(|c| c.len()), Some(1));
}

#[tokio::test]
async fn test_rate_limiter_spaces_requests() {
    let server = MockServer::start().await;
    serve_html(&server, "/r", &page("Limited", "")).await;

    let mut scraper = bare_scraper(title_fields()).with_rate_limiter(RateLimiter::new(10.0));
    let urls: Vec<String> = (0..3).map(|i| format!("{}/r?n={}", server.uri(), i)).collect();

    let start = Instant::now();
    let pages = scraper.scrape_pages(&urls).await;

    assert_eq!(pages.len(), 3);
    assert!(start.elapsed() >= Duration::from_millis(200), "elapsed {:?}", start.elapsed());
}

#[tokio::test]
async fn test_crawl_delay_extends_page_delay() {
    let server = MockServer::start().await;
    serve_html(&server, "/robots.txt", "User-agent: *\nCrawl-delay: 0.2\n").await;
    serve_html(&server, "/one", &page("One", "")).await;
    serve_html(&server, "/two", &page("Two", "")).await;

    let mut scraper = bare_scraper(title_fields())
        .with_robots(RobotsPolicy::new("TestBot", RobotsPrecedence::FirstMatch));

    let urls = vec![format!("{}/one", server.uri()), format!("{}/two", server.uri())];
    let start = Instant::now();
    let pages = scraper.scrape_pages(&urls).await;

    assert_eq!(pages.len(), 2);
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_huge_crawl_delay_is_ignored() {
    let server = MockServer::start().await;
    serve_html(&server, "/robots.txt", "User-agent: *\nCrawl-delay: 1e20\n").await;
    serve_html(&server, "/one", &page("One", "")).await;
    serve_html(&server, "/two", &page("Two", "")).await;

    let mut scraper = bare_scraper(title_fields())
        .with_robots(RobotsPolicy::new("TestBot", RobotsPrecedence::FirstMatch));

    let urls = vec![format!("{}/one", server.uri()), format!("{}/two", server.uri())];
    let start = Instant::now();
    let pages = scraper.scrape_pages(&urls).await;

    assert_eq!(pages.len(), 2);
    assert!(start.elapsed() < Duration::from_secs(5), "elapsed {:?}", start.elapsed());
}

#[tokio::test]
async fn test_fetch_timeout_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let fetcher = Fetcher::with_client(Client::new(), Duration::from_millis(200));
    let err = fetcher
        .fetch_page(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::Timeout { .. }));
    assert_eq!(PageOutcome::from_error(&err), PageOutcome::NetworkFailure);
}

#[tokio::test]
async fn test_fetch_reports_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/teapot"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&server)
        .await;

    let fetcher = Fetcher::with_client(Client::new(), Duration::from_secs(5));
    let err = fetcher
        .fetch_page(&format!("{}/teapot", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::HttpStatus { status: 418, .. }));
}
