use std::time::Duration;
use sumi_harvest::config::FetcherConfig;
use sumi_harvest::{Fetcher, Scraper, SelectorConfig, SelectorSpec};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fields used by most tests: every `h1` and the page metadata
pub fn title_fields() -> SelectorConfig {
    SelectorConfig::new()
        .with_field("title", SelectorSpec::text_list("h1").unwrap())
        .unwrap()
}

/// A scraper with no politeness layers and no page delay
pub fn bare_scraper(fields: SelectorConfig) -> Scraper {
    let fetcher = Fetcher::new(&FetcherConfig::default()).unwrap();
    Scraper::new(fetcher, fields).with_page_delay(Duration::ZERO)
}

/// Serves `body` with status 200 at `route`
pub async fn serve_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

/// Builds a minimal page with a heading and optional extra body markup
pub fn page(title: &str, extra: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><h1>{}</h1>{}</body></html>",
        title, title, extra
    )
}

/// Number of requests the server saw for `route`
pub async fn hits(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}
