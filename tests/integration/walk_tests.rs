//! Multi-page, pagination and list/detail walks

use crate::common::{bare_scraper, hits, page, serve_html, title_fields};
use sumi_harvest::{CssSelector, FieldValue, PageOutcome, SelectorConfig, SelectorSpec};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_scrape_pages_skips_failures_and_keeps_order() {
    let server = MockServer::start().await;
    serve_html(&server, "/a", &page("Alpha", "")).await;
    serve_html(&server, "/c", &page("Gamma", "")).await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let base = server.uri();
    let urls = vec![
        format!("{}/a", base),
        format!("{}/b", base),
        format!("{}/c", base),
    ];

    let mut scraper = bare_scraper(title_fields());
    let pages = scraper.scrape_pages(&urls).await;

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].url, urls[0]);
    assert_eq!(pages[1].url, urls[2]);
    assert_eq!(
        pages[0].fields.get("title"),
        Some(&FieldValue::text_list(["Alpha"]))
    );
    assert_eq!(pages[0].page, None);

    let stats = scraper.stats();
    assert_eq!(stats.count(PageOutcome::Scraped), 2);
    assert_eq!(stats.count(PageOutcome::HttpFailure), 1);
}

#[tokio::test]
async fn test_network_failure_is_skipped() {
    let mut scraper = bare_scraper(title_fields());
    // Nothing listens on port 1
    let result = scraper.scrape_page("http://127.0.0.1:1/").await;

    assert!(result.is_none());
    assert_eq!(scraper.stats().count(PageOutcome::NetworkFailure), 1);
}

#[tokio::test]
async fn test_empty_matches_keep_every_field() {
    let server = MockServer::start().await;
    serve_html(&server, "/empty", "<html><body><p>nothing here</p></body></html>").await;

    let fields = SelectorConfig::new()
        .with_field("title", SelectorSpec::text_list("h1").unwrap())
        .unwrap()
        .with_field("links", SelectorSpec::link_list("a.external").unwrap())
        .unwrap()
        .with_field("table", SelectorSpec::table(None).unwrap())
        .unwrap();

    let mut scraper = bare_scraper(fields);
    let scraped = scraper
        .scrape_page(&format!("{}/empty", server.uri()))
        .await
        .unwrap();

    assert_eq!(
        scraped.fields.keys().collect::<Vec<_>>(),
        vec!["title", "links", "table"]
    );
    assert!(scraped.fields.iter().all(|(_, value)| value.is_empty()));
}

#[tokio::test]
async fn test_paginate_follows_next_links() {
    let server = MockServer::start().await;
    serve_html(&server, "/page/1", &page("One", r#"<li class="next"><a href="/page/2">Next</a></li>"#)).await;
    serve_html(&server, "/page/2", &page("Two", r#"<li class="next"><a href="3">Next</a></li>"#)).await;
    serve_html(&server, "/page/3", &page("Three", "")).await;

    let next = CssSelector::parse("li.next a").unwrap();
    let mut scraper = bare_scraper(title_fields());
    let pages = scraper
        .paginate(&format!("{}/page/1", server.uri()), &next, 5)
        .await;

    assert_eq!(pages.len(), 3);
    let indices: Vec<_> = pages.iter().map(|p| p.page).collect();
    assert_eq!(indices, vec![Some(1), Some(2), Some(3)]);
    assert_eq!(pages[2].url, format!("{}/page/3", server.uri()));
    assert_eq!(
        pages[1].fields.get("title"),
        Some(&FieldValue::text_list(["Two"]))
    );
}

#[tokio::test]
async fn test_paginate_respects_page_ceiling() {
    let server = MockServer::start().await;
    serve_html(&server, "/page/1", &page("One", r#"<a class="next" href="/page/2">Next</a>"#)).await;
    serve_html(&server, "/page/2", &page("Two", r#"<a class="next" href="/page/3">Next</a>"#)).await;
    serve_html(&server, "/page/3", &page("Three", "")).await;

    let next = CssSelector::parse("a.next").unwrap();
    let mut scraper = bare_scraper(title_fields());
    let pages = scraper
        .paginate(&format!("{}/page/1", server.uri()), &next, 2)
        .await;

    assert_eq!(pages.len(), 2);
    assert_eq!(hits(&server, "/page/3").await, 0);
}

#[tokio::test]
async fn test_paginate_stops_on_self_link() {
    let server = MockServer::start().await;
    serve_html(&server, "/loop", &page("Loop", r#"<a class="next" href="/loop">Again</a>"#)).await;

    let next = CssSelector::parse("a.next").unwrap();
    let mut scraper = bare_scraper(title_fields());
    let pages = scraper
        .paginate(&format!("{}/loop", server.uri()), &next, 10)
        .await;

    assert_eq!(pages.len(), 1);
    assert_eq!(hits(&server, "/loop").await, 1);
}

#[tokio::test]
async fn test_paginate_stops_on_fragment_link_to_same_page() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/results",
        &page("Results", r##"<a class="next" href="#more">More</a>"##),
    )
    .await;

    let next = CssSelector::parse("a.next").unwrap();
    let mut scraper = bare_scraper(title_fields());
    let pages = scraper
        .paginate(&format!("{}/results", server.uri()), &next, 10)
        .await;

    assert_eq!(pages.len(), 1);
    assert_eq!(hits(&server, "/results").await, 1);
}

#[tokio::test]
async fn test_paginate_stops_when_page_fails() {
    let server = MockServer::start().await;
    serve_html(&server, "/page/1", &page("One", r#"<a class="next" href="/page/2">Next</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/page/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let next = CssSelector::parse("a.next").unwrap();
    let mut scraper = bare_scraper(title_fields());
    let pages = scraper
        .paginate(&format!("{}/page/1", server.uri()), &next, 5)
        .await;

    assert_eq!(pages.len(), 1);
    assert_eq!(scraper.stats().count(PageOutcome::HttpFailure), 1);
}

#[tokio::test]
async fn test_list_detail_scrapes_bounded_detail_pages() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/products",
        r#"<html><body>
            <article class="product"><h3><a href="/products/1">First</a></h3></article>
            <article class="product"><h3><a href="/products/2">Second</a></h3></article>
            <article class="product"><h3><a href="/products/3">Third</a></h3></article>
        </body></html>"#,
    )
    .await;
    for (id, name, price) in [(1, "First", "£10"), (2, "Second", "£20"), (3, "Third", "£30")] {
        serve_html(
            &server,
            &format!("/products/{}", id),
            &format!(
                r#"<html><body><h1>{}</h1><p class="price">{}</p></body></html>"#,
                name, price
            ),
        )
        .await;
    }

    let fields = SelectorConfig::new()
        .with_field("name", SelectorSpec::text_list("h1").unwrap())
        .unwrap()
        .with_field("price", SelectorSpec::text_list(".price").unwrap())
        .unwrap();
    let item = CssSelector::parse("article.product").unwrap();
    let link = CssSelector::parse("h3 a").unwrap();

    let mut scraper = bare_scraper(fields);
    let pages = scraper
        .list_detail(&format!("{}/products", server.uri()), &item, &link, 2)
        .await;

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].url, format!("{}/products/1", server.uri()));
    assert_eq!(pages[1].fields.get("price"), Some(&FieldValue::text_list(["£20"])));
    assert_eq!(hits(&server, "/products/3").await, 0);
}

#[tokio::test]
async fn test_list_detail_with_missing_listing_returns_nothing() {
    let server = MockServer::start().await;

    let item = CssSelector::parse(".item").unwrap();
    let link = CssSelector::parse("a").unwrap();
    let mut scraper = bare_scraper(title_fields());
    let pages = scraper
        .list_detail(&format!("{}/missing", server.uri()), &item, &link, 5)
        .await;

    assert!(pages.is_empty());
    assert_eq!(scraper.stats().count(PageOutcome::HttpFailure), 1);
}

#[tokio::test]
async fn test_nested_products_end_to_end() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/shop",
        r#"<html><body>
            <article class="product"><h3><a href="/p/1">Lamp</a></h3><span class="price">£12</span></article>
            <article class="product"><h3><a href="/p/2">Desk</a></h3><span class="price">£90</span></article>
            <article class="product"><h3><a href="/p/3">Chair</a></h3><span class="price">£45</span></article>
        </body></html>"#,
    )
    .await;

    let fields = SelectorConfig::new()
        .with_field(
            "products",
            SelectorSpec::nested("article.product", &[("title", "h3 a"), ("price", ".price")])
                .unwrap(),
        )
        .unwrap();

    let mut scraper = bare_scraper(fields);
    let scraped = scraper
        .scrape_page(&format!("{}/shop", server.uri()))
        .await
        .unwrap();

    let products = scraped.fields.get("products").and_then(|v| v.as_list()).unwrap();
    assert_eq!(products.len(), 3);

    let titles: Vec<_> = products
        .iter()
        .filter_map(|p| p.as_map()?.get("title")?.as_text())
        .collect();
    assert_eq!(titles, vec!["Lamp", "Desk", "Chair"]);

    let last = products[2].as_map().unwrap();
    assert_eq!(last.get("price").and_then(|v| v.as_text()), Some("£45"));
}
