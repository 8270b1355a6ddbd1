//! Whole jobs driven by TOML configuration, through to exported files

use crate::common::{page, serve_html};
use sumi_harvest::config::parse_config;
use sumi_harvest::crawler::run_job;
use sumi_harvest::output::{read_json, to_csv_string, write_json};
use sumi_harvest::{FieldValue, PageOutcome, Record};
use tempfile::tempdir;
use wiremock::MockServer;

fn paginate_job(base: &str) -> String {
    format!(
        r#"
[fetcher]
user-agent = "HarvestTest/1.0"
timeout-secs = 5

[politeness]
page-delay-ms = 0

[job]
mode = "paginate"
start-url = "{base}/quotes/1"
next-selector = "li.next a"
max-pages = 5

[[field]]
name = "quotes"
mode = "text-list"
selector = ".quote .text"

[[field]]
name = "people"
mode = "nested-record-list"
parent = ".quote"
children = [
  {{ name = "author", selector = ".author" }},
  {{ name = "tags", selector = ".tag" }},
]

[[field]]
name = "meta"
mode = "metadata"
"#
    )
}

async fn serve_quotes(server: &MockServer) {
    serve_html(
        server,
        "/quotes/1",
        r#"<html><head><title>Quotes 1</title><meta name="description" content="First"></head><body>
            <div class="quote"><span class="text">Be curious.</span><small class="author">Ada</small>
              <a class="tag">science</a><a class="tag">wonder</a></div>
            <div class="quote"><span class="text">Measure twice.</span><small class="author">Grace</small>
              <a class="tag">craft</a></div>
            <ul><li class="next"><a href="/quotes/2">Next</a></li></ul>
        </body></html>"#,
    )
    .await;
    serve_html(
        server,
        "/quotes/2",
        r#"<html><head><title>Quotes 2</title></head><body>
            <div class="quote"><span class="text">Ship it.</span><small class="author">Linus</small></div>
        </body></html>"#,
    )
    .await;
}

#[tokio::test]
async fn test_paginate_job_end_to_end() {
    let server = MockServer::start().await;
    serve_quotes(&server).await;

    let config = parse_config(&paginate_job(&server.uri())).unwrap();
    let (pages, stats) = run_job(&config).await.unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(stats.count(PageOutcome::Scraped), 2);

    let first = pages[0].to_record();
    assert_eq!(
        first.keys().collect::<Vec<_>>(),
        vec!["page", "url", "quotes", "people", "meta"]
    );
    assert_eq!(
        first.get("quotes"),
        Some(&FieldValue::text_list(["Be curious.", "Measure twice."]))
    );

    let people = first.get("people").and_then(|v| v.as_list()).unwrap();
    let ada = people[0].as_map().unwrap();
    assert_eq!(ada.get("tags"), Some(&FieldValue::text_list(["science", "wonder"])));
    let grace = people[1].as_map().unwrap();
    assert_eq!(grace.get("tags"), Some(&FieldValue::text("craft")));

    let second = pages[1].to_record();
    let linus = second
        .get("people")
        .and_then(|v| v.as_list())
        .and_then(|list| list[0].as_map())
        .unwrap();
    // No tags: the field is still present
    assert_eq!(linus.get("tags"), Some(&FieldValue::text("")));

    let meta = first.get("meta").and_then(|v| v.as_map()).unwrap();
    assert_eq!(meta.get("title"), Some(&FieldValue::text("Quotes 1")));
    assert_eq!(meta.get("description"), Some(&FieldValue::text("First")));
}

#[tokio::test]
async fn test_exported_json_round_trips() {
    let server = MockServer::start().await;
    serve_quotes(&server).await;

    let config = parse_config(&paginate_job(&server.uri())).unwrap();
    let (pages, _) = run_job(&config).await.unwrap();
    let records: Vec<Record> = pages.iter().map(|p| p.to_record()).collect();

    let dir = tempdir().unwrap();
    let path = dir.path().join("quotes.json");
    write_json(&records, &path).unwrap();

    assert_eq!(read_json(&path).unwrap(), records);
}

#[tokio::test]
async fn test_csv_embeds_lists_as_json() {
    let server = MockServer::start().await;
    serve_quotes(&server).await;

    let config = parse_config(&paginate_job(&server.uri())).unwrap();
    let (pages, _) = run_job(&config).await.unwrap();
    let records: Vec<Record> = pages.iter().map(|p| p.to_record()).collect();

    let csv = to_csv_string(&records);
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("page,url,quotes,people,meta"));
    let row = lines.next().unwrap();
    assert!(row.starts_with(&format!("1,{}/quotes/1,", server.uri())));
    assert!(row.contains(r#""[""Be curious."",""Measure twice.""]""#));
}

#[tokio::test]
async fn test_pages_job_with_robots() {
    let server = MockServer::start().await;
    serve_html(&server, "/robots.txt", "User-agent: HarvestTest\nDisallow: /admin\n").await;
    serve_html(&server, "/home", &page("Home", "")).await;
    serve_html(&server, "/admin", &page("Admin", "")).await;

    let config = parse_config(&format!(
        r#"
[fetcher]
user-agent = "HarvestTest/1.0"

[politeness]
page-delay-ms = 0

[cache]
max-age-secs = 60

[job]
mode = "pages"
urls = ["{base}/home", "{base}/admin", "{base}/home"]

[[field]]
name = "title"
mode = "text-list"
selector = "h1"
"#,
        base = server.uri()
    ))
    .unwrap();

    let (pages, stats) = run_job(&config).await.unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(stats.count(PageOutcome::Scraped), 1);
    assert_eq!(stats.count(PageOutcome::Cached), 1);
    assert_eq!(stats.count(PageOutcome::RobotsDenied), 1);
}
