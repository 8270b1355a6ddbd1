//! Parsed HTML documents
//!
//! A [`Document`] pairs the parsed HTML tree with the URL it was fetched from,
//! so relative links and image sources can be resolved during extraction.

use crate::url::{resolve_href, resolve_link};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// An immutable parsed page
pub struct Document {
    html: Html,
    url: Url,
}

impl Document {
    /// Parses an HTML body fetched from `url`
    ///
    /// HTML parsing is error-tolerant; malformed markup still yields a tree.
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_harvest::crawler::Document;
    /// use url::Url;
    ///
    /// let html = r#"<html><head><title>Test</title></head><body></body></html>"#;
    /// let doc = Document::parse(html, Url::parse("https://example.com/").unwrap());
    /// assert_eq!(doc.title(), Some("Test".to_string()));
    /// ```
    pub fn parse(body: &str, url: Url) -> Self {
        Self {
            html: Html::parse_document(body),
            url,
        }
    }

    /// The URL the document was fetched from (after redirects)
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// All elements matching `selector`, in document order
    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html.select(selector)
    }

    /// The first element matching `selector`
    pub fn select_first<'a>(&'a self, selector: &'a Selector) -> Option<ElementRef<'a>> {
        self.html.select(selector).next()
    }

    /// Extracts the page title from the `<title>` tag
    pub fn title(&self) -> Option<String> {
        let title_selector = Selector::parse("title").ok()?;

        self.html
            .select(&title_selector)
            .next()
            .map(|element| element_text(&element))
            .filter(|s| !s.is_empty())
    }

    /// Resolves an attribute value (href, src) against the document URL
    pub fn resolve(&self, href: &str) -> Option<String> {
        resolve_href(href, &self.url)
    }

    /// Resolves a navigation link, rejecting non-HTTP targets
    pub fn resolve_link(&self, href: &str) -> Option<String> {
        resolve_link(href, &self.url)
    }
}

/// Returns the element's text content with whitespace collapsed and trimmed
pub fn element_text(element: &ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
