//! Best-effort record extraction
//!
//! Extraction never fails: selectors are compiled up front, and a selector that
//! matches nothing yields an empty string, list or map for its field.

use crate::crawler::{element_text, Document};
use crate::extract::pattern::TextPattern;
use crate::extract::record::{FieldValue, Record};
use crate::extract::selector::{ChildSelector, SelectorConfig, SelectorSpec};
use scraper::{ElementRef, Selector};

/// Applies a selector configuration to a document
///
/// The returned record has exactly one field per configured field, in
/// configuration order.
///
/// # Example
///
/// ```
/// use sumi_harvest::crawler::Document;
/// use sumi_harvest::extract::{extract, FieldValue, SelectorConfig, SelectorSpec};
/// use url::Url;
///
/// let html = r#"<ul><li class="tag">rust</li><li class="tag">web</li></ul>"#;
/// let doc = Document::parse(html, Url::parse("https://example.com/").unwrap());
/// let config = SelectorConfig::new()
///     .with_field("tags", SelectorSpec::text_list(".tag").unwrap())
///     .unwrap();
///
/// let record = extract(&doc, &config);
/// assert_eq!(record.get("tags"), Some(&FieldValue::text_list(["rust", "web"])));
/// ```
pub fn extract(document: &Document, config: &SelectorConfig) -> Record {
    let mut record = Record::new();

    for field in config.fields() {
        let value = match &field.spec {
            SelectorSpec::TextList { selector } => {
                FieldValue::List(extract_text(document, selector.selector()))
            }
            SelectorSpec::LinkList { selector } => {
                FieldValue::List(extract_links(document, selector.selector()))
            }
            SelectorSpec::ImageList { selector } => {
                let images = match selector {
                    Some(sel) => extract_images(document, sel.selector()),
                    None => Selector::parse("img")
                        .map(|sel| extract_images(document, &sel))
                        .unwrap_or_default(),
                };
                FieldValue::List(images)
            }
            SelectorSpec::Table { selector } => {
                let rows = match selector {
                    Some(sel) => extract_table(document, sel.selector()),
                    None => Selector::parse("table")
                        .map(|sel| extract_table(document, &sel))
                        .unwrap_or_default(),
                };
                FieldValue::List(rows)
            }
            SelectorSpec::NestedRecordList { parent, children } => {
                FieldValue::List(extract_nested(document, parent.selector(), children))
            }
            SelectorSpec::Metadata => FieldValue::Map(extract_metadata(document)),
            SelectorSpec::StructuredData => FieldValue::List(extract_structured_data(document)),
            SelectorSpec::PatternList { selector, pattern } => {
                let matches = match selector {
                    Some(sel) => extract_patterns(document, sel.selector(), *pattern),
                    None => Selector::parse("body")
                        .map(|sel| extract_patterns(document, &sel, *pattern))
                        .unwrap_or_default(),
                };
                FieldValue::List(matches)
            }
        };

        tracing::trace!(
            "Field '{}' ({}) extracted {} value(s)",
            field.name,
            field.spec.mode_name(),
            value.as_list().map_or(1, <[FieldValue]>::len)
        );
        record.insert(field.name.clone(), value);
    }

    record
}

/// Text of every matching element, in document order
pub fn extract_text(document: &Document, selector: &Selector) -> Vec<FieldValue> {
    document
        .select(selector)
        .map(|el| FieldValue::Text(element_text(&el)))
        .collect()
}

/// `{text, url}` for every matching element carrying an `href`
pub fn extract_links(document: &Document, selector: &Selector) -> Vec<FieldValue> {
    let mut links = Vec::new();

    for element in document.select(selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(url) = document.resolve(href) else {
            continue;
        };

        let mut link = Record::new();
        link.insert("text", element_text(&element));
        link.insert("url", url);
        links.push(FieldValue::Map(link));
    }

    links
}

/// `{url, alt, title}` for every matching image with a `src` or `data-src`
pub fn extract_images(document: &Document, selector: &Selector) -> Vec<FieldValue> {
    let mut images = Vec::new();

    for element in document.select(selector) {
        let attrs = element.value();
        let Some(src) = attrs.attr("src").or_else(|| attrs.attr("data-src")) else {
            continue;
        };
        let Some(url) = document.resolve(src) else {
            continue;
        };

        let mut image = Record::new();
        image.insert("url", url);
        image.insert("alt", attrs.attr("alt").unwrap_or_default());
        image.insert("title", attrs.attr("title").unwrap_or_default());
        images.push(FieldValue::Map(image));
    }

    images
}

/// Rows of the first matching table
///
/// # Header Rules
///
/// - With a `<thead>`, its cells are the header and every row outside it is data
/// - Without one, the first row is the header and the remaining rows are data
///
/// A data row whose cell count equals the header count becomes a mapping keyed
/// by header; any other non-empty row becomes `{"data": [cells...]}`.
pub fn extract_table(document: &Document, selector: &Selector) -> Vec<FieldValue> {
    let Some(table) = document.select_first(selector) else {
        return Vec::new();
    };

    let (Ok(thead_sel), Ok(row_sel), Ok(cell_sel)) = (
        Selector::parse("thead"),
        Selector::parse("tr"),
        Selector::parse("th, td"),
    ) else {
        return Vec::new();
    };

    let cells_of = |row: ElementRef<'_>| -> Vec<String> {
        row.select(&cell_sel).map(|cell| element_text(&cell)).collect()
    };

    let rows: Vec<ElementRef<'_>> = table.select(&row_sel).collect();

    let (headers, data_rows) = match table.select(&thead_sel).next() {
        Some(thead) => {
            let headers: Vec<String> = thead.select(&cell_sel).map(|c| element_text(&c)).collect();
            let head_rows: Vec<_> = thead.select(&row_sel).map(|r| r.id()).collect();
            let body: Vec<_> = rows
                .into_iter()
                .filter(|r| !head_rows.contains(&r.id()))
                .collect();
            (headers, body)
        }
        None => {
            let mut iter = rows.into_iter();
            let headers = iter.next().map(&cells_of).unwrap_or_default();
            (headers, iter.collect())
        }
    };

    let mut out = Vec::new();
    for row in data_rows {
        let cells = cells_of(row);
        if cells.is_empty() {
            continue;
        }

        if !headers.is_empty() && headers.len() == cells.len() {
            let record: Record = headers.iter().cloned().zip(cells).collect();
            out.push(FieldValue::Map(record));
        } else {
            let mut record = Record::new();
            record.insert("data", FieldValue::text_list(cells));
            out.push(FieldValue::Map(record));
        }
    }

    out
}

/// One record per parent match
///
/// Each child selector is evaluated relative to its parent: exactly one match
/// yields a string, several yield a list, none yields an empty string.
pub fn extract_nested(
    document: &Document,
    parent: &Selector,
    children: &[ChildSelector],
) -> Vec<FieldValue> {
    document
        .select(parent)
        .map(|parent_el| {
            let mut record = Record::new();
            for child in children {
                let mut matches: Vec<String> = parent_el
                    .select(child.selector.selector())
                    .map(|el| element_text(&el))
                    .collect();

                let value = match matches.len() {
                    0 => FieldValue::text(""),
                    1 => FieldValue::Text(matches.remove(0)),
                    _ => FieldValue::text_list(matches),
                };
                record.insert(child.name.clone(), value);
            }
            FieldValue::Map(record)
        })
        .collect()
}

/// Page title plus every `name`/`content` and `property`/`content` meta pair
pub fn extract_metadata(document: &Document) -> Record {
    let mut metadata = Record::new();

    if let Some(title) = document.title() {
        metadata.insert("title", title);
    }

    if let Ok(meta_selector) = Selector::parse("meta") {
        for meta in document.select(&meta_selector) {
            let attrs = meta.value();
            let name = attrs.attr("name").or_else(|| attrs.attr("property"));
            if let (Some(name), Some(content)) = (name, attrs.attr("content")) {
                if !name.is_empty() && !content.is_empty() {
                    metadata.insert(name, content);
                }
            }
        }
    }

    metadata
}

/// Every JSON-LD block on the page
///
/// Blocks that are not valid JSON are skipped.
pub fn extract_structured_data(document: &Document) -> Vec<FieldValue> {
    let Ok(script_sel) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    document
        .select(&script_sel)
        .filter_map(|script| {
            let raw: String = script.text().collect();
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) => Some(FieldValue::from(value)),
                Err(e) => {
                    tracing::debug!("Skipping invalid JSON-LD block: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Pattern matches in the text of every matching element, in document order
pub fn extract_patterns(
    document: &Document,
    selector: &Selector,
    pattern: TextPattern,
) -> Vec<FieldValue> {
    let texts: Vec<String> = document.select(selector).map(|el| element_text(&el)).collect();
    pattern
        .find_in(texts.iter().map(String::as_str))
        .into_iter()
        .map(FieldValue::Text)
        .collect()
}
