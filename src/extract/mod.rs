//! Declarative extraction of records from parsed documents
//!
//! This module contains:
//! - `SelectorSpec`/`SelectorConfig`: which fields to extract and how
//! - `Record`/`FieldValue`: the extracted, ordered result
//! - `TextPattern`: email, phone and date matching for pattern lists
//! - `extract`: the best-effort extractor

mod extractor;
mod pattern;
mod record;
mod selector;

pub use extractor::{
    extract, extract_images, extract_links, extract_metadata, extract_nested, extract_patterns,
    extract_structured_data, extract_table, extract_text,
};
pub use pattern::TextPattern;
pub use record::{FieldValue, Record};
pub use selector::{ChildSelector, CssSelector, FieldSpec, SelectorConfig, SelectorSpec};
