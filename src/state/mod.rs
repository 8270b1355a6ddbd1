//! State module for tracking scrape progress
//!
//! - `PageOutcome`: how a single page attempt ended

mod page_outcome;

pub use page_outcome::PageOutcome;
