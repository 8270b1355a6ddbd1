//! Output module for exporting records and reporting run statistics
//!
//! This module handles:
//! - Pretty-printed JSON export (and import for round-trip checks)
//! - CSV export with non-scalar fields embedded as JSON
//! - Per-outcome page statistics

mod csv;
mod json;
pub mod stats;

pub use self::csv::{to_csv_string, write_csv};
pub use json::{read_json, write_json};
pub use stats::{print_statistics, HarvestStats};
