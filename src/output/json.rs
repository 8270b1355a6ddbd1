//! JSON export and import
//!
//! Records are written as a pretty-printed JSON array. Field order within each
//! record is preserved, so reading the file back yields equal records.

use crate::extract::Record;
use crate::HarvestError;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Writes `records` to `path` as a pretty-printed JSON array
///
/// # Returns
///
/// * `Ok(())` - The file was written
/// * `Err(HarvestError)` - The file could not be created or written
pub fn write_json(records: &[Record], path: &Path) -> Result<(), HarvestError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!("Saved {} record(s) to {}", records.len(), path.display());
    Ok(())
}

/// Reads a JSON array of records written by [`write_json`]
pub fn read_json(path: &Path) -> Result<Vec<Record>, HarvestError> {
    let file = File::open(path)?;
    let records = serde_json::from_reader(BufReader::new(file))?;
    Ok(records)
}
