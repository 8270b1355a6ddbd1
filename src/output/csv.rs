//! CSV export
//!
//! One row per record. The header row is the first record's field names;
//! later records are written against that header, with missing fields left
//! empty. Lists and nested records are embedded as JSON strings.

use crate::extract::Record;
use crate::HarvestError;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes `records` to `path` as CSV
///
/// An empty slice writes nothing and is not an error.
pub fn write_csv(records: &[Record], path: &Path) -> Result<(), HarvestError> {
    let Some(first) = records.first() else {
        tracing::warn!("No data to save to {}", path.display());
        return Ok(());
    };

    let header: Vec<String> = first.keys().map(str::to_string).collect();

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_records(&mut writer, &header, records)?;
    writer.flush()?;

    tracing::info!("Saved {} record(s) to {}", records.len(), path.display());
    Ok(())
}

/// Renders records as CSV text
pub fn to_csv_string(records: &[Record]) -> String {
    let Some(first) = records.first() else {
        return String::new();
    };
    let header: Vec<String> = first.keys().map(str::to_string).collect();

    let mut buf: Vec<u8> = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_records(&mut buf, &header, records);
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_records<W: Write>(mut w: W, header: &[String], records: &[Record]) -> io::Result<()> {
    write_row(&mut w, header)?;
    for record in records {
        let row: Vec<String> = header
            .iter()
            .map(|name| record.get(name).map(|v| v.to_cell()).unwrap_or_default())
            .collect();
        write_row(&mut w, &row)?;
    }
    Ok(())
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Writes a single CSV row, quoting cells that need it
fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    write!(w, "\r\n")
}
