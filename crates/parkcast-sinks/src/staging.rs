use anyhow::{Context, Result};
use parkcast_core::{RawReading, Timestamp};
use serde_json::Value;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Column order of the staged CSV and the raw table
pub const CSV_HEADER: [&str; 7] = ["timestamp", "parking_id", "name", "free", "total", "lat", "lon"];

/// Run identifier used in artifact names, `YYYYmmdd_HHMMSS`
pub fn run_stamp(at: Timestamp) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

pub fn staged_file_name(stamp: &str) -> String {
    format!("data_{stamp}.csv")
}

/// Object key of the staged CSV in the blob store
pub fn staged_object_key(stamp: &str) -> String {
    format!("raw/{}", staged_file_name(stamp))
}

/// Write `rows` as CSV, header first even when there are no rows
pub fn write_csv<W: Write>(writer: W, rows: &[RawReading]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Parse CSV produced by [`write_csv`]
pub fn read_csv(bytes: &[u8]) -> Result<Vec<RawReading>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<RawReading>, _>>()
        .context("Malformed staged CSV")?;
    Ok(rows)
}

/// Write the staged CSV to `<dir>/data_<stamp>.csv`
pub fn stage_readings<P: AsRef<Path>>(dir: P, stamp: &str, rows: &[RawReading]) -> Result<PathBuf> {
    let dir = dir.as_ref();
    create_dir_all(dir)?;
    let path = dir.join(staged_file_name(stamp));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(file, rows)?;
    debug!(path = %path.display(), rows = rows.len(), "staged readings");
    Ok(path)
}

/// Keep the upstream document as received, for runs that produced no rows
pub fn dump_raw<P: AsRef<Path>>(dir: P, stamp: &str, document: &Value) -> Result<PathBuf> {
    let dir = dir.as_ref();
    create_dir_all(dir)?;
    let path = dir.join(format!("raw_{stamp}.json"));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, document)?;
    Ok(path)
}
