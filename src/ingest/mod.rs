// src/ingest/mod.rs
use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use std::{fs, path::Path};
use tracing::debug;

pub mod decode;

use decode::decode_with;

/// A decoded tabular file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column names from the first row.
    pub headers: Vec<String>,
    /// Data rows, each padded to `headers.len()`.
    pub rows: Vec<Vec<String>>,
}

/// Parse CSV text permissively: records longer than the header (or otherwise
/// unreadable) are skipped, shorter ones are padded with empty fields.
pub fn parse_csv(text: &str) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        bail!("empty header row");
    }

    let width = headers.len();
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = match result {
            Ok(record) if record.len() <= width => record,
            _ => {
                skipped += 1;
                continue;
            }
        };
        let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        row.resize(width, String::new());
        rows.push(row);
    }
    if skipped > 0 {
        debug!(skipped, "skipped malformed rows");
    }

    Ok(RawTable { headers, rows })
}

/// Read a CSV file trying each encoding in turn. Returns the table and the
/// encoding label that produced it.
#[tracing::instrument(level = "debug", skip(path, encodings), fields(path = %path.as_ref().display()))]
pub fn read_table<P: AsRef<Path>>(path: P, encodings: &[String]) -> Result<(RawTable, String)> {
    let bytes = fs::read(path.as_ref())
        .with_context(|| format!("failed to read {:?}", path.as_ref()))?;
    decode_with(&bytes, encodings, parse_csv)
        .with_context(|| format!("failed to decode {:?}", path.as_ref()))
}
