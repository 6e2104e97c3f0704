use once_cell::sync::Lazy;
use regex::Regex;
use std::{fs, path::Path};
use tracing::{debug, error, info};

use super::{is_header_token, CanonicalEntry, TaxonomyTable};
use crate::ingest::decode::decode_with;

/// `| 0101 | restaurant, | 餐饮服务 |` with optional trailing commas in the two
/// name cells and arbitrary whitespace around every cell.
static TABLE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|\s*(\d{4})\s*\|\s*([a-zA-Z][a-zA-Z0-9_]*)\s*,?\s*\|\s*([^,|\n]+?)\s*,?\s*\|")
        .expect("table row pattern")
});

/// Four decimal digits in any script, e.g. `0101` or `０１０１`.
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("code pattern"));

const SAMPLE_LOG_ENTRIES: usize = 5;

/// Pass A: rows in the pipe-delimited table layout.
pub fn extract_table_rows(text: &str) -> Vec<CanonicalEntry> {
    TABLE_ROW
        .captures_iter(text)
        .filter_map(|caps| {
            let code = caps[1].trim();
            let short_name = caps[2].trim();
            let display_name = caps[3].trim();
            if display_name.is_empty() || is_header_token(display_name) {
                return None;
            }
            debug!(display_name, code, short_name, "table row");
            Some(CanonicalEntry::new(code, short_name, display_name))
        })
        .collect()
}

/// Pass B: plain `code,short,display,...` lines. Lines starting with the pass A
/// delimiter are left to pass A.
pub fn extract_flat_rows(text: &str) -> Vec<CanonicalEntry> {
    text.lines()
        .filter(|line| line.contains(',') && !line.starts_with('|'))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            if parts.len() < 3 {
                return None;
            }
            let code = parts[0];
            if !CODE.is_match(code) {
                return None;
            }
            let display_name = parts[2];
            if display_name.is_empty() || is_header_token(display_name) {
                return None;
            }
            debug!(display_name, code, short_name = parts[1], "flat row");
            Some(CanonicalEntry::new(code, parts[1], display_name))
        })
        .collect()
}

/// Build a table from a decoded definition document. Pass B is merged after
/// pass A and overwrites pass A entries with the same display name.
pub fn load(text: &str) -> TaxonomyTable {
    let mut table = TaxonomyTable::new();
    table.extend(extract_table_rows(text));
    table.extend(extract_flat_rows(text));

    info!("loaded {} taxonomy entries", table.len());
    for entry in table.iter().take(SAMPLE_LOG_ENTRIES) {
        info!(
            "  {} -> {} ({})",
            entry.display_name, entry.code, entry.short_name
        );
    }
    table
}

/// Read, decode and load a definition file. Any read or decode failure yields an
/// empty table; the caller decides whether that is fatal.
#[tracing::instrument(level = "info", skip(path, encodings), fields(path = %path.as_ref().display()))]
pub fn load_file<P: AsRef<Path>>(path: P, encodings: &[String]) -> TaxonomyTable {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("cannot read taxonomy file {}: {}", path.display(), e);
            return TaxonomyTable::new();
        }
    };

    match decode_with(&bytes, encodings, |text| Ok(load(text))) {
        Ok((table, encoding)) => {
            debug!(encoding = %encoding, "decoded taxonomy file");
            table
        }
        Err(e) => {
            error!("cannot decode taxonomy file {}: {:#}", path.display(), e);
            TaxonomyTable::new()
        }
    }
}
