// src/enrich/mod.rs
use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, info};

pub mod batch;
pub mod write;

pub use batch::{output_path_for, process_dir, process_file, BatchSummary, FileOutcome};

use crate::{
    config::MapperConfig,
    ingest::RawTable,
    resolve::{resolve_hierarchical, FuzzyCache, ResolutionResult},
    taxonomy::TaxonomyTable,
};

/// Columns appended to every output record, in order.
pub const ENRICHED_COLUMNS: [&str; 4] = ["std_code", "std_name_en", "std_name_zh", "match_score"];

/// Cell values that mean "no value".
const NULL_MARKERS: &[&str] = &[
    "nan", "na", "n/a", "null", "none", "<na>", "#n/a", "-nan", "#na",
];

/// First column whose name contains "type" (any case) or "类型".
pub fn find_category_column(headers: &[String]) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.to_lowercase().contains("type") || h.contains("类型"))
}

/// The label to resolve for a raw cell. Null markers and purely numeric cells
/// become the empty label.
pub fn category_label(cell: &str) -> &str {
    let cell = cell.trim();
    let lowered = cell.to_lowercase();
    if NULL_MARKERS.contains(&lowered.as_str()) || is_numeric_cell(cell) {
        return "";
    }
    cell
}

/// Plain decimal notation only (`42`, `-3.5`, `1e3`); `inf`/`nan` spellings are
/// labels, not numbers.
fn is_numeric_cell(cell: &str) -> bool {
    cell.chars().any(|c| c.is_ascii_digit())
        && cell
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        && cell.parse::<f64>().is_ok()
}

/// Resolve the category column of every row, in row order.
///
/// With `config.workers > 1` the rows are cut into `config.chunk_size` chunks
/// resolved on a rayon pool. Each chunk starts from a snapshot of `cache` and the
/// chunk caches are merged back afterwards, so results depend on the chunk size
/// but never on scheduling.
pub fn resolve_rows(
    rows: &[Vec<String>],
    column: usize,
    table: &TaxonomyTable,
    cache: &mut FuzzyCache,
    config: &MapperConfig,
) -> Result<Vec<ResolutionResult>> {
    if config.workers <= 1 {
        let mut results = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            results.push(resolve_row(row, column, table, cache, config));
            if config.progress_interval > 0 && (idx + 1) % config.progress_interval == 0 {
                info!("processed {}/{} rows", idx + 1, rows.len());
            }
        }
        return Ok(results);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .context("building resolver thread pool")?;
    let snapshot: &FuzzyCache = cache;
    let chunks: Vec<(Vec<ResolutionResult>, FuzzyCache)> = pool.install(|| {
        rows.par_chunks(config.chunk_size.max(1))
            .map(|chunk| {
                let mut local = snapshot.clone();
                let results = chunk
                    .iter()
                    .map(|row| resolve_row(row, column, table, &mut local, config))
                    .collect();
                (results, local)
            })
            .collect()
    });

    let mut results = Vec::with_capacity(rows.len());
    for (idx, (chunk_results, local)) in chunks.into_iter().enumerate() {
        results.extend(chunk_results);
        cache.merge(local);
        debug!(chunk = idx, rows = results.len(), "merged chunk");
    }
    info!("processed {}/{} rows", results.len(), rows.len());
    Ok(results)
}

fn resolve_row(
    row: &[String],
    column: usize,
    table: &TaxonomyTable,
    cache: &mut FuzzyCache,
    config: &MapperConfig,
) -> ResolutionResult {
    let label = row.get(column).map(|c| category_label(c)).unwrap_or_default();
    resolve_hierarchical(label, table, cache, &config.delimiters, config.threshold)
}

/// Append the four derived columns to `raw`.
pub fn append_results(mut raw: RawTable, results: &[ResolutionResult]) -> RawTable {
    raw.headers
        .extend(ENRICHED_COLUMNS.iter().map(|c| c.to_string()));
    for (row, result) in raw.rows.iter_mut().zip(results) {
        row.push(result.code.clone());
        row.push(result.short_name.clone());
        row.push(result.matched_label.clone());
        row.push(format_score(result.confidence));
    }
    raw
}

/// Shortest round-trip float form with a trailing `.0` for whole numbers.
pub fn format_score(score: f64) -> String {
    format!("{:?}", score)
}
