use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use glob::{glob_with, MatchOptions, Pattern};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

use super::{append_results, find_category_column, resolve_rows, write::write_csv_with_bom};
use crate::{
    config::MapperConfig, ingest::read_table, resolve::FuzzyCache, taxonomy::TaxonomyTable,
};

/// What happened to one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub encoding: Option<String>,
    pub category_column: Option<String>,
    pub total_rows: usize,
    pub mapped_rows: usize,
    pub success: bool,
    pub error: Option<String>,
    pub processing_start: DateTime<Utc>,
    pub processing_end: DateTime<Utc>,
}

impl FileOutcome {
    fn started(input: &Path, output: &Path) -> Self {
        let now = Utc::now();
        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            encoding: None,
            category_column: None,
            total_rows: 0,
            mapped_rows: 0,
            success: false,
            error: None,
            processing_start: now,
            processing_end: now,
        }
    }
}

/// Per-run totals, optionally written out as a JSON report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub files: Vec<FileOutcome>,
    pub succeeded: usize,
    pub cached_matches: usize,
}

impl BatchSummary {
    pub fn push(&mut self, outcome: FileOutcome) {
        if outcome.success {
            self.succeeded += 1;
        }
        self.files.push(outcome);
    }

    pub fn write_report(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing batch report")?;
        fs::write(path, json).with_context(|| format!("writing report {:?}", path))?;
        Ok(())
    }
}

/// `<out_dir>/<input stem><suffix>.csv`
pub fn output_path_for(input: &Path, out_dir: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    out_dir.join(format!("{}{}.csv", stem, suffix))
}

/// Enrich one file. Never fails: read, decode and write errors, as well as a
/// missing category column, are recorded on the returned outcome.
#[tracing::instrument(level = "info", skip_all, fields(file = %input.display()))]
pub fn process_file(
    input: &Path,
    output: &Path,
    table: &TaxonomyTable,
    cache: &mut FuzzyCache,
    config: &MapperConfig,
) -> FileOutcome {
    let mut outcome = FileOutcome::started(input, output);
    match enrich_file(input, output, table, cache, config, &mut outcome) {
        Ok(written) => outcome.success = written,
        Err(e) => {
            error!("failed to process {}: {:#}", input.display(), e);
            outcome.error = Some(format!("{:#}", e));
        }
    }
    outcome.processing_end = Utc::now();
    outcome
}

/// Returns `Ok(false)` when the file was skipped for lack of a category column.
fn enrich_file(
    input: &Path,
    output: &Path,
    table: &TaxonomyTable,
    cache: &mut FuzzyCache,
    config: &MapperConfig,
    outcome: &mut FileOutcome,
) -> Result<bool> {
    let (raw, encoding) = read_table(input, &config.encodings)?;
    info!("read {} rows using {}", raw.rows.len(), encoding);
    outcome.encoding = Some(encoding);
    outcome.total_rows = raw.rows.len();

    let Some(column) = find_category_column(&raw.headers) else {
        warn!("no category column, skipping {}", input.display());
        outcome.error = Some("no category column".to_string());
        return Ok(false);
    };
    info!("category column: {}", raw.headers[column]);
    outcome.category_column = Some(raw.headers[column].clone());

    let results = resolve_rows(&raw.rows, column, table, cache, config)?;
    outcome.mapped_rows = results.iter().filter(|r| r.is_resolved()).count();

    let enriched = append_results(raw, &results);
    write_csv_with_bom(output, &enriched)?;
    info!("wrote {}", output.display());

    let pct = if outcome.total_rows == 0 {
        0.0
    } else {
        outcome.mapped_rows as f64 / outcome.total_rows as f64 * 100.0
    };
    info!(
        "mapped {}/{} records ({:.1}%)",
        outcome.mapped_rows, outcome.total_rows, pct
    );
    Ok(true)
}

/// All `*.csv` files (any case) directly inside `dir`, sorted by name.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.csv", Pattern::escape(&dir.to_string_lossy()));
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let mut files: Vec<PathBuf> = glob_with(&pattern, options)?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Enrich every CSV file in `input_dir` into `output_dir`, sharing one fuzzy
/// cache across files. Individual file failures do not stop the batch.
#[tracing::instrument(level = "info", skip_all, fields(input = %input_dir.display()))]
pub fn process_dir(
    input_dir: &Path,
    output_dir: &Path,
    table: &TaxonomyTable,
    cache: &mut FuzzyCache,
    config: &MapperConfig,
) -> Result<BatchSummary> {
    if !input_dir.is_dir() {
        bail!("input directory does not exist: {}", input_dir.display());
    }
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {:?}", output_dir))?;

    let files = list_csv_files(input_dir)?;
    let mut summary = BatchSummary::default();
    if files.is_empty() {
        warn!("no CSV files found in {}", input_dir.display());
        return Ok(summary);
    }
    info!("found {} CSV files", files.len());

    for (i, input) in files.iter().enumerate() {
        info!("file {}/{}: {}", i + 1, files.len(), input.display());
        let output = output_path_for(input, output_dir, &config.output_suffix);
        summary.push(process_file(input, &output, table, cache, config));
    }
    summary.cached_matches = cache.len();

    info!(
        "done: {}/{} files processed successfully",
        summary.succeeded,
        files.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::CanonicalEntry;
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,poi_taxonomy::enrich=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn table() -> TaxonomyTable {
        vec![CanonicalEntry::new("0101", "restaurant", "餐饮服务")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_output_path_for() {
        assert_eq!(
            output_path_for(Path::new("/data/北京POI.CSV"), Path::new("/out"), "_mapped"),
            PathBuf::from("/out/北京POI_mapped.csv")
        );
    }

    #[test]
    fn test_process_file_without_category_column() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let input = dir.path().join("points.csv");
        fs::write(&input, "name,lng,lat\n老王饭店,116.4,39.9\n")?;
        let output = dir.path().join("out").join("points_mapped.csv");

        let mut cache = FuzzyCache::new();
        let outcome = process_file(&input, &output, &table(), &mut cache, &MapperConfig::default());

        assert!(!outcome.success);
        assert_eq!(outcome.total_rows, 1);
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn test_process_file_unreadable() {
        init_test_logging();
        let dir = tempdir().unwrap();
        let mut cache = FuzzyCache::new();
        let outcome = process_file(
            &dir.path().join("missing.csv"),
            &dir.path().join("missing_mapped.csv"),
            &table(),
            &mut cache,
            &MapperConfig::default(),
        );
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_list_csv_files_any_case() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("b.CSV"), "type\n")?;
        fs::write(dir.path().join("a.csv"), "type\n")?;
        fs::write(dir.path().join("notes.txt"), "")?;

        let names: Vec<String> = list_csv_files(dir.path())?
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.CSV"]);
        Ok(())
    }

    #[test]
    fn test_process_dir_missing_input() {
        init_test_logging();
        let dir = tempdir().unwrap();
        let mut cache = FuzzyCache::new();
        let res = process_dir(
            &dir.path().join("nope"),
            &dir.path().join("out"),
            &table(),
            &mut cache,
            &MapperConfig::default(),
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_process_file_output_is_directory() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let input = dir.path().join("points.csv");
        fs::write(&input, "type\n餐饮服务\n")?;
        let output = dir.path().join("points_mapped.csv");
        fs::create_dir_all(&output)?;

        let mut cache = FuzzyCache::new();
        let outcome = process_file(&input, &output, &table(), &mut cache, &MapperConfig::default());

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        assert_eq!(outcome.mapped_rows, 1);
        assert!(output.is_dir());
        Ok(())
    }

    #[test]
    fn test_process_dir_continues_after_write_failure() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let input_dir = dir.path().join("poi");
        let output_dir = dir.path().join("out");
        fs::create_dir_all(&input_dir)?;
        fs::write(input_dir.join("a.csv"), "type\n餐饮服务\n")?;
        fs::write(input_dir.join("b.csv"), "type\n餐饮服务\n")?;
        fs::create_dir_all(output_dir.join("a_mapped.csv"))?;

        let mut cache = FuzzyCache::new();
        let summary = process_dir(
            &input_dir,
            &output_dir,
            &table(),
            &mut cache,
            &MapperConfig::default(),
        )?;

        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.succeeded, 1);
        assert!(!summary.files[0].success);
        assert!(summary.files[0].error.is_some());
        assert!(summary.files[1].success);
        assert!(output_dir.join("b_mapped.csv").is_file());
        Ok(())
    }
}
