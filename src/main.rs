use anyhow::{bail, Context, Result};
use clap::Parser;
use poi_taxonomy::{
    config::{MapperConfig, DEFAULT_CHUNK_SIZE, DEFAULT_OUTPUT_SUFFIX},
    enrich::{output_path_for, process_dir, process_file, BatchSummary},
    resolve::{FuzzyCache, DEFAULT_THRESHOLD},
    taxonomy,
};
use std::{fs, path::PathBuf, time::Instant};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Map POI category labels onto the standard style-sheet taxonomy"
)]
struct Args {
    /// Taxonomy definition (style sheet) file
    #[arg(short, long)]
    mapping: PathBuf,
    /// A CSV file or a directory of CSV files
    #[arg(short, long)]
    input: PathBuf,
    /// Directory for enriched output files
    #[arg(short, long, default_value = "./mapped")]
    output: PathBuf,
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,
    #[arg(long, default_value = DEFAULT_OUTPUT_SUFFIX)]
    suffix: String,
    /// Encodings to try in order, comma separated
    #[arg(long, value_delimiter = ',')]
    encodings: Option<Vec<String>>,
    /// Resolver threads; 1 keeps processing sequential
    #[arg(long, default_value_t = 1)]
    workers: usize,
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    /// Write a JSON run report here
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> MapperConfig {
        let mut config = MapperConfig {
            threshold: self.threshold,
            output_suffix: self.suffix.clone(),
            workers: self.workers,
            chunk_size: self.chunk_size,
            ..MapperConfig::default()
        };
        if let Some(encodings) = &self.encodings {
            config.encodings = encodings.clone();
        }
        config
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    let config = args.config();
    info!("mapping file: {}", args.mapping.display());
    info!("input: {}", args.input.display());
    info!("output directory: {}", args.output.display());

    // ─── 2) load taxonomy ────────────────────────────────────────────
    let table = taxonomy::load_file(&args.mapping, &config.encodings);
    if table.is_empty() {
        bail!("no taxonomy entries loaded from {}", args.mapping.display());
    }

    // ─── 3) enrich ───────────────────────────────────────────────────
    let start = Instant::now();
    let mut cache = FuzzyCache::new();
    let summary = if args.input.is_file() {
        fs::create_dir_all(&args.output)
            .with_context(|| format!("creating output directory {:?}", args.output))?;
        let output = output_path_for(&args.input, &args.output, &config.output_suffix);
        let mut summary = BatchSummary::default();
        summary.push(process_file(&args.input, &output, &table, &mut cache, &config));
        summary.cached_matches = cache.len();
        summary
    } else {
        process_dir(&args.input, &args.output, &table, &mut cache, &config)?
    };
    info!(
        "finished {}/{} files in {:?}",
        summary.succeeded,
        summary.files.len(),
        start.elapsed()
    );

    // ─── 4) report ───────────────────────────────────────────────────
    if let Some(report) = &args.report {
        summary.write_report(report)?;
        info!("report written to {}", report.display());
    }
    Ok(())
}
