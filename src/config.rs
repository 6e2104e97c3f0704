use crate::resolve::DEFAULT_THRESHOLD;

/// Hierarchy separators: ASCII and full-width semicolon.
pub const DEFAULT_DELIMITERS: &[char] = &[';', '；'];

/// Encodings tried in order when decoding input files. `utf-8` strips a BOM.
pub const DEFAULT_ENCODINGS: &[&str] = &["utf-8", "gb18030", "gbk", "latin1"];

/// Used lossily once every encoding in the list has failed.
pub const FALLBACK_ENCODING: &str = "gb18030";

pub const DEFAULT_OUTPUT_SUFFIX: &str = "_mapped";
pub const PROGRESS_INTERVAL: usize = 1000;
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

pub fn default_encodings() -> Vec<String> {
    DEFAULT_ENCODINGS.iter().map(|e| e.to_string()).collect()
}

/// Settings shared by every file in a run.
#[derive(Debug, Clone)]
pub struct MapperConfig {
    pub threshold: f64,
    pub delimiters: Vec<char>,
    pub encodings: Vec<String>,
    pub output_suffix: String,
    pub progress_interval: usize,
    /// Number of rayon workers resolving records; 1 means sequential.
    pub workers: usize,
    /// Records per parallel chunk. Output only depends on this, not on thread timing.
    pub chunk_size: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            delimiters: DEFAULT_DELIMITERS.to_vec(),
            encodings: default_encodings(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            progress_interval: PROGRESS_INTERVAL,
            workers: 1,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
