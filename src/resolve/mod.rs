// src/resolve/mod.rs
use serde::Serialize;

pub mod hierarchy;
pub mod resolver;
pub mod similarity;

pub use hierarchy::{resolve_hierarchical, split_segments};
pub use resolver::{resolve, CachedMatch, FuzzyCache};
pub use similarity::score;

/// Minimum composite score a fuzzy candidate needs to be accepted.
pub const DEFAULT_THRESHOLD: f64 = 0.6;
/// Confidence reported for an exact table hit.
pub const EXACT_CONFIDENCE: f64 = 1.0;
/// Confidence reported when a label is answered from the fuzzy cache.
pub const CACHE_HIT_CONFIDENCE: f64 = 0.8;

/// Outcome of resolving one label. `confidence == 0.0` means unresolved, in which
/// case `code` and `short_name` are empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionResult {
    pub code: String,
    pub short_name: String,
    pub matched_label: String,
    pub confidence: f64,
}

impl ResolutionResult {
    pub fn matched(
        code: impl Into<String>,
        short_name: impl Into<String>,
        matched_label: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            code: code.into(),
            short_name: short_name.into(),
            matched_label: matched_label.into(),
            confidence,
        }
    }

    /// Zero-confidence result carrying `label` for audit.
    pub fn unresolved(label: impl Into<String>) -> Self {
        Self {
            code: String::new(),
            short_name: String::new(),
            matched_label: label.into(),
            confidence: 0.0,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.confidence > 0.0
    }
}
