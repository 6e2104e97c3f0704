use super::{resolver::resolve, FuzzyCache, ResolutionResult};
use crate::taxonomy::TaxonomyTable;

/// Split a hierarchical label on any of `delimiters`, trimming segments and
/// dropping empty ones. Segments stay in broad → specific order.
pub fn split_segments<'a>(raw: &'a str, delimiters: &[char]) -> Vec<&'a str> {
    raw.split(|c: char| delimiters.contains(&c))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolve the most specific segment first and return the first nonzero result.
///
/// When nothing resolves, the first (most general) segment is kept as the
/// matched label so the original category survives for audit.
pub fn resolve_hierarchical(
    raw: &str,
    table: &TaxonomyTable,
    cache: &mut FuzzyCache,
    delimiters: &[char],
    threshold: f64,
) -> ResolutionResult {
    let segments = split_segments(raw, delimiters);

    for segment in segments.iter().rev() {
        let result = resolve(segment, table, cache, threshold);
        if result.is_resolved() {
            return result;
        }
    }

    ResolutionResult::unresolved(segments.first().copied().unwrap_or_default())
}
