use std::collections::HashMap;
use tracing::trace;

use super::{
    similarity::score, ResolutionResult, CACHE_HIT_CONFIDENCE, EXACT_CONFIDENCE,
};
use crate::taxonomy::{CanonicalEntry, TaxonomyTable};

/// A previously accepted fuzzy association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMatch {
    pub code: String,
    pub short_name: String,
    pub display_name: String,
}

impl From<&CanonicalEntry> for CachedMatch {
    fn from(entry: &CanonicalEntry) -> Self {
        Self {
            code: entry.code.clone(),
            short_name: entry.short_name.clone(),
            display_name: entry.display_name.clone(),
        }
    }
}

/// Memo of fuzzy results keyed by the trimmed raw label.
///
/// Entries are a pure function of the table they were computed against, so two
/// caches built against the same table never disagree on a key and can be
/// merged in any order.
#[derive(Debug, Clone, Default)]
pub struct FuzzyCache {
    entries: HashMap<String, CachedMatch>,
}

impl FuzzyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<&CachedMatch> {
        self.entries.get(label)
    }

    pub fn insert(&mut self, label: impl Into<String>, hit: CachedMatch) {
        self.entries.insert(label.into(), hit);
    }

    /// Absorb another worker's cache.
    pub fn merge(&mut self, other: FuzzyCache) {
        for (label, hit) in other.entries {
            self.entries.entry(label).or_insert(hit);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve one label against `table`: exact key, then cache, then a full fuzzy
/// scan. The first candidate in table order wins ties. An accepted fuzzy match is
/// cached under the trimmed label.
pub fn resolve(
    label: &str,
    table: &TaxonomyTable,
    cache: &mut FuzzyCache,
    threshold: f64,
) -> ResolutionResult {
    let label = label.trim();
    if label.is_empty() {
        return ResolutionResult::unresolved("");
    }

    if let Some(entry) = table.get(label) {
        return ResolutionResult::matched(
            &entry.code,
            &entry.short_name,
            label,
            EXACT_CONFIDENCE,
        );
    }

    if let Some(hit) = cache.get(label) {
        return ResolutionResult::matched(
            &hit.code,
            &hit.short_name,
            &hit.display_name,
            CACHE_HIT_CONFIDENCE,
        );
    }

    let mut best: Option<(&CanonicalEntry, f64)> = None;
    let mut best_score = 0.0;
    for candidate in table.iter() {
        let s = score(label, &candidate.display_name);
        if s > best_score && s >= threshold {
            best_score = s;
            best = Some((candidate, s));
        }
    }

    match best {
        Some((entry, s)) => {
            trace!(label, matched = %entry.display_name, score = s, "fuzzy match");
            cache.insert(label, CachedMatch::from(entry));
            ResolutionResult::matched(&entry.code, &entry.short_name, &entry.display_name, s)
        }
        None => ResolutionResult::unresolved(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::DEFAULT_THRESHOLD;

    fn table() -> TaxonomyTable {
        vec![
            CanonicalEntry::new("0101", "restaurant", "餐饮服务"),
            CanonicalEntry::new("0102", "chinese_food", "中餐厅"),
            CanonicalEntry::new("0201", "hotel", "住宿服务"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_exact_match() {
        let mut cache = FuzzyCache::new();
        let r = resolve("  餐饮服务 ", &table(), &mut cache, DEFAULT_THRESHOLD);
        assert_eq!(r, ResolutionResult::matched("0101", "restaurant", "餐饮服务", 1.0));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_label() {
        let mut cache = FuzzyCache::new();
        let r = resolve("   ", &table(), &mut cache, DEFAULT_THRESHOLD);
        assert_eq!(r, ResolutionResult::unresolved(""));
    }

    #[test]
    fn test_fuzzy_then_cached() {
        let table = table();
        let mut cache = FuzzyCache::new();

        // "餐厅" is contained in "中餐厅" (0.8); against "餐饮服务" it only
        // reaches 1/3 sequence ratio and 1/5 character overlap.
        let first = resolve("餐厅", &table, &mut cache, DEFAULT_THRESHOLD);
        assert_eq!(first, ResolutionResult::matched("0102", "chinese_food", "中餐厅", 0.8));
        assert_eq!(cache.len(), 1);

        let second = resolve("餐厅", &table, &mut cache, DEFAULT_THRESHOLD);
        let third = resolve("餐厅", &table, &mut cache, DEFAULT_THRESHOLD);
        assert_eq!(second, ResolutionResult::matched("0102", "chinese_food", "中餐厅", 0.8));
        assert_eq!(second, third);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_hit_reports_fixed_confidence() {
        let table: TaxonomyTable = vec![CanonicalEntry::new("0301", "shop", "abcde")]
            .into_iter()
            .collect();
        let mut cache = FuzzyCache::new();

        let first = resolve("abcxy", &table, &mut cache, DEFAULT_THRESHOLD);
        assert_eq!(first.confidence, 0.6);
        let second = resolve("abcxy", &table, &mut cache, DEFAULT_THRESHOLD);
        assert_eq!(second, ResolutionResult::matched("0301", "shop", "abcde", 0.8));
    }

    #[test]
    fn test_threshold_boundary() {
        let table: TaxonomyTable = vec![CanonicalEntry::new("0301", "shop", "abcde")]
            .into_iter()
            .collect();

        // 3 of 5 + 5 characters align: exactly 0.6
        let mut cache = FuzzyCache::new();
        let at = resolve("abcxy", &table, &mut cache, 0.6);
        assert_eq!(at.code, "0301");
        assert_eq!(at.confidence, 0.6);

        let mut cache = FuzzyCache::new();
        let above = resolve("abcxy", &table, &mut cache, 0.6 + 1e-9);
        assert_eq!(above, ResolutionResult::unresolved(""));
        assert!(cache.is_empty());

        // 6 / 11 is below the threshold
        let mut cache = FuzzyCache::new();
        let below = resolve("abcxyz", &table, &mut cache, 0.6);
        assert!(!below.is_resolved());
    }

    #[test]
    fn test_first_candidate_wins_ties() {
        let table: TaxonomyTable = vec![
            CanonicalEntry::new("0001", "first", "购物中心"),
            CanonicalEntry::new("0002", "second", "购物广场"),
        ]
        .into_iter()
        .collect();
        let mut cache = FuzzyCache::new();
        // "购物" is contained in both: 0.8 each
        let r = resolve("购物", &table, &mut cache, DEFAULT_THRESHOLD);
        assert_eq!(r.code, "0001");
    }

    #[test]
    fn test_unresolved() {
        let mut cache = FuzzyCache::new();
        let r = resolve("完全未知类型", &table(), &mut cache, DEFAULT_THRESHOLD);
        assert_eq!(r, ResolutionResult::unresolved(""));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_merge_caches() {
        let entry = CanonicalEntry::new("0101", "restaurant", "餐饮服务");
        let mut a = FuzzyCache::new();
        a.insert("餐饮", CachedMatch::from(&entry));
        let mut b = FuzzyCache::new();
        b.insert("餐饮", CachedMatch::from(&entry));
        b.insert("饮食服务", CachedMatch::from(&entry));

        a.merge(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get("饮食服务").map(|m| m.code.as_str()), Some("0101"));
    }
}
