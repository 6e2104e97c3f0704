// src/taxonomy/mod.rs
use std::collections::HashMap;

pub mod load;

pub use load::{extract_flat_rows, extract_table_rows, load, load_file};

/// Column labels used in the published style table. These show up wherever the
/// header row gets picked up by either extraction pass and must never become
/// display names.
pub const HEADER_TOKENS: &[&str] = &[
    "代码",
    "英文名称",
    "中文名称",
    "描述",
    "样式推荐类型",
    "比例尺",
    "code",
    "english name",
    "chinese name",
    "description",
    "recommended style type",
    "scale",
];

/// True if `name` is one of the known table header labels.
pub fn is_header_token(name: &str) -> bool {
    let lowered = name.trim().to_lowercase();
    HEADER_TOKENS.iter().any(|t| *t == lowered)
}

/// One authoritative taxonomy record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalEntry {
    /// 4-digit numeric code, e.g. "0101".
    pub code: String,
    /// ASCII identifier-like short name, e.g. "restaurant".
    pub short_name: String,
    /// Canonical human-readable name; also the lookup key.
    pub display_name: String,
}

impl CanonicalEntry {
    pub fn new(
        code: impl Into<String>,
        short_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            short_name: short_name.into(),
            display_name: display_name.into(),
        }
    }
}

/// Lookup table `display_name → CanonicalEntry`.
///
/// Iteration follows first-insertion order of each display name. Re-inserting an
/// existing display name replaces the entry in place (last write wins), so the
/// scan order the resolver depends on is stable and reproducible.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyTable {
    entries: Vec<CanonicalEntry>,
    index: HashMap<String, usize>,
}

impl TaxonomyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry keyed by its display name.
    pub fn insert(&mut self, entry: CanonicalEntry) {
        match self.index.get(&entry.display_name) {
            Some(&slot) => self.entries[slot] = entry,
            None => {
                self.index
                    .insert(entry.display_name.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Merge `entries` in order; later entries overwrite earlier ones.
    pub fn extend<I: IntoIterator<Item = CanonicalEntry>>(&mut self, entries: I) {
        for entry in entries {
            self.insert(entry);
        }
    }

    pub fn get(&self, display_name: &str) -> Option<&CanonicalEntry> {
        self.index.get(display_name).map(|&slot| &self.entries[slot])
    }

    pub fn contains(&self, display_name: &str) -> bool {
        self.index.contains_key(display_name)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CanonicalEntry> for TaxonomyTable {
    fn from_iter<I: IntoIterator<Item = CanonicalEntry>>(iter: I) -> Self {
        let mut table = TaxonomyTable::new();
        table.extend(iter);
        table
    }
}
