//! Resolve free-form, hierarchical POI category labels into a fixed canonical
//! taxonomy and enrich CSV datasets with the result.

pub mod config;
pub mod enrich;
pub mod ingest;
pub mod resolve;
pub mod taxonomy;

pub use config::MapperConfig;
pub use resolve::{resolve, resolve_hierarchical, score, FuzzyCache, ResolutionResult};
pub use taxonomy::{CanonicalEntry, TaxonomyTable};
