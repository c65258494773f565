//! Service layer for talking to external systems.
//!
//! Currently the knowledge-base metadata provider used by lookups and the
//! JSON export.

pub mod metadata;

// Re-export commonly used types and functions
pub use metadata::{MetadataLookup, RegionMetadata, SearchBackend, WikidataBackend};
