//! Loading map catalogs and action scripts from disk.
//!
//! Catalogs come from TopoJSON (us-atlas) or GeoJSON files; scripts are
//! JSON lists of map interactions.

pub mod actions;
pub mod catalog;
pub mod topology;

// Re-export commonly used functions
pub use actions::parse_script;
pub use catalog::{load_catalog, parse_catalog};
