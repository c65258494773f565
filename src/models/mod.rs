//! Data models for regions, colors, and the region catalog.
//!
//! This module contains the core data structures shared by the map state,
//! the loaders and the exporters. Models are independent of UI and I/O.

pub mod catalog;
pub mod color_list;
pub mod region;
pub mod rgb;

// Re-export all model types
pub use catalog::GeoCatalog;
pub use color_list::{ColorList, MAX_REGION_COLORS};
pub use region::{Polygon, Region, RegionKind, Ring};
pub use rgb::RgbColor;
