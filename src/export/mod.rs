//! Export of the colored map.
//!
//! Images go through an explicit pipeline (layout, scene composition,
//! SVG serialization or rasterization, encoding, delivery) in which every
//! stage returns a typed [`ExportError`]. Selected regions can also be
//! exported as JSON together with their knowledge-base metadata.

pub mod composer;
pub mod json;
pub mod raster;
pub mod svg;

pub use composer::{
    compose, deliver, export_filename, layout, Destination, ExportComposer, ExportError,
    ExportLayout, ExportOptions, MapScene,
};
pub use json::{build_records, to_json, ExportField, ExportRecord};
