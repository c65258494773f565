//! CountyMap Library
//!
//! This library provides the state engine behind a US county and state
//! choropleth map: loading region catalogs, coloring regions with single
//! or split colors, isolating subsets of the map, maintaining the map key
//! and exporting the result as images or JSON.

// Module declarations
pub mod cli;
pub mod config;
pub mod constants;
pub mod export;
pub mod map;
pub mod models;
pub mod parser;
pub mod services;
