//! CLI command handlers for CountyMap.
//!
//! This module provides headless, scriptable access to the map state,
//! the map key, exports and knowledge-base lookups.

pub mod common;
pub mod config;
pub mod export;
pub mod legend;
pub mod lookup;
pub mod regions;
pub mod session;

// Re-export types used by main.rs and tests
pub use common::{CliError, CliResult, ExitCode};
pub use config::ConfigArgs;
pub use export::ExportArgs;
pub use legend::LegendArgs;
pub use lookup::LookupArgs;
pub use regions::RegionsArgs;
pub use session::SessionArgs;
