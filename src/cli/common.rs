//! Shared CLI plumbing: errors, exit codes and map loading.

use crate::config::Config;
use crate::map::{MapSession, Notice};
use crate::models::GeoCatalog;
use crate::parser;
use clap::Args;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command succeeded
    Success = 0,
    /// Bad input: unknown ids, invalid flags or files that fail validation
    ValidationError = 1,
    /// Reading, writing or network access failed
    IoError = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

/// Error reported by a CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    code: ExitCode,
    message: String,
}

impl CliError {
    /// Invalid user input.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::ValidationError,
            message: message.into(),
        }
    }

    /// I/O or network failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::IoError,
            message: message.into(),
        }
    }

    /// Exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type of CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Map catalog plus an optional action script.
#[derive(Debug, Clone, Args)]
pub struct MapInput {
    /// Path to a TopoJSON or GeoJSON region catalog
    #[arg(short, long, value_name = "FILE")]
    pub map: PathBuf,

    /// Path to a JSON action script to replay
    #[arg(short, long, value_name = "FILE")]
    pub script: Option<PathBuf>,
}

impl MapInput {
    /// Loads the catalog.
    pub fn catalog(&self) -> CliResult<Arc<GeoCatalog>> {
        if !self.map.exists() {
            return Err(CliError::io(format!(
                "Map file not found: {}",
                self.map.display()
            )));
        }
        parser::load_catalog(&self.map)
            .map(Arc::new)
            .map_err(|e| CliError::validation(format!("Failed to load map: {e:#}")))
    }

    /// Loads the catalog and replays the script, if any.
    pub fn session(&self, config: &Config) -> CliResult<MapSession> {
        let catalog = self.catalog()?;
        let mut session = MapSession::new(catalog, config.legend.to_index());

        if let Some(path) = &self.script {
            if !path.exists() {
                return Err(CliError::io(format!(
                    "Script file not found: {}",
                    path.display()
                )));
            }
            let script = parser::parse_script(path)
                .map_err(|e| CliError::validation(format!("{e:#}")))?;
            session.replay(&script);
        }

        Ok(session)
    }
}

/// Loads the user configuration.
pub fn load_config() -> CliResult<Config> {
    Config::load().map_err(|e| CliError::validation(format!("{e:#}")))
}

/// Prints notices to stderr.
pub fn report_notices(notices: &[Notice]) {
    for notice in notices {
        eprintln!("Warning: {notice}");
    }
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Prints a title with an underline of matching width.
pub fn print_heading(title: &str) {
    println!("{title}");
    println!("{}", "=".repeat(title.chars().count()));
}
