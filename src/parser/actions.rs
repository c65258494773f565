//! Action script loading.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::map::ActionScript;

/// Reads a JSON action script.
pub fn parse_script(path: &Path) -> Result<ActionScript> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse script: {}", path.display()))
}
