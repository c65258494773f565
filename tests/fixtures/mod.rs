//! Shared test fixtures for E2E CLI tests.
#![allow(dead_code)] // Not every test binary uses every fixture

use countymap::config::CONFIG_DIR_ENV;
use countymap::map::{Action, ActionScript};
use countymap::models::RgbColor;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub const RED: RgbColor = RgbColor::new(0xFF, 0x00, 0x00);
pub const BLUE: RgbColor = RgbColor::new(0x00, 0x00, 0xFF);
pub const GREEN: RgbColor = RgbColor::new(0x00, 0x80, 0x00);

/// Square polygon coordinates in GeoJSON form.
fn square(lon: f64, lat: f64, size: f64) -> serde_json::Value {
    serde_json::json!([[
        [lon, lat],
        [lon + size, lat],
        [lon + size, lat + size],
        [lon, lat + size],
        [lon, lat]
    ]])
}

fn feature(id: &str, name: &str, lon: f64, lat: f64, size: f64) -> serde_json::Value {
    serde_json::json!({
        "type": "Feature",
        "id": id,
        "properties": { "name": name },
        "geometry": { "type": "Polygon", "coordinates": square(lon, lat, size) }
    })
}

/// A small GeoJSON catalog: three states and three counties.
///
/// Texas (48) with Travis (48453) and Harris (48201), Oklahoma (40) with
/// Tulsa (40143), and California (06) without counties.
pub fn test_catalog_geojson() -> String {
    let collection = serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            feature("48", "Texas", -106.0, 26.0, 12.0),
            feature("40", "Oklahoma", -103.0, 34.0, 8.0),
            feature("06", "California", -124.0, 32.0, 10.0),
            feature("48453", "Travis", -98.0, 30.0, 0.5),
            feature("48201", "Harris", -95.5, 29.5, 0.5),
            feature("40143", "Tulsa", -96.0, 36.0, 0.5)
        ]
    });
    collection.to_string()
}

/// Writes the test catalog into a temp dir.
///
/// The `TempDir` must be kept alive for the duration of the test.
pub fn create_temp_catalog() -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("us.geojson");
    fs::write(&path, test_catalog_geojson()).expect("Failed to write catalog");
    (path, temp_dir)
}

/// Writes an action script next to other fixtures in `dir`.
pub fn write_script(dir: &Path, name: &str, script: &ActionScript) -> PathBuf {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(script).expect("Failed to serialize script");
    fs::write(&path, json).expect("Failed to write script");
    path
}

/// Colors Travis red, Harris blue and California green, then labels red.
pub fn basic_script() -> ActionScript {
    ActionScript {
        multi_color: false,
        actions: vec![
            Action::Color {
                region: "48453".into(),
                color: RED,
            },
            Action::Color {
                region: "48201".into(),
                color: BLUE,
            },
            Action::Color {
                region: "06".into(),
                color: GREEN,
            },
            Action::Relabel {
                color: RED,
                label: "Won".into(),
            },
        ],
    }
}

/// Gives Travis a red-over-blue split in multi-color mode.
pub fn split_script() -> ActionScript {
    ActionScript {
        multi_color: true,
        actions: vec![
            Action::Color {
                region: "48453".into(),
                color: RED,
            },
            Action::Color {
                region: "48453".into(),
                color: BLUE,
            },
        ],
    }
}

/// Creates a catalog and a script in the same temp dir.
pub fn create_temp_session(script: &ActionScript) -> (PathBuf, PathBuf, TempDir) {
    let (catalog, temp_dir) = create_temp_catalog();
    let script = write_script(temp_dir.path(), "script.json", script);
    (catalog, script, temp_dir)
}

/// Path to the countymap binary.
pub fn countymap_bin() -> &'static str {
    env!("CARGO_BIN_EXE_countymap")
}

/// Creates a Command with an isolated config directory.
///
/// Pass the same directory to commands that must share configuration.
pub fn countymap_command(config_dir: &Path) -> Command {
    let mut cmd = Command::new(countymap_bin());
    cmd.env(CONFIG_DIR_ENV, config_dir);
    cmd.env_remove("RUST_LOG");
    cmd
}
