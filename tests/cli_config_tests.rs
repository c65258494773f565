//! End-to-end tests for `countymap config` commands.

use countymap::map::{Action, ActionScript};
use std::fs;
use std::path::Path;
use std::process::Output;
use tempfile::TempDir;

mod fixtures;
use fixtures::*;

fn run_config(config_dir: &Path, args: &[&str]) -> Output {
    let mut full = vec!["config"];
    full.extend_from_slice(args);
    countymap_command(config_dir)
        .args(&full)
        .output()
        .expect("Failed to execute command")
}

// ============================================================================
// Show / Path
// ============================================================================

#[test]
fn test_config_show_defaults() {
    let config_dir = TempDir::new().unwrap();
    let output = run_config(config_dir.path(), &["show"]);

    assert_eq!(
        output.status.code(),
        Some(0),
        "Show config should succeed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CountyMap Configuration"));
    assert!(stdout.contains("Max Colors: 20"));
    assert!(stdout.contains("Base Size: 975x610"));
}

#[test]
fn test_config_show_json_format() {
    let config_dir = TempDir::new().unwrap();
    let output = run_config(config_dir.path(), &["show", "--json"]);
    assert_eq!(output.status.code(), Some(0));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["legend"]["max_colors"], 20);
    assert_eq!(value["legend"]["max_label_len"], 50);
    assert_eq!(value["export"]["format"], "png");
    assert_eq!(value["export"]["background"], "#FFFFFF");
    assert_eq!(value["metadata"]["language"], "en");
}

#[test]
fn test_config_path_uses_override_dir() {
    let config_dir = TempDir::new().unwrap();
    let output = run_config(config_dir.path(), &["path"]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        config_dir.path().join("config.toml").display().to_string()
    );
}

// ============================================================================
// Init
// ============================================================================

#[test]
fn test_config_init_writes_defaults_once() {
    let config_dir = TempDir::new().unwrap();
    let config_file = config_dir.path().join("config.toml");

    let output = run_config(config_dir.path(), &["init"]);
    assert_eq!(output.status.code(), Some(0));
    let content = fs::read_to_string(&config_file).expect("config written");
    assert!(content.contains("[legend]"));
    assert!(content.contains("max_colors = 20"));

    let output = run_config(config_dir.path(), &["init"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--force"));

    let output = run_config(config_dir.path(), &["init", "--force"]);
    assert_eq!(output.status.code(), Some(0));
}

// ============================================================================
// Set
// ============================================================================

#[test]
fn test_config_set_requires_an_option() {
    let config_dir = TempDir::new().unwrap();
    let output = run_config(config_dir.path(), &["set"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("At least one configuration option"));
}

#[test]
fn test_config_set_persists_values() {
    let config_dir = TempDir::new().unwrap();

    let output = run_config(
        config_dir.path(),
        &["set", "--max-colors", "5", "--format", "jpg", "--background", "#000"],
    );
    assert_eq!(
        output.status.code(),
        Some(0),
        "Set should succeed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = run_config(config_dir.path(), &["show", "--json"]);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["legend"]["max_colors"], 5);
    assert_eq!(value["export"]["format"], "jpeg");
    assert_eq!(value["export"]["background"], "#000000");
}

#[test]
fn test_config_set_rejects_invalid_values() {
    let config_dir = TempDir::new().unwrap();

    let output = run_config(config_dir.path(), &["set", "--scale", "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("export.scale"));

    let output = run_config(config_dir.path(), &["set", "--format", "gif"]);
    assert_eq!(output.status.code(), Some(1));

    let output = run_config(config_dir.path(), &["set", "--endpoint", "ftp://example.org"]);
    assert_eq!(output.status.code(), Some(1));

    assert!(!config_dir.path().join("config.toml").exists());
}

#[test]
fn test_config_invalid_file_fails_validation() {
    let config_dir = TempDir::new().unwrap();
    fs::write(
        config_dir.path().join("config.toml"),
        "[legend]\nmax_colors = 0\n",
    )
    .unwrap();

    let output = run_config(config_dir.path(), &["show"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("max_colors"));
}

// ============================================================================
// Config drives the map key limit
// ============================================================================

#[test]
fn test_max_colors_limits_session() {
    let (catalog, temp_dir) = create_temp_catalog();
    let output = run_config(temp_dir.path(), &["set", "--max-colors", "2"]);
    assert_eq!(output.status.code(), Some(0));

    let script = ActionScript {
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
        ],
    };
    let script_path = write_script(temp_dir.path(), "script.json", &script);

    let output = countymap_command(temp_dir.path())
        .args([
            "session",
            "--map",
            catalog.to_str().unwrap(),
            "--script",
            script_path.to_str().unwrap(),
            "--json",
        ])
        .output()
        .expect("Failed to execute command");
    assert_eq!(output.status.code(), Some(0));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["legend"].as_array().unwrap().len(), 2);
    assert!(value["assignments"].get("06").is_none());
    assert_eq!(value["notices"][0]["kind"], "color_limit");
    assert_eq!(value["notices"][0]["color"], "#008000");
    assert_eq!(value["notices"][0]["limit"], 2);
}
