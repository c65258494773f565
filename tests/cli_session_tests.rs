//! End-to-end tests for `countymap session`.

use countymap::map::{Action, ActionScript};
use std::process::Output;

mod fixtures;
use fixtures::*;

fn run_session(script: &ActionScript, json: bool) -> Output {
    let (catalog, script_path, temp_dir) = create_temp_session(script);
    let mut args = vec![
        "session",
        "--map",
        catalog.to_str().unwrap(),
        "--script",
        script_path.to_str().unwrap(),
    ];
    if json {
        args.push("--json");
    }

    countymap_command(temp_dir.path())
        .args(&args)
        .output()
        .expect("Failed to execute command")
}

fn session_json(script: &ActionScript) -> serde_json::Value {
    let output = run_session(script, true);
    assert_eq!(
        output.status.code(),
        Some(0),
        "session should succeed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

#[test]
fn test_session_single_color_assignments() {
    let value = session_json(&basic_script());

    assert_eq!(value["multi_color"], false);
    assert_eq!(value["assignments"]["48453"], serde_json::json!(["#FF0000"]));
    assert_eq!(value["assignments"]["06"], serde_json::json!(["#008000"]));
    assert_eq!(value["legend"][0]["label"], "Won");
    assert_eq!(value["legend"][1]["label"], "Label 2");
    assert_eq!(value["legend"][2]["members"], serde_json::json!(["06"]));
    assert_eq!(value["tooltips"]["48453"], "Travis, Texas: Won");
    assert_eq!(value["tooltips"]["06"], "California: Label 3");
    assert_eq!(value["isolation"], serde_json::Value::Null);
    assert_eq!(value["notices"], serde_json::json!([]));
}

#[test]
fn test_session_same_color_toggles_off() {
    let mut script = basic_script();
    script.actions.push(Action::Color {
        region: "06".into(),
        color: GREEN,
    });
    let value = session_json(&script);

    assert!(value["assignments"].get("06").is_none());
    assert_eq!(value["legend"].as_array().unwrap().len(), 2);
}

#[test]
fn test_session_multi_color_split() {
    let value = session_json(&split_script());

    assert_eq!(value["multi_color"], true);
    assert_eq!(
        value["assignments"]["48453"],
        serde_json::json!(["#FF0000", "#0000FF"])
    );
    assert_eq!(value["tooltips"]["48453"], "Travis, Texas: Label 1 / Label 2");
}

#[test]
fn test_session_isolation_hides_outside_regions() {
    let script = ActionScript {
        multi_color: false,
        actions: vec![
            Action::Color {
                region: "06".into(),
                color: RED,
            },
            Action::IsolateGroups {
                groups: vec!["Texas".into()],
            },
            Action::Color {
                region: "40143".into(),
                color: BLUE,
            },
            Action::Color {
                region: "48201".into(),
                color: BLUE,
            },
        ],
    };
    let value = session_json(&script);

    assert_eq!(value["isolation"], "region");
    assert_eq!(
        value["visible"],
        serde_json::json!(["48", "48201", "48453"])
    );
    assert_eq!(value["assignments"], serde_json::json!({"48201": ["#0000FF"]}));
    assert_eq!(value["notices"][0]["kind"], "purged");
    assert_eq!(value["notices"][0]["regions"], serde_json::json!(["06"]));
    assert_eq!(value["notices"][1]["kind"], "hidden");
    assert_eq!(value["notices"][1]["region"], "40143");
}

#[test]
fn test_session_exit_isolation_clears_map() {
    let script = ActionScript {
        multi_color: false,
        actions: vec![
            Action::IsolateCustom {
                regions: vec!["48453".into(), "48201".into()],
            },
            Action::Color {
                region: "48453".into(),
                color: RED,
            },
            Action::ExitIsolation,
        ],
    };
    let value = session_json(&script);

    assert_eq!(value["isolation"], serde_json::Value::Null);
    assert_eq!(value["assignments"], serde_json::json!({}));
    assert_eq!(value["legend"], serde_json::json!([]));
}

#[test]
fn test_session_warns_about_unknown_region() {
    let script = ActionScript {
        multi_color: false,
        actions: vec![Action::Color {
            region: "99999".into(),
            color: RED,
        }],
    };
    let output = run_session(&script, false);

    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Warning: Unknown region '99999'"), "stderr: {stderr}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Colored regions (0)"));
    assert!(stdout.contains("Isolation: off"));
}

#[test]
fn test_session_invalid_script_fails_validation() {
    let (catalog, temp_dir) = create_temp_catalog();
    let script = temp_dir.path().join("broken.json");
    std::fs::write(&script, r#"{"actions": [{"action": "paint"}]}"#).unwrap();

    let output = countymap_command(temp_dir.path())
        .args([
            "session",
            "--map",
            catalog.to_str().unwrap(),
            "--script",
            script.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse script"));
}

#[test]
fn test_session_without_script_is_empty() {
    let (catalog, temp_dir) = create_temp_catalog();
    let output = countymap_command(temp_dir.path())
        .args(["session", "--map", catalog.to_str().unwrap(), "--json"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["assignments"], serde_json::json!({}));
}
