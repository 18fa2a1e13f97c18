use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;

fn edflow(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("edflow").unwrap();
    cmd.env("EDFLOW_HOME", home).env("NO_COLOR", "1");
    cmd
}

fn json(home: &Path, args: &[&str]) -> Value {
    let output = edflow(home).args(args).arg("--json").output().unwrap();
    assert!(output.status.success(), "edflow {:?} failed", args);
    serde_json::from_slice(&output.stdout).unwrap()
}

fn listed_names(result: &Value) -> Vec<String> {
    result["listed"]
        .as_array()
        .map(|records| {
            records
                .iter()
                .map(|r| r["name"].as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_init_installs_defaults_once() {
    let temp_dir = tempfile::tempdir().unwrap();

    edflow(temp_dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed 8 default terms"));
    assert!(temp_dir.path().join("config.json").exists());
    assert!(temp_dir.path().join("terms.json").exists());

    edflow(temp_dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already installed"));

    edflow(temp_dir.path())
        .args(["status", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pitch"))
        .stdout(predicate::str::contains("Pending Review"));
}

#[test]
fn test_status_lifecycle() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    for name in ["Pitch", "Draft", "Copy Edit"] {
        edflow(home).args(["status", "add", name]).assert().success();
    }

    let list = json(home, &["status", "list"]);
    assert_eq!(listed_names(&list), vec!["Pitch", "Draft", "Copy Edit"]);
    let draft_id = list["listed"][1]["id"].as_u64().unwrap();

    edflow(home)
        .args(["status", "rm", &draft_id.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted status 'Draft'"));

    let list = json(home, &["status", "list"]);
    assert_eq!(listed_names(&list), vec!["Pitch", "Copy Edit"]);
    let positions: Vec<u64> = list["listed"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["position"].as_u64().unwrap())
        .collect();
    assert_eq!(positions, vec![1, 2]);
}

#[test]
fn test_restricted_status_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();

    edflow(temp_dir.path())
        .args(["status", "add", "Publish"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("restricted"));

    edflow(temp_dir.path())
        .args(["status", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No statuses found."));
}

#[test]
fn test_json_error_response() {
    let temp_dir = tempfile::tempdir().unwrap();

    let output = edflow(temp_dir.path())
        .args(["status", "rm", "bad-id", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["code"], "invalid");
    assert!(body["message"].as_str().unwrap().contains("bad-id"));
}

#[test]
fn test_reorder_and_next() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();
    edflow(home).arg("init").assert().success();

    let list = json(home, &["status", "list"]);
    let ids: Vec<String> = list["listed"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].to_string())
        .collect();

    // Move "Draft" to the front.
    let reordered = json(
        home,
        &["status", "reorder", &ids[3], &ids[0], &ids[1], &ids[2], &ids[4]],
    );
    assert_eq!(
        listed_names(&reordered),
        vec!["Draft", "Pitch", "Assigned", "In Progress", "Pending Review"]
    );

    let next = json(home, &["status", "next", "draft"]);
    assert_eq!(next["affected"][0]["slug"], "pitch");

    edflow(home)
        .args(["status", "next", "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("last status"));
}

#[test]
fn test_reorder_with_unknown_id_changes_nothing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();
    edflow(home).arg("init").assert().success();
    let before = json(home, &["status", "list"]);
    let first = before["listed"][4]["id"].to_string();

    edflow(home)
        .args(["status", "reorder", &first, "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));

    assert_eq!(json(home, &["status", "list"]), before);
}

#[test]
fn test_field_values_roundtrip_and_purge() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    let created = json(home, &["field", "add", "Needs Photo", "--type", "checkbox"]);
    let field = &created["affected"][0];
    let id = field["id"].as_u64().unwrap();
    assert_eq!(
        field["storage_key"],
        format!("edflow_editorial_meta_checkbox_{}", id)
    );

    edflow(home)
        .args(["meta", "set", "12", "needs-photo", "yes"])
        .assert()
        .success();
    edflow(home)
        .args(["meta", "show", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Needs Photo"))
        .stdout(predicate::str::contains("yes"));

    edflow(home)
        .args(["field", "rm", &id.to_string()])
        .assert()
        .success();
    edflow(home)
        .args(["meta", "show", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No values for post 12"));
}

#[test]
fn test_field_type_is_validated() {
    let temp_dir = tempfile::tempdir().unwrap();

    edflow(temp_dir.path())
        .args(["field", "add", "Due", "--type", "date"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported metadata type"));
}

#[test]
fn test_dir_flag_overrides_env() {
    let env_dir = tempfile::tempdir().unwrap();
    let flag_dir = tempfile::tempdir().unwrap();

    edflow(env_dir.path())
        .args(["status", "add", "Pitch", "--dir"])
        .arg(flag_dir.path())
        .assert()
        .success();

    assert!(flag_dir.path().join("terms.json").exists());
    assert!(!env_dir.path().join("terms.json").exists());
}
