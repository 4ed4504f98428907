//! E2E CLI tests covering:
//! - `cairn list` in json and text modes, with board and filter selection
//! - Error rendering: codes on stderr, JSON error envelope
//! - Project config `output` preference
//! - `cairn browse` argument validation before the terminal is touched
//! - `cairn completions`
//!
//! Each test runs the `cairn` binary as a subprocess in an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

const LISTING: &str = r#"{"boards": [
    {"name": "Open", "filter": true, "groups": [
        {"title": "api - open", "repository": "acme/api", "items": [
            {"number": 1, "title": "Crash on start", "state": "open", "labels": ["bug"],
             "updated_at": "2024-03-01T10:00:00Z"},
            {"number": 2, "title": "Slow search", "state": "open", "author": "kim"}]}]},
    {"name": "Mine", "groups": [
        {"title": "web - open", "repository": "acme/web", "collapsed": true, "items": [
            {"number": 10, "title": "Button misaligned"}]}]}
]}"#;

/// Build a Command targeting the cairn binary, rooted in `dir`.
fn cairn_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cairn"));
    cmd.current_dir(dir);
    cmd.env("CAIRN_LOG", "error");
    cmd.env("HOME", dir);
    cmd.env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd.env_remove("FORMAT");
    cmd.env_remove("CAIRN_BASE_URL");
    cmd.env_remove("CAIRN_LOG_FILE");
    cmd
}

fn write_listing(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write listing");
    path
}

fn list_json(dir: &Path, args: &[&str]) -> Value {
    let output = cairn_cmd(dir)
        .arg("list")
        .args(args)
        .arg("--json")
        .output()
        .expect("list should not crash");
    assert!(
        output.status.success(),
        "list failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("list --json should produce valid JSON")
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[test]
fn list_json_reports_every_board() {
    let dir = TempDir::new().expect("tempdir");
    write_listing(dir.path(), "boards.json", LISTING);

    let json = list_json(dir.path(), &["boards.json"]);
    assert_eq!(json["visible"], 3);
    assert_eq!(json["total"], 3);
    let boards = json["boards"].as_array().expect("boards array");
    assert_eq!(boards.len(), 2);
    assert_eq!(boards[0]["name"], "Open");
    assert_eq!(boards[1]["groups"][0]["collapsed"], true);

    let first = &boards[0]["groups"][0]["items"][0];
    assert_eq!(first["number"], 1);
    assert_eq!(first["repository"], "acme/api");
    assert_eq!(first["labels"][0], "bug");
    assert_eq!(first["updated"], "2024-03-01");
    assert!(json.get("filter").is_none());
}

#[test]
fn list_filter_narrows_one_board() {
    let dir = TempDir::new().expect("tempdir");
    write_listing(dir.path(), "boards.json", LISTING);

    let json = list_json(
        dir.path(),
        &["boards.json", "--board", "Open", "--filter", "kim"],
    );
    assert_eq!(json["filter"], "kim");
    assert_eq!(json["visible"], 1);
    assert_eq!(json["total"], 2);
    let group = &json["boards"][0]["groups"][0];
    assert_eq!(group["visible"], 1);
    assert_eq!(group["total"], 2);
    assert_eq!(group["items"][0]["title"], "Slow search");
}

#[test]
fn list_text_prints_one_row_per_issue() {
    let dir = TempDir::new().expect("tempdir");
    write_listing(dir.path(), "boards.json", LISTING);

    cairn_cmd(dir.path())
        .args(["--format", "text", "list", "boards.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Open  acme/api#1  open  Crash on start"))
        .stdout(predicate::str::contains("Mine  acme/web#10  -  Button misaligned"));
}

#[test]
fn list_pretty_shows_counters() {
    let dir = TempDir::new().expect("tempdir");
    write_listing(dir.path(), "boards.json", LISTING);

    cairn_cmd(dir.path())
        .args(["--format", "pretty", "list", "boards.json", "--filter", "crash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api - open (1/2)"))
        .stdout(predicate::str::contains("1 of 3 issue(s) shown"));
}

#[test]
fn project_config_selects_json_output() {
    let dir = TempDir::new().expect("tempdir");
    write_listing(dir.path(), "boards.json", LISTING);
    fs::create_dir_all(dir.path().join(".cairn")).expect("config dir");
    fs::write(dir.path().join(".cairn/config.toml"), "output = \"json\"\n").expect("config");

    let output = cairn_cmd(dir.path())
        .args(["list", "boards.json"])
        .output()
        .expect("list should not crash");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("config output is JSON");
    assert_eq!(json["visible"], 3);
}

// ---------------------------------------------------------------------------
// errors
// ---------------------------------------------------------------------------

#[test]
fn unknown_board_fails() {
    let dir = TempDir::new().expect("tempdir");
    write_listing(dir.path(), "boards.json", LISTING);

    cairn_cmd(dir.path())
        .args(["list", "boards.json", "--board", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No board named 'Nope'"));
}

#[test]
fn missing_listing_has_error_code() {
    let dir = TempDir::new().expect("tempdir");

    cairn_cmd(dir.path())
        .args(["list", "absent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1001]"))
        .stderr(predicate::str::contains("absent.json"));
}

#[test]
fn malformed_listing_renders_json_error() {
    let dir = TempDir::new().expect("tempdir");
    write_listing(dir.path(), "broken.json", "{\"boards\": [");

    let output = cairn_cmd(dir.path())
        .args(["--json", "list", "broken.json"])
        .output()
        .expect("list should not crash");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let json: Value = serde_json::from_slice(&output.stderr).expect("error is JSON");
    assert_eq!(json["error"]["error_code"], "E1001");
    assert!(
        json["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("broken.json"))
    );
}

#[test]
fn duplicate_issue_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    write_listing(
        dir.path(),
        "dup.json",
        r#"{"boards": [{"name": "Open", "groups": [
            {"title": "a", "repository": "acme/api", "items": [
                {"number": 1, "title": "One"}, {"number": 1, "title": "Again"}]}]}]}"#,
    );

    cairn_cmd(dir.path())
        .args(["list", "dup.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("acme/api#1"));
}

// ---------------------------------------------------------------------------
// browse / completions
// ---------------------------------------------------------------------------

#[test]
fn browse_rejects_bad_selection_before_opening_terminal() {
    let dir = TempDir::new().expect("tempdir");
    write_listing(dir.path(), "boards.json", LISTING);

    cairn_cmd(dir.path())
        .args(["browse", "boards.json", "--select", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2004]"))
        .stderr(predicate::str::contains("--select"));
}

#[test]
fn completions_bash_mentions_binary() {
    let dir = TempDir::new().expect("tempdir");

    cairn_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cairn"))
        .stdout(predicate::str::contains("browse"));
}
