//! Integration tests for the `ozw` CLI binary.
//!
//! Dumps are written to temp files; config lookups are pointed at a
//! nonexistent home so the user's real configuration is never read.
#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::{NamedTempFile, TempDir};

// ── Helpers ─────────────────────────────────────────────────────────

fn ozw_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("ozw");
    cmd.env("HOME", "/tmp/ozw-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/ozw-cli-test-nonexistent")
        .env_remove("OZW_CONFIG")
        .env_remove("OZW_OUTPUT")
        .env_remove("OZW_TOPIC_PREFIX")
        .env_remove("OZW_INSTANCE_ID")
        .env_remove("RUST_LOG");
    cmd
}

fn dump_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

fn config_file(dir: &TempDir, body: &str) -> String {
    let path = dir.path().join("ozw.toml");
    std::fs::write(&path, body).unwrap();
    path_arg(&path)
}

const NETWORK: &[&str] = &[
    "OpenZWave/1/,{}",
    r#"OpenZWave/1/status/,{"Status":"driverAllNodesQueried","homeID":3245703971}"#,
    r#"OpenZWave/1/node/2/,{"NodeID":2,"isListening":true}"#,
    r#"OpenZWave/1/node/2/instance/1/,{"Instance":1}"#,
    r#"OpenZWave/1/node/2/instance/1/commandclass/37/,{"Instance":1,"CommandClassId":37,"CommandClass":"COMMAND_CLASS_SWITCH_BINARY"}"#,
    r#"OpenZWave/1/node/2/instance/1/commandclass/37/value/3/,{"Label":"Switch","Value":false,"Type":"Bool"}"#,
];

const VALUE_TOPIC: &str = "OpenZWave/1/node/2/instance/1/commandclass/37/value/3";

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = ozw_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_subcommands() {
    ozw_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("replay")
            .and(predicate::str::contains("verify"))
            .and(predicate::str::contains("events")),
    );
}

#[test]
fn test_completions_bash() {
    ozw_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Replay ──────────────────────────────────────────────────────────

#[test]
fn test_replay_plain_lists_topics() {
    let dump = dump_file(NETWORK);
    ozw_cmd()
        .args(["replay", "-o", "plain", &path_arg(dump.path())])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("OpenZWave/1/status\n")
                .and(predicate::str::contains(VALUE_TOPIC)),
        );
}

#[test]
fn test_replay_json_has_kinds() {
    let dump = dump_file(NETWORK);
    ozw_cmd()
        .args(["replay", "-o", "json", &path_arg(dump.path())])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""kind": "Value""#)
                .and(predicate::str::contains(r#""kind": "CommandClass""#)),
        );
}

#[test]
fn test_replay_delete_removes_subtree() {
    let mut lines = NETWORK.to_vec();
    lines.push("OpenZWave/1/node/2/,");
    let dump = dump_file(&lines);
    ozw_cmd()
        .args(["replay", "-o", "plain", &path_arg(dump.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("node/2").not());
}

#[test]
fn test_replay_malformed_line_names_line() {
    let dump = dump_file(&["OpenZWave/1/,{}", "", "no comma here"]);
    ozw_cmd()
        .args(["replay", &path_arg(dump.path())])
        .assert()
        .code(3)
        .stderr(predicate::str::contains(":3:"));
}

#[test]
fn test_replay_bad_json_names_line() {
    let dump = dump_file(&["OpenZWave/1/,{}", "OpenZWave/1/node/2/,{not json"]);
    ozw_cmd()
        .args(["replay", &path_arg(dump.path())])
        .assert()
        .code(3)
        .stderr(predicate::str::contains(":2:"));
}

#[test]
fn test_replay_with_prefix_override() {
    let dump = dump_file(&["zw/1/,{}", r#"zw/1/node/5/,{"NodeID":5}"#]);
    ozw_cmd()
        .args(["replay", "-o", "plain", "--prefix", "zw/", &path_arg(dump.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("zw/1/node/5"));
}

#[test]
fn test_replay_rejects_bad_prefix() {
    let dump = dump_file(NETWORK);
    ozw_cmd()
        .args(["replay", "--prefix", "OpenZWave", &path_arg(dump.path())])
        .assert()
        .code(2);
}

#[test]
fn test_replay_instance_filter() {
    let dump = dump_file(&["OpenZWave/1/,{}", "OpenZWave/2/,{}"]);
    ozw_cmd()
        .args(["replay", "-o", "plain", "--instance", "2", &path_arg(dump.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("OpenZWave/2").and(predicate::str::contains("OpenZWave/1\n").not()));
}

#[test]
fn test_config_default_output_applies() {
    let dir = TempDir::new().unwrap();
    let cfg = config_file(&dir, "[defaults]\noutput = \"json\"\n");
    let dump = dump_file(NETWORK);
    ozw_cmd()
        .args(["replay", "--config", &cfg, &path_arg(dump.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""kind": "Value""#));
}

#[test]
fn test_output_flag_beats_config_default() {
    let dir = TempDir::new().unwrap();
    let cfg = config_file(&dir, "[defaults]\noutput = \"json\"\n");
    let dump = dump_file(NETWORK);
    ozw_cmd()
        .args(["replay", "-o", "plain", "--config", &cfg, &path_arg(dump.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains(VALUE_TOPIC).and(predicate::str::contains("\"kind\"").not()));
}

#[test]
fn test_unknown_config_default_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let cfg = config_file(&dir, "[defaults]\noutput = \"xml\"\n");
    let dump = dump_file(NETWORK);
    ozw_cmd()
        .args(["replay", "--config", &cfg, &path_arg(dump.path())])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("defaults.output"));
}

// ── Verify ──────────────────────────────────────────────────────────

#[test]
fn test_verify_clean_dump() {
    let dump = dump_file(NETWORK);
    ozw_cmd()
        .args(["verify", &path_arg(dump.path())])
        .assert()
        .success()
        .stderr(predicate::str::contains("No problems found"));
}

#[test]
fn test_verify_reports_pending() {
    let dump = dump_file(&[
        "OpenZWave/1/,{}",
        r#"OpenZWave/1/node/7/instance/1/,{"Instance":1}"#,
    ]);
    ozw_cmd()
        .args(["verify", "-o", "json", &path_arg(dump.path())])
        .assert()
        .code(1)
        .stdout(
            predicate::str::contains(r#""problem": "pending""#)
                .and(predicate::str::contains("OpenZWave/1/node/7")),
        );
}

#[test]
fn test_verify_reports_unknown_fields() {
    let mut lines = NETWORK.to_vec();
    lines.push(r#"OpenZWave/1/node/2/instance/1/commandclass/37/value/3/,{"Label":"Switch","Bogus":1}"#);
    let dump = dump_file(&lines);
    ozw_cmd()
        .args(["verify", "-o", "json", &path_arg(dump.path())])
        .assert()
        .code(1)
        .stdout(
            predicate::str::contains(r#""problem": "unknown_fields""#)
                .and(predicate::str::contains("Bogus")),
        );
}

// ── Events ──────────────────────────────────────────────────────────

#[test]
fn test_events_in_order() {
    let dump = dump_file(NETWORK);
    let output = ozw_cmd()
        .args(["events", "-o", "plain", "--color", "never", &path_arg(dump.path())])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "instance_added\tOpenZWave/1",
            "node_added\tOpenZWave/1/node/2",
            "node_instance_added\tOpenZWave/1/node/2/instance/1",
            "command_class_added\tOpenZWave/1/node/2/instance/1/commandclass/37",
            &format!("value_added\t{VALUE_TOPIC}"),
        ]
    );
}

#[test]
fn test_events_skip_bad_payload() {
    let dump = dump_file(&["OpenZWave/1/,{}", "OpenZWave/1/node/2/,garbage", "OpenZWave/1/,"]);
    ozw_cmd()
        .args(["events", "-o", "json-compact", &path_arg(dump.path())])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""event":"instance_added""#)
                .and(predicate::str::contains(r#""event":"instance_removed""#))
                .and(predicate::str::contains("node_added").not()),
        );
}

#[test]
fn test_events_yaml_is_one_document_per_event() {
    let dump = dump_file(&["OpenZWave/1/,{}", r#"OpenZWave/1/node/2/,{"NodeID":2}"#]);
    let output = ozw_cmd()
        .args(["events", "-o", "yaml", &path_arg(dump.path())])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.matches("---\n").count(), 2, "{stdout}");
    assert!(stdout.contains("event: instance_added\n"), "{stdout}");
    assert!(stdout.contains("topic: OpenZWave/1/node/2\n"), "{stdout}");
    assert!(!stdout.contains('{'), "{stdout}");
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ozw.toml");
    ozw_cmd()
        .args(["config", "path", "--config", &path_arg(&path)])
        .assert()
        .success()
        .stdout(predicate::str::contains("ozw.toml"));
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ozw.toml");

    ozw_cmd()
        .args(["config", "init", "--prefix", "home/zw/", "--config", &path_arg(&path)])
        .assert()
        .success();
    assert!(path.exists());

    ozw_cmd()
        .args(["config", "init", "--config", &path_arg(&path)])
        .assert()
        .code(2);

    ozw_cmd()
        .args(["config", "show", "-o", "json", "--config", &path_arg(&path)])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""topic_prefix": "home/zw/""#));
}
