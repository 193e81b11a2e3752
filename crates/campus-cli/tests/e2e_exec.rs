//! E2E tests for `campus exec` and `campus request`.

mod common;

use common::{campus_cmd, campus_cmd_in, write_project_config};
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::{json, Value};

// ─── exec ─────────────────────────────────────────────────────────

#[test]
fn exec_runs_builtin() {
    let (mut cmd, _guard) = campus_cmd();
    cmd.args(["exec", "version"])
        .assert()
        .success()
        .stdout(contains("CampusWorld v"));
}

#[test]
fn exec_runs_every_invocation() {
    let (mut cmd, _guard) = campus_cmd();
    cmd.args(["exec", "whoami; version"])
        .assert()
        .success()
        .stdout(contains("User: cli").and(contains("CampusWorld v")));
}

#[test]
fn exec_unknown_command_fails() {
    let (mut cmd, _guard) = campus_cmd();
    cmd.args(["exec", "teleport", "home"])
        .assert()
        .failure()
        .stdout(contains("Command 'teleport' was not found."));
}

#[test]
fn exec_denies_admin_command_to_user() {
    let (mut cmd, _guard) = campus_cmd();
    cmd.args(["exec", "sessions"])
        .assert()
        .failure()
        .stdout(contains("Permission denied for command 'sessions'."));
}

#[test]
fn exec_role_flag_grants_access() {
    let (mut cmd, _guard) = campus_cmd();
    cmd.args(["exec", "--role", "admin", "sessions"])
        .assert()
        .success()
        .stdout(contains("0 active session(s)"));
}

#[test]
fn exec_permission_flag_is_checked() {
    let (mut cmd, _guard) = campus_cmd();
    cmd.args(["exec", "--permission", "user.*", "perm", "user.create"])
        .assert()
        .success()
        .stdout(contains("You hold 'user.create'."));
}

#[test]
fn exec_json_output() {
    let (mut cmd, _guard) = campus_cmd();
    let output = cmd
        .args(["exec", "--json", "--user", "ghost", "whoami"])
        .output()
        .expect("run campus");
    assert!(output.status.success());

    let response: Value =
        serde_json::from_slice(&output.stdout).expect("stdout is one JSON document");
    assert_eq!(response["success"], true);
    assert_eq!(response["data"]["username"], "ghost");
    assert_eq!(response["data"]["roles"], json!(["guest"]));
    assert_eq!(response["error"], Value::Null);
}

#[test]
fn exec_game_state_flag() {
    let (mut cmd, _guard) = campus_cmd();
    let output = cmd
        .args(["exec", "--json", "--state", "current_game=chess", "whoami"])
        .output()
        .expect("run campus");
    assert!(output.status.success());
}

#[test]
fn exec_uses_configured_identity() {
    let dir = tempfile::tempdir().unwrap();
    write_project_config(
        &dir,
        r#"
[[identities]]
username = "root"
roles = ["owner"]
"#,
    );
    campus_cmd_in(&dir)
        .args(["exec", "--user", "root", "whoami"])
        .assert()
        .success()
        .stdout(contains("Roles: owner"));
}

#[test]
fn exec_honours_configured_separator() {
    let dir = tempfile::tempdir().unwrap();
    write_project_config(&dir, "[shell]\nseparator = \"|\"\n");
    campus_cmd_in(&dir)
        .args(["exec", "version | whoami"])
        .assert()
        .success()
        .stdout(contains("CampusWorld v").and(contains("User: cli")));
}

#[test]
fn exec_rejects_bad_state() {
    let (mut cmd, _guard) = campus_cmd();
    cmd.args(["exec", "--state", "novalue", "help"])
        .assert()
        .failure()
        .stderr(contains("expected KEY=VALUE"));
}

#[test]
fn malformed_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_project_config(&dir, "[server\nport =");
    campus_cmd_in(&dir)
        .args(["exec", "help"])
        .assert()
        .failure()
        .stderr(contains("Config error").and(contains("config.toml")));
}

// ─── request ──────────────────────────────────────────────────────

#[test]
fn request_from_stdin() {
    let (mut cmd, _guard) = campus_cmd();
    let output = cmd
        .arg("request")
        .write_stdin(r#"{"command_line": "whoami", "caller_id": "u-9", "roles": ["developer"]}"#)
        .output()
        .expect("run campus");
    assert!(output.status.success());

    let response: Value = serde_json::from_slice(&output.stdout).expect("JSON response");
    assert_eq!(response["data"]["caller_id"], "u-9");
    assert_eq!(response["data"]["roles"], json!(["developer"]));
}

#[test]
fn request_from_argument() {
    let (mut cmd, _guard) = campus_cmd();
    cmd.args(["request", r#"{"command_line": "nothing-here"}"#])
        .assert()
        .failure()
        .stdout(contains(r#""error":"not found""#));
}

#[test]
fn request_invalid_json() {
    let (mut cmd, _guard) = campus_cmd();
    cmd.arg("request")
        .write_stdin("this is not json")
        .assert()
        .failure()
        .stdout(contains("invalid request"));
}

// ─── logging ──────────────────────────────────────────────────────

#[test]
fn log_file_receives_audit_events() {
    let (mut cmd, guard) = campus_cmd();
    let log = guard.path().join("logs").join("campus.log");
    cmd.arg("--log-file")
        .arg(&log)
        .args(["exec", "sessions"])
        .assert()
        .failure();

    let content = std::fs::read_to_string(&log).expect("log file written");
    assert!(content.contains("sessions"));
    assert!(!content.contains("\x1b["));
}
