//! Shared E2E test helpers for `campus` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::time::Duration;

/// Default timeout for CLI tests.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// Environment variables the config loader reads.
const CONFIG_VARS: &[&str] = &[
    "CAMPUS_DEBUG",
    "CAMPUS_HOST",
    "CAMPUS_PORT",
    "CAMPUS_REQUEST_PORT",
    "CAMPUS_MAX_CONNECTIONS",
    "CAMPUS_IDLE_TIMEOUT",
    "CAMPUS_CONTEXT_LABEL",
];

/// Build a Command for the `campus` binary isolated from user config.
///
/// The project root is a fresh tempdir and the global config points inside
/// it, so neither `~/.campus` nor the environment leaks in. Returns
/// (command, _guard); keep the guard alive for the test's duration.
pub fn campus_cmd() -> (assert_cmd::Command, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("create temp project dir");
    let cmd = campus_cmd_in(&tmp);
    (cmd, tmp)
}

/// Like [`campus_cmd`] but rooted in an existing directory.
pub fn campus_cmd_in(dir: &tempfile::TempDir) -> assert_cmd::Command {
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("campus");
    cmd.timeout(TIMEOUT_BASIC);
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG");
    cmd.arg("-C").arg(dir.path());
    cmd.arg("--config").arg(dir.path().join("global.toml"));
    cmd
}

/// Writes `<dir>/.campus/config.toml`.
pub fn write_project_config(dir: &tempfile::TempDir, content: &str) {
    let campus_dir = dir.path().join(".campus");
    std::fs::create_dir_all(&campus_dir).expect("create .campus dir");
    std::fs::write(campus_dir.join("config.toml"), content).expect("write project config");
}
