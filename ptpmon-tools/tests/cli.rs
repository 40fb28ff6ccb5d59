use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;

fn ptp_monitor() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ptp-monitor"))
}

#[test]
fn missing_path_is_a_usage_error() {
    ptp_monitor()
        .assert()
        .failure()
        .code(1)
        .stderr(contains("path to the JSON Lines remote monitoring log"))
        .stderr(contains("Usage:"));
}

#[test]
fn help_exits_cleanly() {
    ptp_monitor()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--from-end"))
        .stdout(contains("replayed"));
}

#[test]
fn unreadable_log_fails_before_touching_the_terminal() {
    let dir = tempfile::tempdir().unwrap();
    ptp_monitor()
        .arg(dir.path().join("absent.jsonl"))
        .assert()
        .failure()
        .stderr(contains("Failed to open"));
}
