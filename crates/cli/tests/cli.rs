// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use assert_cmd::Command;

fn cmd(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vncctl").unwrap();
    cmd.env("VNC_PORT_MIN", "9200")
        .env("VNC_PORT_MAX", "9202")
        .env("VNC_STATE_FILE", dir.path().join("state.json"))
        .env("VNC_LOCK_FILE", dir.path().join("state.lock"));
    cmd
}

#[test]
fn list_on_a_fresh_pool_reports_no_active_sessions() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicates::str::contains("no active sessions"));
}

#[test]
fn stats_on_a_fresh_pool_reports_full_utilization_headroom() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicates::str::contains("total:       3"))
        .stdout(predicates::str::contains("allocated:   0"));
}

#[test]
fn stop_on_an_unknown_vm_reports_no_session() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(["stop", "no-such-vm"])
        .assert()
        .success()
        .stdout(predicates::str::contains("no session for no-such-vm"));
}

#[test]
fn reconcile_on_a_fresh_pool_reports_nothing_to_reconcile() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .arg("reconcile")
        .assert()
        .success()
        .stdout(predicates::str::contains("stale_released: 0"))
        .stdout(predicates::str::contains("adopted:        0"));
}

#[test]
fn stats_json_output_is_well_formed() {
    let dir = tempfile::tempdir().unwrap();
    let output = cmd(&dir)
        .args(["--output", "json", "stats"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["total"], 3);
    assert_eq!(value["allocated"], 0);
}
