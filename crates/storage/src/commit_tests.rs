// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{commit_state, load_state};
use chrono::Utc;

#[test]
fn load_state_reconstructs_a_fresh_pool_when_file_is_absent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ws_ports.json");
    let now = Utc::now();

    let state = load_state(&path, 6100, 6102, now).expect("load");
    assert!(state.allocated.is_empty());
    assert_eq!(state.free, vec![6100, 6101, 6102]);
}

#[test]
fn load_state_reconstructs_a_fresh_pool_when_file_is_malformed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ws_ports.json");
    std::fs::write(&path, b"not json").expect("write garbage");
    let now = Utc::now();

    let state = load_state(&path, 6100, 6101, now).expect("load falls back");
    assert_eq!(state.free, vec![6100, 6101]);
}

#[test]
fn commit_then_load_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ws_ports.json");
    let now = Utc::now();

    let mut state = vnc_core::PortPoolState::fresh(6100, 6101, now);
    state.free.retain(|p| *p != 6100);
    state.allocated.insert(
        6100,
        vnc_core::PortAllocation {
            vm_name: "vmA".to_string(),
            pid: Some(4242),
            allocated_at: now,
        },
    );

    commit_state(&path, &state).expect("commit");
    let reloaded = load_state(&path, 6100, 6101, now).expect("load");
    assert_eq!(reloaded, state);
}

#[test]
fn commit_leaves_no_temp_file_behind() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ws_ports.json");
    let state = vnc_core::PortPoolState::fresh(6100, 6100, Utc::now());

    commit_state(&path, &state).expect("commit");
    assert!(!dir.path().join("ws_ports.json.tmp").exists());
}
