// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::Config;
use serial_test::serial;
use std::path::PathBuf;

fn clear_env() {
    for key in [
        "VNC_BASE_DIR",
        "VNC_PORT_MIN",
        "VNC_PORT_MAX",
        "VNC_SERVER_IP",
        "VNC_STATE_FILE",
        "VNC_LOCK_FILE",
        "VNC_GRACE_MS",
        "VNC_KILL_MS",
        "VNC_SPAWN_TIMEOUT_MS",
        "VNC_ADOPTION_GRACE_S",
        "VNC_CLEANUP_INTERVAL_S",
        "VNC_NOVNC_WEB_ROOT",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_match_spec() {
    clear_env();
    let config = Config::load();
    assert_eq!(config.port_min, 6100);
    assert_eq!(config.port_max, 6999);
    assert_eq!(config.grace_ms, 2000);
    assert_eq!(config.kill_ms, 1000);
    assert_eq!(config.spawn_timeout_ms, 5000);
    assert_eq!(config.adoption_grace_s, 30);
    assert_eq!(config.cleanup_interval_s, 60);
    assert_eq!(config.total_ports(), 900);
}

#[test]
#[serial]
fn env_overrides_win_over_defaults() {
    clear_env();
    std::env::set_var("VNC_PORT_MIN", "6200");
    std::env::set_var("VNC_PORT_MAX", "6209");
    std::env::set_var("VNC_SERVER_IP", "10.0.0.5");
    std::env::set_var("VNC_STATE_FILE", "/tmp/custom-state.json");

    let config = Config::load();

    assert_eq!(config.port_min, 6200);
    assert_eq!(config.port_max, 6209);
    assert_eq!(config.server_ip, "10.0.0.5");
    assert_eq!(config.state_file, PathBuf::from("/tmp/custom-state.json"));
    assert_eq!(config.total_ports(), 10);

    clear_env();
}

#[test]
#[serial]
fn malformed_numeric_env_falls_back_to_default() {
    clear_env();
    std::env::set_var("VNC_PORT_MIN", "not-a-number");
    let config = Config::load();
    assert_eq!(config.port_min, 6100);
    clear_env();
}

#[test]
#[serial]
fn base_dir_prefers_xdg_state_home_over_home() {
    clear_env();
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg-state");
    std::env::set_var("HOME", "/tmp/home");

    let config = Config::load();

    assert_eq!(
        config.state_file,
        PathBuf::from("/tmp/xdg-state/vnc-broker/ws_ports.json")
    );

    std::env::remove_var("XDG_STATE_HOME");
    std::env::remove_var("HOME");
    clear_env();
}

#[test]
#[serial]
fn base_dir_falls_back_to_home_local_state() {
    clear_env();
    std::env::remove_var("XDG_STATE_HOME");
    std::env::set_var("HOME", "/tmp/home");

    let config = Config::load();

    assert_eq!(
        config.lock_file,
        PathBuf::from("/tmp/home/.local/state/vnc-broker/ws_ports.lock")
    );

    std::env::remove_var("HOME");
    clear_env();
}

#[test]
#[serial]
fn vnc_base_dir_overrides_the_fallback_chain() {
    clear_env();
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg-state");
    std::env::set_var("VNC_BASE_DIR", "/tmp/explicit-base");

    let config = Config::load();

    assert_eq!(
        config.state_file,
        PathBuf::from("/tmp/explicit-base/ws_ports.json")
    );

    std::env::remove_var("XDG_STATE_HOME");
    clear_env();
}
