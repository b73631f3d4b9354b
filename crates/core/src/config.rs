// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Explicit configuration for the broker.
//!
//! No hidden globals: every component is constructed with a `Config` value
//! rather than reaching for a `lazy_static` or singleton default.

use std::path::PathBuf;

const DEFAULT_PORT_MIN: u16 = 6100;
const DEFAULT_PORT_MAX: u16 = 6999;
const DEFAULT_GRACE_MS: u64 = 2000;
const DEFAULT_KILL_MS: u64 = 1000;
const DEFAULT_SPAWN_TIMEOUT_MS: u64 = 5000;
const DEFAULT_ADOPTION_GRACE_S: u64 = 30;
const DEFAULT_CLEANUP_INTERVAL_S: u64 = 60;
const DEFAULT_BASE_DIR: &str = "/var/lib/vnc-broker";

/// Configuration recognized by every broker component (`spec.md` §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Lower bound of the broker-managed WebSocket port range (inclusive).
    pub port_min: u16,
    /// Upper bound of the broker-managed WebSocket port range (inclusive).
    pub port_max: u16,
    /// Host used in generated VNC URLs.
    pub server_ip: String,
    /// Path to the durable port pool state document.
    pub state_file: PathBuf,
    /// Path to the advisory lock file.
    pub lock_file: PathBuf,
    /// Graceful-termination wait, in milliseconds, before a forceful kill.
    pub grace_ms: u64,
    /// Wait, in milliseconds, after a forceful kill before declaring failure.
    pub kill_ms: u64,
    /// Upper bound, in milliseconds, on one `Spawn` call.
    pub spawn_timeout_ms: u64,
    /// Age, in seconds, at which a pid-less allocation becomes eligible for
    /// reclamation by the reconciler.
    pub adoption_grace_s: u64,
    /// Cleanup daemon cadence, in seconds.
    pub cleanup_interval_s: u64,
    /// Filesystem path passed to `websockify --web`.
    pub novnc_web_root: PathBuf,
}

impl Config {
    /// Load configuration from the environment, falling back to the
    /// documented defaults (`spec.md` §6) for anything unset.
    pub fn load() -> Self {
        let base_dir = env_path("VNC_BASE_DIR", default_base_dir());

        Config {
            port_min: env_u16("VNC_PORT_MIN", DEFAULT_PORT_MIN),
            port_max: env_u16("VNC_PORT_MAX", DEFAULT_PORT_MAX),
            server_ip: std::env::var("VNC_SERVER_IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            state_file: env_path("VNC_STATE_FILE", base_dir.join("ws_ports.json")),
            lock_file: env_path("VNC_LOCK_FILE", base_dir.join("ws_ports.lock")),
            grace_ms: env_u64("VNC_GRACE_MS", DEFAULT_GRACE_MS),
            kill_ms: env_u64("VNC_KILL_MS", DEFAULT_KILL_MS),
            spawn_timeout_ms: env_u64("VNC_SPAWN_TIMEOUT_MS", DEFAULT_SPAWN_TIMEOUT_MS),
            adoption_grace_s: env_u64("VNC_ADOPTION_GRACE_S", DEFAULT_ADOPTION_GRACE_S),
            cleanup_interval_s: env_u64("VNC_CLEANUP_INTERVAL_S", DEFAULT_CLEANUP_INTERVAL_S),
            novnc_web_root: env_path("VNC_NOVNC_WEB_ROOT", base_dir.join("novnc")),
        }
    }

    /// Total number of ports in the managed range, inclusive.
    pub fn total_ports(&self) -> u32 {
        u32::from(self.port_max) - u32::from(self.port_min) + 1
    }
}

/// Resolve the state directory when `VNC_BASE_DIR` itself is unset:
/// `XDG_STATE_HOME/vnc-broker` > `~/.local/state/vnc-broker` > the static
/// system default, for hosts (e.g. a root-owned systemd unit) with neither
/// `XDG_STATE_HOME` nor `HOME` in its environment.
fn default_base_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("vnc-broker");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/vnc-broker");
    }
    PathBuf::from(DEFAULT_BASE_DIR)
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var_os(key).map(PathBuf::from).unwrap_or(default)
}

fn env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
