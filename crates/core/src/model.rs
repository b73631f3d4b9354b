// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The broker's data model (`spec.md` §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder `vm_name` recorded by the reconciler for an externally
/// spawned `websockify` process it did not itself start (`spec.md` §4.4,
/// §9 Open Questions).
pub const ADOPTED_VM_NAME: &str = "__adopted__";

/// One record per in-use WebSocket port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAllocation {
    pub vm_name: String,
    /// `None` only during the brief "allocated but not yet spawned" window
    /// inside the Coordinator (`spec.md` §3, entity `PortAllocation`).
    pub pid: Option<u32>,
    pub allocated_at: DateTime<Utc>,
}

/// The durable document owned exclusively by the Port Pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortPoolState {
    pub allocated: BTreeMap<u16, PortAllocation>,
    pub free: Vec<u16>,
    pub last_cleanup: DateTime<Utc>,
}

impl PortPoolState {
    /// A fresh document with a full free list covering `[port_min, port_max]`
    /// (`spec.md` §3, Lifecycle: "The state document is created at first
    /// access with a full free list").
    pub fn fresh(port_min: u16, port_max: u16, now: DateTime<Utc>) -> Self {
        PortPoolState {
            allocated: BTreeMap::new(),
            free: (port_min..=port_max).collect(),
            last_cleanup: now,
        }
    }
}

/// In-memory view of a running session, returned to external callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub vm_name: String,
    pub vnc_host: String,
    pub vnc_port: u16,
    pub ws_port: u16,
    pub pid: u32,
    pub url: String,
}

/// Port pool statistics, returned by `Stats()` (`spec.md` §4.1, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total: u32,
    pub allocated: u32,
    pub free: u32,
    pub utilization_percent: f64,
    pub last_cleanup: DateTime<Utc>,
}

/// Outcome of one `ReconcileStale` pass, returned by `ReconcileOnce()`
/// (`spec.md` §4.4, §6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub stale_released: u32,
    pub adopted: u32,
    pub drift_warnings: u32,
}

/// Derive the VNC console URL for a WebSocket port (`spec.md` §3, `VncUrl`
/// derivation).
pub fn vnc_url(server_ip: &str, ws_port: u16) -> String {
    format!("http://{server_ip}:{ws_port}/vnc.html?host={server_ip}&port={ws_port}")
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
