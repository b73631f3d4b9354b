// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-safe read/write of the Port Pool's durable document
//! (`spec.md` §4.1, §6).
//!
//! Writes go to a sibling temp file, fsync, rename-over-target, fsync the
//! parent directory. Rename is the commit point; a crash at any earlier step
//! leaves the previous document intact.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use vnc_core::{BrokerError, PortPoolState};

/// Load the state document, reconstructing a fresh one if it is absent or
/// malformed (`spec.md` §3 Lifecycle, §7 `StateCorrupt`).
pub fn load_state(
    path: &Path,
    port_min: u16,
    port_max: u16,
    now: DateTime<Utc>,
) -> Result<PortPoolState, BrokerError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(PortPoolState::fresh(port_min, port_max, now));
        }
        Err(e) => {
            return Err(BrokerError::StateCorrupt(format!(
                "reading {}: {e}",
                path.display()
            )))
        }
    };

    match serde_json::from_slice::<PortPoolState>(&bytes) {
        Ok(state) => Ok(state),
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "VNC port pool state file malformed, reconstructing fresh pool"
            );
            Ok(PortPoolState::fresh(port_min, port_max, now))
        }
    }
}

/// Atomically commit `state` to `path`.
pub fn commit_state(path: &Path, state: &PortPoolState) -> Result<(), BrokerError> {
    let parent = path.parent().ok_or_else(|| {
        BrokerError::CommitFailed(format!("{} has no parent directory", path.display()))
    })?;
    std::fs::create_dir_all(parent)
        .map_err(|e| BrokerError::CommitFailed(format!("creating {}: {e}", parent.display())))?;

    let tmp_name = format!(
        "{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("ws_ports.json")
    );
    let tmp_path = parent.join(tmp_name);

    let json = serde_json::to_vec_pretty(state)
        .map_err(|e| BrokerError::CommitFailed(format!("serializing state: {e}")))?;

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| BrokerError::CommitFailed(format!("creating {}: {e}", tmp_path.display())))?;
    tmp_file
        .write_all(&json)
        .map_err(|e| BrokerError::CommitFailed(format!("writing {}: {e}", tmp_path.display())))?;
    tmp_file
        .sync_all()
        .map_err(|e| BrokerError::CommitFailed(format!("fsync {}: {e}", tmp_path.display())))?;
    drop(tmp_file);

    std::fs::rename(&tmp_path, path)
        .map_err(|e| BrokerError::CommitFailed(format!("renaming onto {}: {e}", path.display())))?;

    let dir = File::open(parent)
        .map_err(|e| BrokerError::CommitFailed(format!("opening {}: {e}", parent.display())))?;
    dir.sync_all()
        .map_err(|e| BrokerError::CommitFailed(format!("fsync dir {}: {e}", parent.display())))?;

    Ok(())
}

#[cfg(test)]
#[path = "commit_tests.rs"]
mod tests;
