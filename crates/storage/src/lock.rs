// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cross-process advisory lock that serializes every Port Pool mutation.
//!
//! A per-thread mutex is not enough: API workers and the cleanup daemon are
//! separate OS processes, so the lock has to be a real file lock, auto-
//! released when its holder dies.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::thread;
use std::time::Duration;

use fs2::FileExt;
use vnc_core::BrokerError;

/// Backoff schedule for a contended lock (`spec.md` §4.1).
const RETRY_BACKOFF_MS: [u64; 3] = [10, 50, 250];

/// Acquire the exclusive lock at `path`, retrying with the documented
/// backoff schedule before giving up.
///
/// The returned `File` must be kept alive for the duration of the critical
/// section; the lock releases when it is dropped.
pub fn acquire_exclusive(path: &Path) -> Result<File, BrokerError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            BrokerError::PortAllocationError(format!(
                "creating lock file directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    // Opened write+create+no-truncate so acquiring never clobbers a
    // concurrent holder's file before the lock itself is granted.
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| {
            BrokerError::PortAllocationError(format!("opening lock file {}: {e}", path.display()))
        })?;

    let last_attempt = RETRY_BACKOFF_MS.len() - 1;
    for (attempt, delay_ms) in RETRY_BACKOFF_MS.iter().enumerate() {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(file),
            Err(e) if attempt == last_attempt => {
                return Err(BrokerError::PortAllocationError(format!(
                    "failed to acquire VNC port pool lock after {} attempts: {e}",
                    RETRY_BACKOFF_MS.len()
                )));
            }
            Err(_) => {
                tracing::debug!(
                    attempt,
                    delay_ms,
                    path = %path.display(),
                    "VNC port pool lock contended, backing off"
                );
                thread::sleep(Duration::from_millis(*delay_ms));
            }
        }
    }

    unreachable!("loop above always returns on its last iteration")
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
