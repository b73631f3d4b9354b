// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The broker's error taxonomy, shared by every crate.
//!
//! Adapters translate OS errors into these variants at the boundary; nothing
//! upstream of an adapter should construct a `BrokerError` from a raw
//! `std::io::Error` without going through one of the `#[from]` conversions
//! below.

use thiserror::Error;

/// Errors raised anywhere in the VNC session broker.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// No free port available in `[PORT_MIN, PORT_MAX]`, even after an
    /// internal reconciliation pass.
    #[error("VNC port pool exhausted (no free ports in range)")]
    PoolExhausted,

    /// State file or lock file I/O failed, surfaced after the bounded
    /// lock-acquisition retry.
    #[error("VNC port allocation failed: {0}")]
    PortAllocationError(String),

    /// `Promote` was called for a port with no existing allocation.
    #[error("port {0} has no allocation to promote")]
    NotAllocated(u16),

    /// The atomic rename that commits a state write failed.
    #[error("failed to commit VNC port pool state: {0}")]
    CommitFailed(String),

    /// `websockify` did not start, or its PID could not be resolved by any
    /// of the three resolution steps.
    #[error("failed to spawn websockify for {vm_name}: {reason}")]
    SpawnFailed { vm_name: String, reason: String },

    /// The process would not die within `GRACE_MS + KILL_MS`.
    #[error("failed to terminate websockify process {pid}")]
    TerminateFailed { pid: u32 },

    /// The state file was unreadable and could not be reconstructed.
    #[error("VNC port pool state is corrupt: {0}")]
    StateCorrupt(String),

    /// Wrapper for any unexpected failure inside `Start`/`Stop`; always
    /// accompanies a successful rollback.
    #[error("VNC session coordination failed: {0}")]
    CoordinationError(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
