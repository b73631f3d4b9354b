// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The OS-facing probe consumed by the Port Pool while it holds its lock
//! (`spec.md` §4.1, §4.4).
//!
//! `vnc-storage` depends on this trait, not on `vnc-adapters` directly, so
//! that reconciliation can run synchronously inside `PortPool`'s own
//! lock-acquisition without pulling tokio or process-spawning machinery into
//! the storage layer. The concrete implementation lives in `vnc-adapters`,
//! alongside the async `Spawn`/`Terminate` operations it shares a process
//! table with.

/// A synchronous window onto OS process and port state.
pub trait ProcessProbe: Send + Sync + 'static {
    /// Signal-0 / existence check.
    fn is_alive(&self, pid: u32) -> bool;

    /// Attempts a non-blocking bind to `localhost:ws_port`; success means
    /// the port is free at the OS level, independent of what the pool's own
    /// bookkeeping believes.
    fn is_port_free_os(&self, ws_port: u16) -> bool;

    /// Best-effort snapshot of `(pid, ws_port)` pairs for processes whose
    /// command line looks like a broker-managed `websockify` instance.
    fn enumerate_websockify(&self) -> Vec<(u32, u16)>;
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
