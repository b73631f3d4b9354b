// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The async half of the Process Supervisor (`spec.md` §4.2). The
//! synchronous liveness/probe half is `vnc_core::ProcessProbe`, implemented
//! alongside this trait by the same concrete type.

use async_trait::async_trait;
use vnc_core::{BrokerError, ProcessProbe};

/// Spawns and terminates the `websockify` bridge processes that back each
/// VNC console session.
#[async_trait]
pub trait ProcessSupervisor: ProcessProbe {
    /// Start `websockify` bridging `ws_port ↔ vnc_host:vnc_port`, resolve
    /// its PID, and return it (`spec.md` §4.2 `Spawn`).
    async fn spawn(
        &self,
        vm_name: &str,
        vnc_host: &str,
        vnc_port: u16,
        ws_port: u16,
    ) -> Result<u32, BrokerError>;

    /// Send a graceful termination signal, then a forceful one if the
    /// process is still alive after `GRACE_MS` (`spec.md` §4.2 `Terminate`).
    async fn terminate(&self, pid: u32) -> Result<(), BrokerError>;
}
