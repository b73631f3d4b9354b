// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process supervisor for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use vnc_core::{BrokerError, ProcessProbe};

use crate::supervisor::ProcessSupervisor;

/// Recorded supervisor call, for assertions on call order/arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorCall {
    Spawn {
        vm_name: String,
        vnc_host: String,
        vnc_port: u16,
        ws_port: u16,
    },
    Terminate {
        pid: u32,
    },
}

struct FakeState {
    next_pid: u32,
    alive_pids: HashSet<u32>,
    busy_ports: HashSet<u16>,
    port_by_pid: HashMap<u32, u16>,
    websockify: Vec<(u32, u16)>,
    calls: Vec<SupervisorCall>,
    fail_spawn: bool,
    fail_terminate: bool,
}

/// In-memory stand-in for `WebsockifySupervisor`. Every `spawn` call
/// succeeds with a fresh synthetic pid unless `fail_spawn` is set.
#[derive(Clone)]
pub struct FakeProcessSupervisor {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeProcessSupervisor {
    fn default() -> Self {
        FakeProcessSupervisor {
            inner: Arc::new(Mutex::new(FakeState {
                next_pid: 1,
                alive_pids: HashSet::new(),
                busy_ports: HashSet::new(),
                port_by_pid: HashMap::new(),
                websockify: Vec::new(),
                calls: Vec::new(),
                fail_spawn: false,
                fail_terminate: false,
            })),
        }
    }
}

impl FakeProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SupervisorCall> {
        self.inner.lock().calls.clone()
    }

    pub fn set_fail_spawn(&self, fail: bool) {
        self.inner.lock().fail_spawn = fail;
    }

    pub fn set_fail_terminate(&self, fail: bool) {
        self.inner.lock().fail_terminate = fail;
    }

    pub fn mark_dead(&self, pid: u32) {
        self.inner.lock().alive_pids.remove(&pid);
    }

    pub fn mark_port_busy(&self, ws_port: u16) {
        self.inner.lock().busy_ports.insert(ws_port);
    }

    pub fn mark_port_free(&self, ws_port: u16) {
        self.inner.lock().busy_ports.remove(&ws_port);
    }

    /// Inject an externally-spawned process for adoption scenarios (S4).
    pub fn inject_websockify(&self, pid: u32, ws_port: u16) {
        let mut inner = self.inner.lock();
        inner.alive_pids.insert(pid);
        inner.busy_ports.insert(ws_port);
        inner.websockify.push((pid, ws_port));
    }

    pub fn remove_websockify(&self, pid: u32, ws_port: u16) {
        let mut inner = self.inner.lock();
        inner.alive_pids.remove(&pid);
        inner.busy_ports.remove(&ws_port);
        inner.websockify.retain(|entry| *entry != (pid, ws_port));
    }
}

#[async_trait]
impl ProcessSupervisor for FakeProcessSupervisor {
    async fn spawn(
        &self,
        vm_name: &str,
        vnc_host: &str,
        vnc_port: u16,
        ws_port: u16,
    ) -> Result<u32, BrokerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SupervisorCall::Spawn {
            vm_name: vm_name.to_string(),
            vnc_host: vnc_host.to_string(),
            vnc_port,
            ws_port,
        });

        if inner.fail_spawn {
            return Err(BrokerError::SpawnFailed {
                vm_name: vm_name.to_string(),
                reason: "fake supervisor configured to fail spawn".to_string(),
            });
        }

        let pid = inner.next_pid;
        inner.next_pid += 1;
        inner.alive_pids.insert(pid);
        inner.busy_ports.insert(ws_port);
        inner.port_by_pid.insert(pid, ws_port);
        Ok(pid)
    }

    async fn terminate(&self, pid: u32) -> Result<(), BrokerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SupervisorCall::Terminate { pid });

        if inner.fail_terminate {
            return Err(BrokerError::TerminateFailed { pid });
        }

        inner.alive_pids.remove(&pid);
        if let Some(port) = inner.port_by_pid.remove(&pid) {
            inner.busy_ports.remove(&port);
        }
        Ok(())
    }
}

impl ProcessProbe for FakeProcessSupervisor {
    fn is_alive(&self, pid: u32) -> bool {
        self.inner.lock().alive_pids.contains(&pid)
    }

    fn is_port_free_os(&self, ws_port: u16) -> bool {
        !self.inner.lock().busy_ports.contains(&ws_port)
    }

    fn enumerate_websockify(&self) -> Vec<(u32, u16)> {
        self.inner.lock().websockify.clone()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
