// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Session Coordinator (`spec.md` §4.3): a small, atomic Start/Stop/List
//! API composing the Port Pool and the Process Supervisor with rollback.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;
use vnc_adapters::ProcessSupervisor;
use vnc_core::{vnc_url, BrokerError, Config, Session};
use vnc_storage::PortPool;

/// Per-process singleton coordinating session lifecycle. The in-memory
/// registry only needs a per-process mutex — durable truth lives in the
/// Port Pool (`spec.md` §5).
pub struct SessionCoordinator {
    config: Config,
    port_pool: Arc<PortPool>,
    supervisor: Arc<dyn ProcessSupervisor>,
    registry: Mutex<HashMap<String, Session>>,
}

impl SessionCoordinator {
    pub fn new(
        config: Config,
        port_pool: Arc<PortPool>,
        supervisor: Arc<dyn ProcessSupervisor>,
    ) -> Self {
        SessionCoordinator {
            config,
            port_pool,
            supervisor,
            registry: Mutex::new(HashMap::new()),
        }
    }

    /// `spec.md` §4.3 `Start`: preempt, allocate, spawn, promote, register.
    pub async fn start(
        &self,
        vm_name: &str,
        vnc_host: &str,
        vnc_port: u16,
    ) -> Result<Session, BrokerError> {
        if self.registry.lock().contains_key(vm_name) {
            // Proceed regardless of whether the preemptive stop fully
            // succeeds; the new spawn will reuse-or-replace resources.
            if let Err(e) = self.stop(vm_name).await {
                warn!(vm_name, error = %e, "preemptive stop failed, continuing with start");
            }
        }

        let ws_port = self.port_pool.allocate(vm_name)?;

        let pid = match self
            .supervisor
            .spawn(vm_name, vnc_host, vnc_port, ws_port)
            .await
        {
            Ok(pid) => pid,
            Err(e) => {
                if let Err(release_err) = self.port_pool.release(ws_port, Some(vm_name)) {
                    warn!(vm_name, ws_port, error = %release_err, "rollback release after spawn failure also failed");
                }
                return Err(e);
            }
        };

        if let Err(e) = self.port_pool.promote(ws_port, pid) {
            if let Err(terminate_err) = self.supervisor.terminate(pid).await {
                warn!(vm_name, pid, error = %terminate_err, "rollback terminate after promote failure also failed");
            }
            if let Err(release_err) = self.port_pool.release(ws_port, Some(vm_name)) {
                warn!(vm_name, ws_port, error = %release_err, "rollback release after promote failure also failed");
            }
            return Err(e);
        }

        let session = Session {
            vm_name: vm_name.to_string(),
            vnc_host: vnc_host.to_string(),
            vnc_port,
            ws_port,
            pid,
            url: vnc_url(&self.config.server_ip, ws_port),
        };
        self.registry
            .lock()
            .insert(vm_name.to_string(), session.clone());
        Ok(session)
    }

    /// `spec.md` §4.3 `Stop`: terminate (best-effort), release, deregister.
    pub async fn stop(&self, vm_name: &str) -> Result<bool, BrokerError> {
        let session = self.registry.lock().remove(vm_name);
        let Some(session) = session else {
            return Ok(false);
        };

        if let Err(e) = self.supervisor.terminate(session.pid).await {
            warn!(vm_name, pid = session.pid, error = %e, "terminate failed during stop, releasing port anyway");
        }
        self.port_pool.release(session.ws_port, Some(vm_name))?;
        Ok(true)
    }

    /// `spec.md` §4.3 `List`.
    pub fn list(&self) -> Vec<Session> {
        self.registry.lock().values().cloned().collect()
    }
}

#[cfg(test)]
#[path = "session_coordinator_tests.rs"]
mod tests;
