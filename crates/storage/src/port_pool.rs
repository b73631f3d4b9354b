// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Port Pool: sole authority on which `ws_port` values are in use
//! (`spec.md` §4.1).

use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use vnc_core::{
    BrokerError, Clock, Config, PoolStats, PortAllocation, PortPoolState, ProcessProbe,
    ReconcileReport, ADOPTED_VM_NAME,
};

use crate::commit::{commit_state, load_state};
use crate::lock::acquire_exclusive;

/// Persistent, lock-protected map of `ws_port → owner(vm, pid, ts)`.
pub struct PortPool {
    config: Config,
    clock: Arc<dyn Clock>,
    probe: Arc<dyn ProcessProbe>,
}

impl PortPool {
    pub fn new(config: Config, clock: Arc<dyn Clock>, probe: Arc<dyn ProcessProbe>) -> Self {
        PortPool {
            config,
            clock,
            probe,
        }
    }

    /// Reserve the lowest OS-free port, recording it with `pid=None`
    /// (`spec.md` §4.1 `Allocate`).
    pub fn allocate(&self, vm_name: &str) -> Result<u16, BrokerError> {
        self.with_state(true, |state, pool| {
            if let Some(port) = pool.scan_and_claim(state) {
                pool.insert_reservation(state, port, vm_name);
                return Ok(port);
            }

            // Exhausted: reconcile once against OS reality and retry.
            pool.reconcile_locked(state);

            if let Some(port) = pool.scan_and_claim(state) {
                pool.insert_reservation(state, port, vm_name);
                return Ok(port);
            }

            Err(BrokerError::PoolExhausted)
        })
    }

    /// Set `pid` on an existing allocation (`spec.md` §4.1 `Promote`).
    pub fn promote(&self, ws_port: u16, pid: u32) -> Result<(), BrokerError> {
        self.with_state(true, |state, _pool| {
            match state.allocated.get_mut(&ws_port) {
                Some(allocation) if allocation.pid == Some(pid) => Ok(()),
                Some(allocation) => {
                    allocation.pid = Some(pid);
                    Ok(())
                }
                None => Err(BrokerError::NotAllocated(ws_port)),
            }
        })
    }

    /// Remove an allocation and return its port to `free` (`spec.md` §4.1
    /// `Release`). Idempotent; tolerant of a mismatched `vm_name`.
    pub fn release(&self, ws_port: u16, vm_name: Option<&str>) -> Result<(), BrokerError> {
        self.with_state(true, |state, pool| {
            if let Some(allocation) = state.allocated.remove(&ws_port) {
                if let Some(expected) = vm_name {
                    if allocation.vm_name != expected {
                        tracing::warn!(
                            ws_port,
                            expected_vm = expected,
                            actual_vm = %allocation.vm_name,
                            "releasing port for mismatched vm_name"
                        );
                    }
                }
            }
            if pool.config.port_min <= ws_port
                && ws_port <= pool.config.port_max
                && !state.free.contains(&ws_port)
            {
                state.free.push(ws_port);
            }
            Ok(())
        })
    }

    /// Current pool statistics (`spec.md` §4.1 `Stats`). Read-only: does not
    /// commit a new document.
    pub fn stats(&self) -> Result<PoolStats, BrokerError> {
        self.with_state(false, |state, pool| {
            let total = pool.config.total_ports();
            let allocated = state.allocated.len() as u32;
            let free = state.free.len() as u32;
            let utilization_percent = if total == 0 {
                0.0
            } else {
                f64::from(allocated) / f64::from(total) * 100.0
            };
            Ok(PoolStats {
                total,
                allocated,
                free,
                utilization_percent,
                last_cleanup: state.last_cleanup,
            })
        })
    }

    /// Find the current allocation for `vm_name`, if any. Read-only; used by
    /// administrative tooling that has no long-lived in-memory registry to
    /// consult (`vnc-cli`'s one-shot invocations).
    pub fn find_allocation(
        &self,
        vm_name: &str,
    ) -> Result<Option<(u16, PortAllocation)>, BrokerError> {
        self.with_state(false, |state, _pool| {
            Ok(state
                .allocated
                .iter()
                .find(|(_, allocation)| allocation.vm_name == vm_name)
                .map(|(port, allocation)| (*port, allocation.clone())))
        })
    }

    /// All current allocations, sorted by port. Read-only.
    pub fn list_allocations(&self) -> Result<Vec<(u16, PortAllocation)>, BrokerError> {
        self.with_state(false, |state, _pool| {
            Ok(state
                .allocated
                .iter()
                .map(|(port, allocation)| (*port, allocation.clone()))
                .collect())
        })
    }

    /// Restore coherence between durable state and OS reality
    /// (`spec.md` §4.4 `ReconcileStale`).
    pub fn reconcile_stale(&self) -> Result<ReconcileReport, BrokerError> {
        self.with_state(true, |state, pool| Ok(pool.reconcile_locked(state)))
    }

    /// Run one locked read-modify-write-commit cycle over the durable
    /// document (`spec.md` §4.1, algorithm "atomic commit").
    fn with_state<T>(
        &self,
        mutate: bool,
        f: impl FnOnce(&mut PortPoolState, &Self) -> Result<T, BrokerError>,
    ) -> Result<T, BrokerError> {
        let _lock_file = acquire_exclusive(&self.config.lock_file)?;

        let mut state = load_state(
            &self.config.state_file,
            self.config.port_min,
            self.config.port_max,
            self.clock.now(),
        )?;

        let result = f(&mut state, self)?;

        if mutate {
            state.free.sort_unstable();
            commit_state(&self.config.state_file, &state)?;
        }

        Ok(result)
    }

    /// Scan `free` ascending for the first OS-free port, dropping any
    /// bind-probe-busy port from `free` along the way (`spec.md` §4.1,
    /// "Tie-break and ordering").
    fn scan_and_claim(&self, state: &mut PortPoolState) -> Option<u16> {
        let candidates = state.free.clone();
        for port in candidates {
            state.free.retain(|p| *p != port);
            if self.probe.is_port_free_os(port) {
                return Some(port);
            }
            tracing::warn!(
                ws_port = port,
                "port bind-probed busy despite pool bookkeeping; dropping from free list"
            );
        }
        None
    }

    fn insert_reservation(&self, state: &mut PortPoolState, port: u16, vm_name: &str) {
        state.allocated.insert(
            port,
            PortAllocation {
                vm_name: vm_name.to_string(),
                pid: None,
                allocated_at: self.clock.now(),
            },
        );
    }

    /// `spec.md` §4.4: pid-less stale reservations, dead-pid releases,
    /// drift warnings, and orphan adoption. Assumes the caller already holds
    /// the pool's lock.
    fn reconcile_locked(&self, state: &mut PortPoolState) -> ReconcileReport {
        let now = self.clock.now();
        let mut report = ReconcileReport::default();
        let adoption_grace = ChronoDuration::seconds(self.config.adoption_grace_s as i64);

        let snapshot: Vec<(u16, PortAllocation)> = state
            .allocated
            .iter()
            .map(|(port, allocation)| (*port, allocation.clone()))
            .collect();

        for (port, allocation) in snapshot {
            match allocation.pid {
                None => {
                    let age = now - allocation.allocated_at;
                    if age >= adoption_grace && self.probe.is_port_free_os(port) {
                        state.allocated.remove(&port);
                        state.free.push(port);
                        report.stale_released += 1;
                    }
                }
                Some(pid) => {
                    if !self.probe.is_alive(pid) {
                        if self.probe.is_port_free_os(port) {
                            state.allocated.remove(&port);
                            state.free.push(port);
                            report.stale_released += 1;
                        } else {
                            report.drift_warnings += 1;
                            tracing::warn!(
                                ws_port = port,
                                pid,
                                "dead pid still occupies port at OS level; operator intervention required"
                            );
                        }
                    }
                }
            }
        }

        for (pid, ws_port) in self.probe.enumerate_websockify() {
            match state.allocated.get_mut(&ws_port) {
                Some(existing) => {
                    if existing.pid != Some(pid) {
                        existing.pid = Some(pid);
                    }
                }
                None => {
                    state.allocated.insert(
                        ws_port,
                        PortAllocation {
                            vm_name: ADOPTED_VM_NAME.to_string(),
                            pid: Some(pid),
                            allocated_at: now,
                        },
                    );
                    state.free.retain(|p| *p != ws_port);
                    report.adopted += 1;
                }
            }
        }

        state.free.sort_unstable();
        state.last_cleanup = now;
        report
    }
}

#[cfg(test)]
#[path = "port_pool_tests.rs"]
mod tests;
