// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Facade over `PortPool::reconcile_stale` (`spec.md` §4.4) for callers that
//! only need reconciliation, not the full Session Coordinator — the cleanup
//! daemon and `vncctl reconcile`.

use std::sync::Arc;

use vnc_core::{BrokerError, ReconcileReport};
use vnc_storage::PortPool;

pub struct Reconciler {
    port_pool: Arc<PortPool>,
}

impl Reconciler {
    pub fn new(port_pool: Arc<PortPool>) -> Self {
        Reconciler { port_pool }
    }

    /// Run one reconciliation pass (`spec.md` §4.4 `ReconcileStale`).
    pub fn reconcile_once(&self) -> Result<ReconcileReport, BrokerError> {
        self.port_pool.reconcile_stale()
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
