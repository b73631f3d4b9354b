// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! vnc-cleanupd: the Cleanup Daemon (`spec.md` §4.5).
//!
//! Runs `ReconcileStale` on a fixed cadence and logs a summary each tick.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use vnc_adapters::WebsockifySupervisor;
use vnc_core::{BrokerError, Config, ReconcileReport, SystemClock};
use vnc_engine::Reconciler;
use vnc_storage::PortPool;

/// High-water mark, as a percentage of the managed port range, above which
/// the daemon warns operators of pool pressure (`SPEC_FULL.md` §4.5).
const UTILIZATION_WARNING_PERCENT: f64 = 90.0;

pub struct Daemon {
    reconciler: Reconciler,
    port_pool: Arc<PortPool>,
    interval: Duration,
}

impl Daemon {
    pub fn new(config: Config) -> Self {
        let interval = Duration::from_secs(config.cleanup_interval_s);
        let clock = Arc::new(SystemClock);
        let supervisor = Arc::new(WebsockifySupervisor::new(config.clone()));
        let port_pool = Arc::new(PortPool::new(config, clock, supervisor));
        let reconciler = Reconciler::new(Arc::clone(&port_pool));
        Daemon {
            reconciler,
            port_pool,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one reconciliation pass, logging a summary and surfacing pool
    /// pressure (`spec.md` §4.5, `SPEC_FULL.md` §4.5 supplement).
    pub fn tick(&self) -> Result<ReconcileReport, BrokerError> {
        let report = self.reconciler.reconcile_once()?;

        if report.stale_released > 0 || report.adopted > 0 || report.drift_warnings > 0 {
            info!(
                stale_released = report.stale_released,
                adopted = report.adopted,
                drift_warnings = report.drift_warnings,
                "reconcile tick completed"
            );
        } else {
            debug!("reconcile tick: nothing to do");
        }

        match self.port_pool.stats() {
            Ok(stats) if stats.utilization_percent >= UTILIZATION_WARNING_PERCENT => {
                warn!(
                    utilization_percent = stats.utilization_percent,
                    "port pool utilization is high"
                );
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to read pool stats after tick"),
        }

        Ok(report)
    }
}

/// Install a `tracing-subscriber` with `EnvFilter`, defaulting to `info`.
pub fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
