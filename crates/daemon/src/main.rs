// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `vnc-cleanupd`: runs the Cleanup Daemon (`spec.md` §4.5) on a fixed
//! cadence, or once and exits with `--once`.

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use vnc_core::Config;
use vnc_daemon::Daemon;

#[derive(Parser)]
#[command(name = "vnc-cleanupd", about = "VNC session broker cleanup daemon")]
struct Cli {
    /// Run a single reconciliation pass, print the report, and exit.
    #[arg(long)]
    once: bool,

    /// Override `VNC_CLEANUP_INTERVAL_S` for this run.
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    vnc_daemon::setup_logging();
    let cli = Cli::parse();

    let mut config = Config::load();
    if let Some(interval) = cli.interval {
        config.cleanup_interval_s = interval;
    }
    let daemon = Daemon::new(config);

    if cli.once {
        let report = daemon.tick()?;
        println!("{report:#?}");
        return Ok(());
    }

    info!(
        interval_s = daemon.interval().as_secs(),
        "cleanup daemon starting"
    );

    let mut ticker = tokio::time::interval(daemon.interval());
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        tokio::select! {
            // `tick()` runs to completion before this branch can be
            // re-selected, so a signal received mid-tick is only acted on
            // once the in-flight reconciliation has finished.
            _ = ticker.tick() => {
                if let Err(e) = daemon.tick() {
                    error!(error = %e, "reconcile tick failed");
                }
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, draining in-flight tick");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, draining in-flight tick");
                break;
            }
        }
    }

    info!("cleanup daemon stopped");
    Ok(())
}
