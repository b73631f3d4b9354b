// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! vncctl - administrative CLI for the VNC session broker.
//!
//! Each invocation is a short-lived process: Start/Stop/List act directly on
//! the durably recorded Port Pool state rather than an in-memory Session
//! Coordinator registry, since no long-lived registry survives between
//! separate CLI invocations (`spec.md` §5 reserves the in-memory registry for
//! a per-process singleton — here that singleton's lifetime is one command).

mod output;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use output::OutputFormat;
use vnc_adapters::{ProcessSupervisor, WebsockifySupervisor};
use vnc_core::{Config, SystemClock};
use vnc_engine::{Reconciler, SessionCoordinator};
use vnc_storage::PortPool;

#[derive(Parser)]
#[command(
    name = "vncctl",
    version,
    about = "VNC session broker administrative CLI"
)]
struct Cli {
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start (or replace) a VNC session for a VM
    Start {
        vm_name: String,
        /// Host the target VM's VNC server listens on
        #[arg(long, default_value = "127.0.0.1")]
        vnc_host: String,
        /// Port the target VM's VNC server listens on
        #[arg(long)]
        vnc_port: u16,
    },
    /// Stop a VM's VNC session
    Stop { vm_name: String },
    /// List every currently allocated session
    List,
    /// Show port pool statistics
    Stats,
    /// Run one reconciliation pass
    Reconcile,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load();

    let clock = Arc::new(SystemClock);
    let supervisor: Arc<dyn ProcessSupervisor> =
        Arc::new(WebsockifySupervisor::new(config.clone()));
    let port_pool = Arc::new(PortPool::new(
        config.clone(),
        clock,
        Arc::clone(&supervisor) as Arc<dyn vnc_core::ProcessProbe>,
    ));

    match cli.command {
        Command::Start {
            vm_name,
            vnc_host,
            vnc_port,
        } => {
            // Preempt any session this VM already holds durably, since no
            // in-memory registry from a prior invocation exists to do it.
            preempt_durable(&port_pool, supervisor.as_ref(), &vm_name).await?;

            let coordinator =
                SessionCoordinator::new(config, Arc::clone(&port_pool), Arc::clone(&supervisor));
            let session = coordinator.start(&vm_name, &vnc_host, vnc_port).await?;
            output::print_session(&session, cli.output);
        }
        Command::Stop { vm_name } => {
            let stopped = preempt_durable(&port_pool, supervisor.as_ref(), &vm_name).await?;
            output::print_stopped(&vm_name, stopped, cli.output);
        }
        Command::List => {
            let allocations = port_pool.list_allocations()?;
            output::print_allocations(&allocations, cli.output);
        }
        Command::Stats => {
            let stats = port_pool.stats()?;
            output::print_stats(&stats, cli.output);
        }
        Command::Reconcile => {
            let reconciler = Reconciler::new(Arc::clone(&port_pool));
            let report = reconciler.reconcile_once()?;
            output::print_report(&report, cli.output);
        }
    }

    Ok(())
}

/// Tear down `vm_name`'s durably recorded session, if any: terminate its
/// process (best-effort) and release its port (`spec.md` §4.3 `Stop`,
/// adapted to source the pid from the Port Pool instead of an in-memory
/// registry). Returns whether a session existed.
async fn preempt_durable(
    port_pool: &PortPool,
    supervisor: &dyn ProcessSupervisor,
    vm_name: &str,
) -> Result<bool> {
    let Some((ws_port, allocation)) = port_pool.find_allocation(vm_name)? else {
        return Ok(false);
    };

    if let Some(pid) = allocation.pid {
        if let Err(e) = supervisor.terminate(pid).await {
            eprintln!("warning: terminate failed for pid {pid}: {e}");
        }
    }
    port_pool.release(ws_port, Some(vm_name))?;
    Ok(true)
}
