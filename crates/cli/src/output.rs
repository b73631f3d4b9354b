// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use vnc_core::{PoolStats, PortAllocation, ReconcileReport, Session};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_session(session: &Session, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!("vm_name:  {}", session.vm_name);
            println!("ws_port:  {}", session.ws_port);
            println!("pid:      {}", session.pid);
            println!("url:      {}", session.url);
        }
        OutputFormat::Json => print_json(session),
    }
}

pub fn print_stopped(vm_name: &str, stopped: bool, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            if stopped {
                println!("stopped {vm_name}");
            } else {
                println!("no session for {vm_name}");
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "vm_name": vm_name,
            "stopped": stopped,
        })),
    }
}

pub fn print_allocations(allocations: &[(u16, PortAllocation)], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            if allocations.is_empty() {
                println!("no active sessions");
                return;
            }
            println!("{:<20} {:>8} {:>10}", "VM_NAME", "WS_PORT", "PID");
            for (port, allocation) in allocations {
                let pid = allocation
                    .pid
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<20} {:>8} {:>10}", allocation.vm_name, port, pid);
            }
        }
        OutputFormat::Json => print_json(
            &allocations
                .iter()
                .map(|(port, allocation)| {
                    serde_json::json!({
                        "ws_port": port,
                        "vm_name": allocation.vm_name,
                        "pid": allocation.pid,
                        "allocated_at": allocation.allocated_at,
                    })
                })
                .collect::<Vec<_>>(),
        ),
    }
}

pub fn print_stats(stats: &PoolStats, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!("total:       {}", stats.total);
            println!("allocated:   {}", stats.allocated);
            println!("free:        {}", stats.free);
            println!("utilization: {:.1}%", stats.utilization_percent);
            println!("last_cleanup: {}", stats.last_cleanup);
        }
        OutputFormat::Json => print_json(stats),
    }
}

pub fn print_report(report: &ReconcileReport, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!("stale_released: {}", report.stale_released);
            println!("adopted:        {}", report.adopted);
            println!("drift_warnings: {}", report.drift_warnings);
        }
        OutputFormat::Json => print_json(report),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("error: failed to serialize output: {e}"),
    }
}
