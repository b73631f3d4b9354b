// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The real Process Supervisor: spawns `websockify`, signals it natively,
//! and answers liveness/port/enumeration questions against the live OS
//! process table (`spec.md` §4.2).

use std::net::TcpListener;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use sysinfo::{ProcessExt, System, SystemExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::Instant;
use vnc_core::{BrokerError, Config, ProcessProbe};

use crate::supervisor::ProcessSupervisor;

/// Poll interval while waiting for a spawned process to bind its port, or
/// for a terminated process to actually exit.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct WebsockifySupervisor {
    config: Config,
}

impl WebsockifySupervisor {
    pub fn new(config: Config) -> Self {
        WebsockifySupervisor { config }
    }

    /// Step (a) of PID resolution: websockify rarely prints anything useful
    /// once it daemonizes, but if it does emit a bare PID on the first
    /// line, take it at face value.
    async fn pid_from_spawn_output(&self, child: &mut tokio::process::Child) -> Option<u32> {
        let stdout = child.stdout.take()?;
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        match tokio::time::timeout(Duration::from_millis(200), reader.read_line(&mut line)).await
        {
            Ok(Ok(n)) if n > 0 => line.trim().parse::<u32>().ok(),
            _ => None,
        }
    }

    /// Step (b): the native equivalent of `lsof -ti :ws_port` — find the
    /// listening socket's inode in `/proc/net/tcp`, then find the pid
    /// holding that inode open as a file descriptor. Port-binding evidence
    /// is authoritative regardless of the owning process's name or
    /// arguments, unlike step (c)'s cmdline scan.
    fn pid_from_port_probe(&self, ws_port: u16) -> Option<u32> {
        let inode = Self::listening_socket_inode(ws_port)?;
        Self::pid_owning_socket_inode(inode)
    }

    /// Scan `/proc/net/tcp` for a socket in `LISTEN` state (`st == 0A`)
    /// bound to `ws_port`, returning its inode.
    fn listening_socket_inode(ws_port: u16) -> Option<u64> {
        let contents = std::fs::read_to_string("/proc/net/tcp").ok()?;
        let port_hex = format!("{ws_port:04X}");
        contents.lines().skip(1).find_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let (_, local_port) = fields.get(1)?.split_once(':')?;
            let state = *fields.get(3)?;
            if state == "0A" && local_port.eq_ignore_ascii_case(&port_hex) {
                fields.get(9)?.parse::<u64>().ok()
            } else {
                None
            }
        })
    }

    /// Scan `/proc/<pid>/fd/*` for a `socket:[inode]` symlink matching
    /// `inode`, returning its owning pid.
    fn pid_owning_socket_inode(inode: u64) -> Option<u32> {
        let target = format!("socket:[{inode}]");
        let proc_entries = std::fs::read_dir("/proc").ok()?;
        for proc_entry in proc_entries.flatten() {
            let Some(pid) = proc_entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u32>().ok())
            else {
                continue;
            };
            let Ok(fd_entries) = std::fs::read_dir(proc_entry.path().join("fd")) else {
                continue;
            };
            for fd_entry in fd_entries.flatten() {
                if let Ok(link) = std::fs::read_link(fd_entry.path()) {
                    if link.to_string_lossy() == target {
                        return Some(pid);
                    }
                }
            }
        }
        None
    }

    /// Step (c): the broader cmdline scan used generally for adoption
    /// (`spec.md` §4.2 `EnumerateWebsockify`), filtered to the port we
    /// just asked for. Fallback of last resort when step (b)'s stricter
    /// match finds nothing (e.g. the binary name itself doesn't literally
    /// contain "websockify" but the noVNC markers still do).
    fn pid_from_cmdline_scan(&self, ws_port: u16) -> Option<u32> {
        self.enumerate_websockify()
            .into_iter()
            .find(|(_, port)| *port == ws_port)
            .map(|(pid, _)| pid)
    }

    async fn wait_until_dead(&self, pid: u32, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.is_alive(pid) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl ProcessSupervisor for WebsockifySupervisor {
    async fn spawn(
        &self,
        vm_name: &str,
        vnc_host: &str,
        vnc_port: u16,
        ws_port: u16,
    ) -> Result<u32, BrokerError> {
        let mut cmd = Command::new("websockify");
        cmd.arg("-D")
            .arg("--run-once")
            .arg("--web")
            .arg(&self.config.novnc_web_root)
            .arg(ws_port.to_string())
            .arg(format!("{vnc_host}:{vnc_port}"))
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let spawn_failed = |reason: String| BrokerError::SpawnFailed {
            vm_name: vm_name.to_string(),
            reason,
        };

        let mut child = cmd
            .spawn()
            .map_err(|e| spawn_failed(format!("spawning websockify: {e}")))?;

        if let Some(pid) = self.pid_from_spawn_output(&mut child).await {
            return Ok(pid);
        }

        let deadline = Instant::now() + Duration::from_millis(self.config.spawn_timeout_ms);
        while Instant::now() < deadline {
            if let Some(pid) = self.pid_from_port_probe(ws_port) {
                return Ok(pid);
            }
            if let Some(pid) = self.pid_from_cmdline_scan(ws_port) {
                return Ok(pid);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        Err(spawn_failed(format!(
            "could not resolve websockify pid for ws_port {ws_port} within {}ms",
            self.config.spawn_timeout_ms
        )))
    }

    async fn terminate(&self, pid: u32) -> Result<(), BrokerError> {
        if !self.is_alive(pid) {
            return Ok(());
        }

        let nix_pid = Pid::from_raw(pid as i32);
        let _ = signal::kill(nix_pid, Signal::SIGTERM);
        if self
            .wait_until_dead(pid, Duration::from_millis(self.config.grace_ms))
            .await
        {
            return Ok(());
        }

        tracing::warn!(pid, "websockify did not exit within grace period, sending SIGKILL");
        let _ = signal::kill(nix_pid, Signal::SIGKILL);
        if self
            .wait_until_dead(pid, Duration::from_millis(self.config.kill_ms))
            .await
        {
            return Ok(());
        }

        tracing::error!(pid, "websockify still alive after SIGKILL");
        Err(BrokerError::TerminateFailed { pid })
    }
}

impl ProcessProbe for WebsockifySupervisor {
    fn is_alive(&self, pid: u32) -> bool {
        // Signal 0: delivery checks existence/permission without sending
        // anything. EPERM still means the process exists.
        match signal::kill(Pid::from_raw(pid as i32), None) {
            Ok(()) => true,
            Err(nix::errno::Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    fn is_port_free_os(&self, ws_port: u16) -> bool {
        TcpListener::bind(("127.0.0.1", ws_port)).is_ok()
    }

    fn enumerate_websockify(&self) -> Vec<(u32, u16)> {
        let mut system = System::new();
        system.refresh_processes();
        let port_min = self.config.port_min;
        let port_max = self.config.port_max;

        system
            .processes()
            .values()
            .filter_map(|process| {
                let cmd = process.cmd();
                if cmd.is_empty() {
                    return None;
                }
                let joined = cmd.join(" ").to_lowercase();
                if !joined.contains("websockify") || !joined.contains("novnc") {
                    return None;
                }
                let port = cmd.iter().find_map(|arg| {
                    arg.parse::<u16>()
                        .ok()
                        .filter(|p| (port_min..=port_max).contains(p))
                })?;
                Some((process.pid().as_u32(), port))
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "websockify_tests.rs"]
mod tests;
