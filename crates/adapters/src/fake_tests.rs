// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{FakeProcessSupervisor, SupervisorCall};
use crate::supervisor::ProcessSupervisor;
use vnc_core::{BrokerError, ProcessProbe};

#[tokio::test]
async fn spawn_assigns_incrementing_pids_and_records_the_call() {
    let supervisor = FakeProcessSupervisor::new();

    let pid1 = supervisor
        .spawn("vm-a", "127.0.0.1", 5901, 6901)
        .await
        .unwrap();
    let pid2 = supervisor
        .spawn("vm-b", "127.0.0.1", 5902, 6902)
        .await
        .unwrap();

    assert_eq!(pid1, 1);
    assert_eq!(pid2, 2);
    assert_eq!(
        supervisor.calls(),
        vec![
            SupervisorCall::Spawn {
                vm_name: "vm-a".to_string(),
                vnc_host: "127.0.0.1".to_string(),
                vnc_port: 5901,
                ws_port: 6901,
            },
            SupervisorCall::Spawn {
                vm_name: "vm-b".to_string(),
                vnc_host: "127.0.0.1".to_string(),
                vnc_port: 5902,
                ws_port: 6902,
            },
        ]
    );
}

#[tokio::test]
async fn spawn_marks_the_pid_alive_and_the_port_busy() {
    let supervisor = FakeProcessSupervisor::new();
    let pid = supervisor
        .spawn("vm-a", "127.0.0.1", 5901, 6901)
        .await
        .unwrap();

    assert!(supervisor.is_alive(pid));
    assert!(!supervisor.is_port_free_os(6901));
}

#[tokio::test]
async fn spawn_fails_when_configured_to() {
    let supervisor = FakeProcessSupervisor::new();
    supervisor.set_fail_spawn(true);

    let err = supervisor
        .spawn("vm-a", "127.0.0.1", 5901, 6901)
        .await
        .unwrap_err();

    assert!(matches!(err, BrokerError::SpawnFailed { vm_name, .. } if vm_name == "vm-a"));
}

#[tokio::test]
async fn terminate_clears_liveness_and_frees_the_port() {
    let supervisor = FakeProcessSupervisor::new();
    let pid = supervisor
        .spawn("vm-a", "127.0.0.1", 5901, 6901)
        .await
        .unwrap();

    supervisor.terminate(pid).await.unwrap();

    assert!(!supervisor.is_alive(pid));
    assert!(supervisor.is_port_free_os(6901));
    assert_eq!(
        supervisor.calls().last(),
        Some(&SupervisorCall::Terminate { pid })
    );
}

#[tokio::test]
async fn terminate_fails_when_configured_to() {
    let supervisor = FakeProcessSupervisor::new();
    let pid = supervisor
        .spawn("vm-a", "127.0.0.1", 5901, 6901)
        .await
        .unwrap();
    supervisor.set_fail_terminate(true);

    let err = supervisor.terminate(pid).await.unwrap_err();

    assert!(matches!(err, BrokerError::TerminateFailed { pid: failed_pid } if failed_pid == pid));
    assert!(supervisor.is_alive(pid));
}

#[tokio::test]
async fn terminate_is_idempotent_for_an_unknown_pid() {
    let supervisor = FakeProcessSupervisor::new();
    supervisor.terminate(9999).await.unwrap();
    assert!(!supervisor.is_alive(9999));
}

#[test]
fn mark_dead_and_mark_port_busy_free_are_directly_controllable() {
    let supervisor = FakeProcessSupervisor::new();
    supervisor.mark_port_busy(6950);
    assert!(!supervisor.is_port_free_os(6950));
    supervisor.mark_port_free(6950);
    assert!(supervisor.is_port_free_os(6950));
}

#[tokio::test]
async fn mark_dead_overrides_a_previously_spawned_pid() {
    let supervisor = FakeProcessSupervisor::new();
    let pid = supervisor
        .spawn("vm-a", "127.0.0.1", 5901, 6901)
        .await
        .unwrap();

    supervisor.mark_dead(pid);

    assert!(!supervisor.is_alive(pid));
}

#[test]
fn inject_websockify_surfaces_an_adopted_process() {
    let supervisor = FakeProcessSupervisor::new();
    supervisor.inject_websockify(4242, 6950);

    assert!(supervisor.is_alive(4242));
    assert!(!supervisor.is_port_free_os(6950));
    assert_eq!(supervisor.enumerate_websockify(), vec![(4242, 6950)]);
}

#[test]
fn remove_websockify_reverses_an_injection() {
    let supervisor = FakeProcessSupervisor::new();
    supervisor.inject_websockify(4242, 6950);
    supervisor.remove_websockify(4242, 6950);

    assert!(!supervisor.is_alive(4242));
    assert!(supervisor.is_port_free_os(6950));
    assert!(supervisor.enumerate_websockify().is_empty());
}
