// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::BrokerError;

#[yare::parameterized(
    pool_exhausted = { BrokerError::PoolExhausted, "VNC port pool exhausted (no free ports in range)" },
    not_allocated = { BrokerError::NotAllocated(6100), "port 6100 has no allocation to promote" },
    terminate_failed = { BrokerError::TerminateFailed { pid: 42 }, "failed to terminate websockify process 42" },
)]
fn display_message(err: BrokerError, expected: &str) {
    assert_eq!(err.to_string(), expected);
}

#[test]
fn spawn_failed_includes_vm_name_and_reason() {
    let err = BrokerError::SpawnFailed {
        vm_name: "vmA".to_string(),
        reason: "no PID resolved".to_string(),
    };
    let message = err.to_string();
    assert!(message.contains("vmA"));
    assert!(message.contains("no PID resolved"));
}
