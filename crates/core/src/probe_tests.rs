// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::ProcessProbe;

struct StubProbe {
    alive_pids: Vec<u32>,
    free_ports: Vec<u16>,
    websockify: Vec<(u32, u16)>,
}

impl ProcessProbe for StubProbe {
    fn is_alive(&self, pid: u32) -> bool {
        self.alive_pids.contains(&pid)
    }

    fn is_port_free_os(&self, ws_port: u16) -> bool {
        self.free_ports.contains(&ws_port)
    }

    fn enumerate_websockify(&self) -> Vec<(u32, u16)> {
        self.websockify.clone()
    }
}

#[test]
fn trait_object_dispatches_to_the_concrete_impl() {
    let probe: Box<dyn ProcessProbe> = Box::new(StubProbe {
        alive_pids: vec![42],
        free_ports: vec![6100],
        websockify: vec![(42, 6101)],
    });

    assert!(probe.is_alive(42));
    assert!(!probe.is_alive(43));
    assert!(probe.is_port_free_os(6100));
    assert!(!probe.is_port_free_os(6101));
    assert_eq!(probe.enumerate_websockify(), vec![(42, 6101)]);
}
