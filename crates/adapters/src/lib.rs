// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! vnc-adapters: the Process Supervisor.
//!
//! Spawns and supervises `websockify` against the real OS, and implements
//! `vnc_core::ProcessProbe` so `vnc-storage`'s reconciler can ask it
//! questions without either crate depending on the other.

mod supervisor;
mod websockify;

pub use supervisor::ProcessSupervisor;
pub use websockify::WebsockifySupervisor;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeProcessSupervisor;
