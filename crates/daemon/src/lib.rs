// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rota-daemon: the scheduler event pump
//!
//! Owns the message hub (the transport-facing registry of live task
//! proxies, with a dead-letter endpoint) and the monitor snapshot store
//! the running manager publishes to.

pub mod hub;
pub mod monitor;

pub use hub::{Envelope, HubClient, MessageHub};
pub use monitor::Monitor;
