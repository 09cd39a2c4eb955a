// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitor snapshot store.
//!
//! The manager publishes one summary snapshot per tick; external monitors
//! read the latest.

use parking_lot::Mutex;
use rota_core::TaskSummary;
use std::sync::Arc;

/// Latest per-tick summary snapshot.
#[derive(Debug, Clone, Default)]
pub struct Monitor {
    snapshot: Arc<Mutex<Vec<TaskSummary>>>,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with this tick's summaries.
    pub fn publish(&self, summaries: Vec<TaskSummary>) {
        *self.snapshot.lock() = summaries;
    }

    pub fn snapshot(&self) -> Vec<TaskSummary> {
        self.snapshot.lock().clone()
    }
}
