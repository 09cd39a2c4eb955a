// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flat per-instance records for external monitors.

use crate::message::Priority;
use crate::state::TaskStatus;
use serde::{Deserialize, Serialize};

/// Snapshot of one task instance, as published to the monitor endpoint.
///
/// Wall-times are preformatted `HH:MM:SS` strings (`*` when unset) so the
/// record is directly displayable; the estimated time of completion keeps
/// the original `HH:MM:SS(to-go)` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub name: String,
    pub tag: String,
    pub state: TaskStatus,
    pub spawned: bool,
    pub n_total_outputs: usize,
    pub n_completed_outputs: usize,
    pub latest_message: String,
    pub latest_message_priority: Priority,
    pub submitted_time: String,
    pub started_time: String,
    pub succeeded_time: String,
    pub mean_total_elapsed_time: String,
    pub etc: String,
    pub logfiles: Vec<String>,
}
