// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task-definition runtime statistics.
//!
//! One shared record per [`TaskDef`](rota_suite::TaskDef): a live instance
//! count and the rolling mean of total elapsed run times. Every proxy of a
//! definition holds a handle to the same record.

use parking_lot::Mutex;
use std::sync::Arc;

/// Shared handle to one definition's statistics.
pub type SharedStats = Arc<Mutex<TaskStats>>;

/// Runtime statistics for one task definition.
#[derive(Debug, Default)]
pub struct TaskStats {
    instances: u64,
    elapsed: Vec<i64>,
    mean: Option<i64>,
}

impl TaskStats {
    pub fn shared() -> SharedStats {
        Arc::new(Mutex::new(TaskStats::default()))
    }

    pub fn count_up(&mut self) {
        self.instances += 1;
    }

    pub fn count_down(&mut self) {
        self.instances = self.instances.saturating_sub(1);
    }

    pub fn instance_count(&self) -> u64 {
        self.instances
    }

    /// Record one successful run's total elapsed seconds and recompute the
    /// integer-seconds mean.
    pub fn record_elapsed(&mut self, secs: i64) {
        self.elapsed.push(secs);
        let sum: i64 = self.elapsed.iter().sum();
        self.mean = Some(sum / self.elapsed.len() as i64);
    }

    /// Mean total elapsed time in whole seconds, once at least one
    /// instance has succeeded.
    pub fn mean_secs(&self) -> Option<i64> {
        self.mean
    }

    /// State-dump line for this definition's class variables.
    pub fn dump_line(&self, name: &str) -> String {
        let mean = match self.mean {
            Some(secs) => secs.to_string(),
            None => "*".to_string(),
        };
        format!(
            "class {} : instances={}, mean_total_elapsed_time={}",
            name, self.instances, mean
        )
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
