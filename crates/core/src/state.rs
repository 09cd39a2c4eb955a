// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle state machine.
//!
//! [`TaskStatus`] is the per-instance scheduling state; [`Lifecycle`] pairs
//! it with the monotonic spawned bit. Message-driven transitions go through
//! [`Lifecycle::advance`], which enforces the legality table; operator
//! resets use [`Lifecycle::set_status`] and bypass it deliberately.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Scheduling state of a task instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Waiting,
    Queued,
    Submitted,
    Running,
    Succeeded,
    Failed,
    RetryDelayed,
    Held,
}

impl TaskStatus {
    /// Terminal for retirement purposes (modulo spawn/retry bookkeeping,
    /// which the proxy layers on top).
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }

    pub fn is_running(self) -> bool {
        self == TaskStatus::Running
    }

    pub fn is_waiting(self) -> bool {
        self == TaskStatus::Waiting
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TaskStatus::Waiting => "waiting",
            TaskStatus::Queued => "queued",
            TaskStatus::Submitted => "submitted",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::RetryDelayed => "retry_delayed",
            TaskStatus::Held => "held",
        };
        write!(f, "{}", text)
    }
}

impl FromStr for TaskStatus {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(TaskStatus::Waiting),
            "queued" => Ok(TaskStatus::Queued),
            "submitted" => Ok(TaskStatus::Submitted),
            "running" => Ok(TaskStatus::Running),
            "succeeded" => Ok(TaskStatus::Succeeded),
            "failed" => Ok(TaskStatus::Failed),
            "retry_delayed" => Ok(TaskStatus::RetryDelayed),
            "held" => Ok(TaskStatus::Held),
            other => Err(StateError::UnknownStatus(other.to_string())),
        }
    }
}

/// Errors from lifecycle operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("illegal state transition: {from} -> {to}")]
    IllegalTransition { from: TaskStatus, to: TaskStatus },
    #[error("instance has already spawned")]
    AlreadySpawned,
    #[error("unknown task status: {0}")]
    UnknownStatus(String),
}

/// Legal message/scheduler-driven transitions.
fn legal(from: TaskStatus, to: TaskStatus) -> bool {
    use TaskStatus::*;
    matches!(
        (from, to),
        (Waiting, Queued)
            | (Waiting, Submitted)
            | (Waiting, Failed)
            | (Queued, Submitted)
            | (Queued, Failed)
            | (Submitted, Running)
            | (Submitted, RetryDelayed)
            | (Submitted, Failed)
            | (Running, Succeeded)
            | (Running, Failed)
            | (Running, RetryDelayed)
            | (RetryDelayed, Waiting)
            | (RetryDelayed, Submitted)
            | (Held, Waiting)
            | (Held, Queued)
    )
}

/// Current status plus the monotonic spawned bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    status: TaskStatus,
    spawned: bool,
}

impl Lifecycle {
    pub fn new(status: TaskStatus) -> Self {
        Self {
            status,
            spawned: false,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Guarded transition; rejects anything outside the legality table.
    pub fn advance(&mut self, to: TaskStatus) -> Result<(), StateError> {
        if !legal(self.status, to) {
            return Err(StateError::IllegalTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Operator reset: set the status directly.
    pub fn set_status(&mut self, to: TaskStatus) {
        self.status = to;
    }

    pub fn has_spawned(&self) -> bool {
        self.spawned
    }

    /// Set the spawned bit. At most once per instance.
    pub fn set_spawned(&mut self) -> Result<(), StateError> {
        if self.spawned {
            return Err(StateError::AlreadySpawned);
        }
        self.spawned = true;
        Ok(())
    }

    /// State-dump form, compatible with [`Lifecycle::parse_dump`].
    pub fn dump(&self) -> String {
        format!("state={}, spawned={}", self.status, self.spawned)
    }

    /// Parse the state-dump form written by [`Lifecycle::dump`].
    pub fn parse_dump(s: &str) -> Result<Self, StateError> {
        let mut status = None;
        let mut spawned = false;
        for field in s.split(',') {
            match field.trim().split_once('=') {
                Some(("state", v)) => status = Some(v.parse()?),
                Some(("spawned", v)) => spawned = v == "true",
                _ => return Err(StateError::UnknownStatus(s.to_string())),
            }
        }
        let status = status.ok_or_else(|| StateError::UnknownStatus(s.to_string()))?;
        Ok(Self { status, spawned })
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
