// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message priorities.
//!
//! Every progress message carries a priority; [`Priority::log`] maps the
//! four levels onto the tracing macros so task-addressed messages land in
//! the suite log at the right severity.

use crate::identity::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Priority of a progress message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Debug,
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown message priority: {0}")]
pub struct UnknownPriority(String);

impl Priority {
    /// Log a task-addressed message at this priority.
    pub fn log(self, id: &TaskId, text: &str) {
        match self {
            Priority::Debug => tracing::debug!(task = %id, "{}", text),
            Priority::Normal => tracing::info!(task = %id, "{}", text),
            Priority::Warning => tracing::warn!(task = %id, "{}", text),
            Priority::Critical => tracing::error!(task = %id, "{}", text),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Debug => write!(f, "DEBUG"),
            Priority::Normal => write!(f, "NORMAL"),
            Priority::Warning => write!(f, "WARNING"),
            Priority::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBUG" => Ok(Priority::Debug),
            "NORMAL" => Ok(Priority::Normal),
            "WARNING" => Ok(Priority::Warning),
            "CRITICAL" => Ok(Priority::Critical),
            other => Err(UnknownPriority(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
