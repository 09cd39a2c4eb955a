// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output sets.
//!
//! A labelled set of completion messages with per-message completed bits.
//! Insertion order is preserved so reports and state dumps are
//! deterministic.

use indexmap::IndexMap;
use thiserror::Error;

/// Errors from output-set operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutputError {
    /// Attempt to complete a message that was never registered.
    #[error("unknown output message: {0}")]
    Unknown(String),
}

/// Completion messages a task instance is expected to emit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSet {
    entries: IndexMap<String, bool>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a message. Registering an existing message updates its bit.
    pub fn add(&mut self, message: impl Into<String>, completed: bool) {
        self.entries.insert(message.into(), completed);
    }

    /// Remove a message; returns whether it was present.
    pub fn remove(&mut self, message: &str) -> bool {
        self.entries.shift_remove(message).is_some()
    }

    pub fn exists(&self, message: &str) -> bool {
        self.entries.contains_key(message)
    }

    pub fn is_completed(&self, message: &str) -> bool {
        self.entries.get(message).copied().unwrap_or(false)
    }

    /// Mark a registered message completed.
    pub fn set_completed(&mut self, message: &str) -> Result<(), OutputError> {
        match self.entries.get_mut(message) {
            Some(bit) => {
                *bit = true;
                Ok(())
            }
            None => Err(OutputError::Unknown(message.to_string())),
        }
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn count_completed(&self) -> usize {
        self.entries.values().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn all_completed(&self) -> bool {
        self.entries.values().all(|&c| c)
    }

    pub fn set_all_completed(&mut self) {
        for bit in self.entries.values_mut() {
            *bit = true;
        }
    }

    pub fn set_all_incomplete(&mut self) {
        for bit in self.entries.values_mut() {
            *bit = false;
        }
    }

    /// All registered messages with their completion bits, insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(m, &c)| (m.as_str(), c))
    }

    /// The completed messages, insertion order.
    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, &c)| c)
            .map(|(m, _)| m.as_str())
    }
}

#[cfg(test)]
#[path = "outputs_tests.rs"]
mod tests;
