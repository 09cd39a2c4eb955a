// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prerequisite sets.
//!
//! The mirror image of [`OutputSet`](crate::outputs::OutputSet): messages a
//! task instance waits on, satisfied by string-equality against completed
//! outputs of other instances. Proxies exchange no pointers; matching is
//! entirely content-addressed, which is what lets the manager retire an
//! upstream proxy without dangling anyone.

use crate::identity::TaskId;
use crate::outputs::OutputSet;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Messages to be satisfied by other instances' completed outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrerequisiteSet {
    entries: IndexMap<String, bool>,
    satisfied_by: HashMap<String, TaskId>,
}

impl PrerequisiteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a message, initially unsatisfied.
    pub fn add(&mut self, message: impl Into<String>) {
        self.entries.entry(message.into()).or_insert(false);
    }

    pub fn exists(&self, message: &str) -> bool {
        self.entries.contains_key(message)
    }

    pub fn is_satisfied(&self, message: &str) -> bool {
        self.entries.get(message).copied().unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn count_satisfied(&self) -> usize {
        self.entries.values().filter(|&&s| s).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn all_satisfied(&self) -> bool {
        self.entries.values().all(|&s| s)
    }

    pub fn set_all_satisfied(&mut self) {
        for bit in self.entries.values_mut() {
            *bit = true;
        }
    }

    pub fn set_all_unsatisfied(&mut self) {
        for bit in self.entries.values_mut() {
            *bit = false;
        }
        self.satisfied_by.clear();
    }

    /// Satisfy any of my messages that appear as completed outputs of
    /// `owner`, recording who satisfied what. Idempotent.
    pub fn satisfy_me(&mut self, owner: &TaskId, outputs: &OutputSet) {
        for (message, bit) in self.entries.iter_mut() {
            if !*bit && outputs.is_completed(message) {
                *bit = true;
                self.satisfied_by.insert(message.clone(), owner.clone());
            }
        }
    }

    /// Which identity satisfied each message (operator-set bits excluded).
    pub fn satisfied_by(&self) -> &HashMap<String, TaskId> {
        &self.satisfied_by
    }

    /// The identities this instance actually triggered off.
    pub fn resolved(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.satisfied_by.values().cloned().collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// All registered messages with their bits, insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(m, &s)| (m.as_str(), s))
    }
}

#[cfg(test)]
#[path = "prereqs_tests.rs"]
mod tests;
