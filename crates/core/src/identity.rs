// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identity: the (name, cycle tag) pair.
//!
//! Displayed as `name%tag`, the form used in every progress message, so a
//! task id doubles as the address prefix of its distinguished messages.

use crate::cycle::{CycleTag, TagError};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identity of one task instance within a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    pub name: String,
    pub tag: CycleTag,
}

impl TaskId {
    pub fn new(name: impl Into<String>, tag: CycleTag) -> Self {
        Self {
            name: name.into(),
            tag,
        }
    }

    /// Parse `name%tag` back into an identity.
    pub fn parse(s: &str) -> Result<Self, TagError> {
        let (name, tag) = s
            .split_once('%')
            .ok_or_else(|| TagError::Invalid(s.to_string()))?;
        if name.is_empty() {
            return Err(TagError::Invalid(s.to_string()));
        }
        Ok(Self::new(name, CycleTag::parse(tag)?))
    }

    /// The distinguished "job has started" message for this identity.
    pub fn started_message(&self) -> String {
        format!("{} started", self)
    }

    /// The distinguished "job has succeeded" message for this identity.
    pub fn succeeded_message(&self) -> String {
        format!("{} succeeded", self)
    }

    /// The distinguished "job has failed" message for this identity.
    pub fn failed_message(&self) -> String {
        format!("{} failed", self)
    }

    /// The coarse completion output other tasks' prerequisites name.
    pub fn finished_message(&self) -> String {
        format!("{} finished", self)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%{}", self.name, self.tag)
    }
}

impl FromStr for TaskId {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskId::parse(s)
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TaskId::parse(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
