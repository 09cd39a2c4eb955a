// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal state dump for restart.
//!
//! One `class NAME : k=v, ...` line per task definition followed by one
//! `<identity> : state=..., spawned=...` line per live proxy. The format
//! round-trips through [`StateDump::parse`] so a restart can seed the
//! population from the last dump.

use indexmap::IndexMap;
use rota_core::{Lifecycle, StateError, TaskId};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors from reading a state dump.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("unparsable state dump line: {0}")]
    BadLine(String),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One dumped proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpedProxy {
    pub id: TaskId,
    pub lifecycle: Lifecycle,
}

/// A parsed state dump.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDump {
    /// Definition name -> class variables.
    pub classes: IndexMap<String, IndexMap<String, String>>,
    pub proxies: Vec<DumpedProxy>,
}

impl StateDump {
    /// Parse the text written by [`write`].
    pub fn parse(text: &str) -> Result<Self, DumpError> {
        let mut dump = StateDump::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix("class ") {
                let (name, vars_text) = rest
                    .split_once(" : ")
                    .ok_or_else(|| DumpError::BadLine(line.to_string()))?;
                let mut vars = IndexMap::new();
                for field in vars_text.split(',') {
                    let (key, value) = field
                        .trim()
                        .split_once('=')
                        .ok_or_else(|| DumpError::BadLine(line.to_string()))?;
                    vars.insert(key.to_string(), value.to_string());
                }
                dump.classes.insert(name.to_string(), vars);
                continue;
            }
            let (id_text, state_text) = line
                .split_once(" : ")
                .ok_or_else(|| DumpError::BadLine(line.to_string()))?;
            let id = TaskId::parse(id_text).map_err(|_| DumpError::BadLine(line.to_string()))?;
            let lifecycle = Lifecycle::parse_dump(state_text)?;
            dump.proxies.push(DumpedProxy { id, lifecycle });
        }
        Ok(dump)
    }

    /// Load and parse a dump file.
    pub fn load(path: &Path) -> Result<Self, DumpError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

/// Write a state dump atomically (write-then-rename).
pub fn write(path: &Path, class_lines: &[String], proxy_lines: &[String]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("new");
    {
        let mut file = std::fs::File::create(&tmp)?;
        for line in class_lines.iter().chain(proxy_lines) {
            writeln!(file, "{}", line)?;
        }
    }
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
#[path = "state_dump_tests.rs"]
mod tests;
