// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Suite settings parsing (TOML, HCL, and JSON).

use crate::error::SuiteConfigError;
use crate::taskdef::HookEvent;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suite file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Hcl,
    Json,
}

fn default_logging_dir() -> String {
    ".rota/log".to_string()
}

fn default_state_dump_dir() -> String {
    ".rota/state".to_string()
}

fn default_job_log_dir() -> String {
    ".rota/job-log".to_string()
}

fn default_job_submission_method() -> String {
    "background".to_string()
}

fn default_run_length_seconds() -> u64 {
    10
}

fn default_submission_shell() -> String {
    "/bin/sh".to_string()
}

/// Dummy-mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DummySettings {
    /// Simulated run length of each task, in seconds.
    #[serde(default = "default_run_length_seconds")]
    pub run_length_seconds: u64,
}

impl Default for DummySettings {
    fn default() -> Self {
        Self {
            run_length_seconds: default_run_length_seconds(),
        }
    }
}

/// Per-task settings from the suite file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSettings {
    /// Task name (injected from the map key)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: Option<String>,
    /// Base type: "free" (default) or "tied"
    #[serde(default, rename = "type")]
    pub task_type: Option<String>,
    /// Type modifier list, parsed like the graph decorations:
    /// `oneoff`, `sequential`, `catchup`, `clock(offset=H hour)`,
    /// `catchup clock(offset=H hour)`, `model(restarts=N)`
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub pre_command: Option<String>,
    #[serde(default)]
    pub post_command: Option<String>,
    #[serde(default)]
    pub initial_scripting: Option<String>,
    #[serde(default)]
    pub environment: IndexMap<String, String>,
    #[serde(default)]
    pub directives: IndexMap<String, String>,
    #[serde(default)]
    pub logfiles: Vec<String>,
    /// Per-task override of the suite job submission method
    #[serde(default)]
    pub job_submission_method: Option<String>,
    #[serde(default)]
    pub submission_timeout_minutes: Option<f64>,
    #[serde(default)]
    pub execution_timeout_minutes: Option<f64>,
    #[serde(default)]
    pub reset_execution_timeout_on_incoming_messages: bool,
    /// FIFO of retry delays, in minutes
    #[serde(default)]
    pub retry_delays: Vec<f64>,
    #[serde(default)]
    pub hook_script: Option<PathBuf>,
    #[serde(default)]
    pub hook_events: Vec<HookEvent>,
    /// Participates in the retirement-cutoff feeder rule
    #[serde(default)]
    pub feeder: bool,
    /// Accept messages while in the failed state
    #[serde(default)]
    pub resurrectable: bool,
    /// Named outputs: label -> message template (may contain $(CYCLE_TIME))
    #[serde(default)]
    pub outputs: IndexMap<String, String>,
}

/// A parsed suite configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Suite {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dummy_mode: bool,
    #[serde(default)]
    pub dummy: DummySettings,
    /// Resolved relative to $HOME unless absolute
    #[serde(default = "default_logging_dir")]
    pub logging_dir: String,
    /// Resolved relative to $HOME unless absolute
    #[serde(default = "default_state_dump_dir")]
    pub state_dump_dir: String,
    /// Resolved relative to $HOME unless absolute
    #[serde(default = "default_job_log_dir")]
    pub job_log_dir: String,
    #[serde(default = "default_job_submission_method")]
    pub job_submission_method: String,
    #[serde(default = "default_submission_shell")]
    pub submission_shell: String,
    /// Tasks to insert only on a cold start
    #[serde(default)]
    pub coldstart_tasks: Vec<String>,
    #[serde(default, alias = "task")]
    pub tasks: IndexMap<String, TaskSettings>,
    /// Cycle-hour list ("0,6,12,18") -> multi-line graph text
    #[serde(default)]
    pub graph: IndexMap<String, String>,
    /// Family name -> member task names
    #[serde(default, alias = "family")]
    pub families: IndexMap<String, Vec<String>>,
}

impl Default for Suite {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            dummy_mode: false,
            dummy: DummySettings::default(),
            logging_dir: default_logging_dir(),
            state_dump_dir: default_state_dump_dir(),
            job_log_dir: default_job_log_dir(),
            job_submission_method: default_job_submission_method(),
            submission_shell: default_submission_shell(),
            coldstart_tasks: Vec::new(),
            tasks: IndexMap::new(),
            graph: IndexMap::new(),
            families: IndexMap::new(),
        }
    }
}

impl Suite {
    pub fn get_task(&self, name: &str) -> Option<&TaskSettings> {
        self.tasks.get(name)
    }

    /// Make the directory settings absolute, resolving relative paths
    /// against `home`.
    pub fn resolve_dirs(&mut self, home: &Path) {
        self.logging_dir = make_absolute(&self.logging_dir, home);
        self.state_dump_dir = make_absolute(&self.state_dump_dir, home);
        self.job_log_dir = make_absolute(&self.job_log_dir, home);
    }
}

fn make_absolute(dir: &str, home: &Path) -> String {
    let path = Path::new(dir);
    if path.is_absolute() {
        dir.to_string()
    } else {
        home.join(path).display().to_string()
    }
}

/// Parse a suite from the given content in the specified format.
pub fn parse_suite(content: &str, format: Format) -> Result<Suite, SuiteConfigError> {
    // 1. Serde does the heavy lifting
    let mut suite: Suite = match format {
        Format::Toml => toml::from_str(content)?,
        Format::Hcl => hcl::from_str(content)?,
        Format::Json => serde_json::from_str(content)?,
    };

    // 2. Name fixup — inject map keys into .name fields
    for (name, task) in &mut suite.tasks {
        task.name = name.clone();
    }

    Ok(suite)
}

/// Load a suite file, dispatching on extension, and resolve its directory
/// settings against the user's home.
pub fn load_suite(path: &Path) -> Result<Suite, SuiteConfigError> {
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") | Some("rc") => Format::Toml,
        Some("hcl") => Format::Hcl,
        Some("json") => Format::Json,
        other => {
            return Err(SuiteConfigError::UnknownFormat(
                other.unwrap_or("<none>").to_string(),
            ))
        }
    };
    let content = std::fs::read_to_string(path)?;
    let mut suite = parse_suite(&content, format)?;
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    suite.resolve_dirs(&home);
    Ok(suite)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
