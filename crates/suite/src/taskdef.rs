// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compiled per-task templates.
//!
//! A [`TaskDef`] is built once by the dependency compiler and is immutable
//! thereafter; the engine materialises one proxy per (task, cycle tag) from
//! it. Prerequisite and output templates carry `$(CYCLE_TIME)` placeholders
//! (optionally with a negative hour offset) that [`expand_template`]
//! substitutes at proxy-construction time.

use indexmap::IndexMap;
use regex::Regex;
use rota_core::CycleTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Base type of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Depends only on tasks of the same or earlier cycles.
    Free,
    /// Restart-dependent model: each instance feeds the next.
    Tied,
    /// Grouping task whose members inherit its valid hours.
    Family,
}

/// Type modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    /// Runs once, never spawns a successor.
    Oneoff,
    /// Requires the previous instance of itself to have succeeded.
    Sequential,
    /// May run ahead of the wall clock.
    Catchup,
    /// Readiness gated on wall clock >= cycle time + offset.
    Contact,
    /// Contact task that catches up when behind real time.
    CatchupContact,
}

/// Lifecycle events an external hook script can be fired for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEvent {
    Submitted,
    Started,
    Succeeded,
    Failed,
    SubmissionFailed,
    Warning,
    Retry,
    SubmissionTimeout,
    ExecutionTimeout,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            HookEvent::Submitted => "submitted",
            HookEvent::Started => "started",
            HookEvent::Succeeded => "succeeded",
            HookEvent::Failed => "failed",
            HookEvent::SubmissionFailed => "submission_failed",
            HookEvent::Warning => "warning",
            HookEvent::Retry => "retry",
            HookEvent::SubmissionTimeout => "submission_timeout",
            HookEvent::ExecutionTimeout => "execution_timeout",
        };
        write!(f, "{}", text)
    }
}

/// Per-task hook configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    pub script: Option<PathBuf>,
    pub events: Vec<HookEvent>,
}

impl HookConfig {
    /// True when a script is configured and registered for the event.
    pub fn handles(&self, event: HookEvent) -> bool {
        self.script.is_some() && self.events.contains(&event)
    }
}

/// The compiled template a task's proxies are produced from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDef {
    pub name: String,
    pub description: String,
    pub task_type: TaskType,
    pub modifiers: Vec<Modifier>,
    /// Contact offset from cycle time, hours.
    pub contact_offset_hours: f64,
    /// For tied tasks: how many forward cycles of restart outputs each
    /// instance produces.
    pub n_restart_outputs: u32,
    /// Set when a graph statement declares an intercycle dependency on
    /// this task.
    pub intercycle: bool,
    /// Hours of day this task runs at, sorted. Empty means every cycle.
    pub valid_hours: Vec<u32>,
    /// Prerequisite message templates, keyed by cycle hour.
    pub prerequisites: BTreeMap<u32, Vec<String>>,
    /// Prerequisites that apply only on the first cycle of a run.
    pub coldstart_prerequisites: BTreeMap<u32, Vec<String>>,
    /// Output message templates, keyed by cycle hour.
    pub outputs: BTreeMap<u32, Vec<String>>,
    /// Named output templates, referenced from the graph as `task:label`.
    pub named_outputs: IndexMap<String, String>,
    /// For family tasks: the member task names.
    pub members: Vec<String>,
    /// For member tasks: the owning family.
    pub member_of: Option<String>,
    /// Participates in the retirement-cutoff feeder rule.
    pub feeder: bool,
    /// Messages are accepted while in the failed state.
    pub resurrectable: bool,
    pub owner: Option<String>,
    pub command: Option<String>,
    pub pre_command: Option<String>,
    pub post_command: Option<String>,
    pub initial_scripting: Option<String>,
    pub environment: IndexMap<String, String>,
    pub directives: IndexMap<String, String>,
    pub logfiles: Vec<String>,
    pub job_submission_method: String,
    pub submission_timeout_minutes: Option<f64>,
    pub execution_timeout_minutes: Option<f64>,
    pub reset_execution_timeout: bool,
    /// FIFO of retry delays, minutes.
    pub retry_delays: Vec<f64>,
    pub hooks: HookConfig,
}

impl TaskDef {
    /// Minimal default definition for a task known only from the graph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            task_type: TaskType::Free,
            modifiers: Vec::new(),
            contact_offset_hours: 0.0,
            n_restart_outputs: 0,
            intercycle: false,
            valid_hours: Vec::new(),
            prerequisites: BTreeMap::new(),
            coldstart_prerequisites: BTreeMap::new(),
            outputs: BTreeMap::new(),
            named_outputs: IndexMap::new(),
            members: Vec::new(),
            member_of: None,
            feeder: false,
            resurrectable: false,
            owner: None,
            command: None,
            pre_command: None,
            post_command: None,
            initial_scripting: None,
            environment: IndexMap::new(),
            directives: IndexMap::new(),
            logfiles: Vec::new(),
            job_submission_method: "background".to_string(),
            submission_timeout_minutes: None,
            execution_timeout_minutes: None,
            reset_execution_timeout: false,
            retry_delays: Vec::new(),
            hooks: HookConfig::default(),
        }
    }

    pub fn add_modifier(&mut self, modifier: Modifier) {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn is_oneoff(&self) -> bool {
        self.has_modifier(Modifier::Oneoff)
    }

    pub fn is_sequential(&self) -> bool {
        self.has_modifier(Modifier::Sequential)
    }

    pub fn is_contact(&self) -> bool {
        self.has_modifier(Modifier::Contact) || self.has_modifier(Modifier::CatchupContact)
    }

    pub fn is_tied(&self) -> bool {
        self.task_type == TaskType::Tied
    }

    pub fn add_hour(&mut self, hour: u32) {
        if !self.valid_hours.contains(&hour) {
            self.valid_hours.push(hour);
        }
    }

    /// Runs at this hour? An empty valid-hours list means every hour.
    pub fn valid_at(&self, hour: u32) -> bool {
        self.valid_hours.is_empty() || self.valid_hours.contains(&hour)
    }

    pub fn prerequisites_for(&self, hour: u32) -> &[String] {
        self.prerequisites.get(&hour).map_or(&[], Vec::as_slice)
    }

    pub fn coldstart_prerequisites_for(&self, hour: u32) -> &[String] {
        self.coldstart_prerequisites
            .get(&hour)
            .map_or(&[], Vec::as_slice)
    }

    pub fn outputs_for(&self, hour: u32) -> &[String] {
        self.outputs.get(&hour).map_or(&[], Vec::as_slice)
    }

    /// The task's namespace chain: its own name, then the family it
    /// belongs to (if any).
    pub fn namespace_hierarchy(&self) -> Vec<String> {
        let mut chain = vec![self.name.clone()];
        if let Some(family) = &self.member_of {
            chain.push(family.clone());
        }
        chain
    }

    /// Sort and dedup the valid-hours list (call once, after compilation).
    pub fn finish(&mut self) {
        self.valid_hours.sort_unstable();
        self.valid_hours.dedup();
    }
}

#[allow(clippy::expect_used)]
fn cycle_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\(\s*CYCLE_TIME\s*(?:-\s*(\d+)\s*)?\)").expect("static regex")
    })
}

/// Substitute `$(CYCLE_TIME)` / `$(CYCLE_TIME - N)` placeholders with the
/// concrete (offset) tag.
pub fn expand_template(template: &str, tag: &CycleTag) -> String {
    cycle_time_re()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            match caps.get(1) {
                Some(offset) => {
                    let hours: i64 = offset.as_str().parse().unwrap_or(0);
                    tag.add_hours(-hours).to_string()
                }
                None => tag.to_string(),
            }
        })
        .into_owned()
}

/// Rewrite a template's `$(CYCLE_TIME)` references to carry an intercycle
/// offset of `hours` back.
pub fn offset_template(template: &str, hours: u32) -> String {
    template.replace("$(CYCLE_TIME)", &format!("$(CYCLE_TIME - {})", hours))
}

#[cfg(test)]
#[path = "taskdef_tests.rs"]
mod tests;
