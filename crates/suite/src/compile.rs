// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dependency compiler.
//!
//! Consumes the suite settings and the textual graph and produces the
//! [`TaskDef`] population plus the per-hour edge map. Tasks referenced only
//! from the graph get minimal default definitions — an edge is never
//! silently dropped.

use crate::config::Suite;
use crate::error::SuiteConfigError;
use crate::graph::{self, DepPair, PairKind};
use crate::taskdef::{offset_template, HookConfig, Modifier, TaskDef, TaskType};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// A compiled suite: immutable task templates and the visualisation edges.
#[derive(Debug, Clone, Default)]
pub struct Compiled {
    pub taskdefs: IndexMap<String, TaskDef>,
    /// hour -> [(left, right)] in declaration order, deduplicated.
    pub edges: BTreeMap<u32, Vec<(String, String)>>,
}

impl Compiled {
    pub fn get(&self, name: &str) -> Option<&TaskDef> {
        self.taskdefs.get(name)
    }
}

/// Compile a suite configuration.
pub fn compile(suite: &Suite) -> Result<Compiled, SuiteConfigError> {
    let mut compiler = Compiler {
        suite,
        taskdefs: IndexMap::new(),
        edges: BTreeMap::new(),
    };

    for (section, text) in &suite.graph {
        let hours = parse_hours(section)?;
        for line in text.lines() {
            for pair in graph::parse_statement(line)? {
                compiler.process_pair(&pair, &hours)?;
            }
        }
    }
    compiler.apply_families()?;

    let mut taskdefs = compiler.taskdefs;
    for def in taskdefs.values_mut() {
        def.finish();
    }
    tracing::debug!(tasks = taskdefs.len(), "suite compiled");
    Ok(Compiled {
        taskdefs,
        edges: compiler.edges,
    })
}

/// Parse a cycle-hours section key like `"0,6,12,18"`.
fn parse_hours(section: &str) -> Result<Vec<u32>, SuiteConfigError> {
    let bad = |message: &str| SuiteConfigError::BadHours {
        section: section.to_string(),
        message: message.to_string(),
    };
    let mut hours = Vec::new();
    for item in section.split(',') {
        let hour: u32 = item
            .trim()
            .parse()
            .map_err(|_| bad("hours must be integers"))?;
        if hour > 23 {
            return Err(bad("hours must be 0..=23"));
        }
        if !hours.contains(&hour) {
            hours.push(hour);
        }
    }
    if hours.is_empty() {
        return Err(bad("at least one hour required"));
    }
    Ok(hours)
}

struct Compiler<'a> {
    suite: &'a Suite,
    taskdefs: IndexMap<String, TaskDef>,
    edges: BTreeMap<u32, Vec<(String, String)>>,
}

impl Compiler<'_> {
    fn ensure_taskdef(&mut self, name: &str) -> Result<(), SuiteConfigError> {
        if self.taskdefs.contains_key(name) {
            return Ok(());
        }
        let def = self.build_taskdef(name)?;
        self.taskdefs.insert(name.to_string(), def);
        Ok(())
    }

    /// Build a definition from the task's settings, or a minimal default
    /// for a task known only from the graph.
    fn build_taskdef(&self, name: &str) -> Result<TaskDef, SuiteConfigError> {
        let mut def = TaskDef::new(name);
        def.job_submission_method = self.suite.job_submission_method.clone();

        let Some(settings) = self.suite.get_task(name) else {
            return Ok(def);
        };

        def.description = settings.description.clone();
        def.owner = settings.owner.clone();
        def.command = settings.command.clone();
        def.pre_command = settings.pre_command.clone();
        def.post_command = settings.post_command.clone();
        def.initial_scripting = settings.initial_scripting.clone();
        def.environment = settings.environment.clone();
        def.directives = settings.directives.clone();
        def.logfiles = settings.logfiles.clone();
        def.submission_timeout_minutes = settings.submission_timeout_minutes;
        def.execution_timeout_minutes = settings.execution_timeout_minutes;
        def.reset_execution_timeout = settings.reset_execution_timeout_on_incoming_messages;
        def.retry_delays = settings.retry_delays.clone();
        def.feeder = settings.feeder;
        def.resurrectable = settings.resurrectable;
        def.named_outputs = settings.outputs.clone();
        def.hooks = HookConfig {
            script: settings.hook_script.clone(),
            events: settings.hook_events.clone(),
        };
        if let Some(method) = &settings.job_submission_method {
            def.job_submission_method = method.clone();
        }

        if let Some(value) = &settings.task_type {
            def.task_type = match value.as_str() {
                "free" => TaskType::Free,
                "tied" => TaskType::Tied,
                other => {
                    return Err(SuiteConfigError::IllegalType {
                        task: name.to_string(),
                        value: other.to_string(),
                    })
                }
            };
        }

        for item in &settings.modifiers {
            apply_modifier(&mut def, item)?;
        }
        Ok(def)
    }

    fn process_pair(&mut self, pair: &DepPair, hours: &[u32]) -> Result<(), SuiteConfigError> {
        self.ensure_taskdef(&pair.left.name)?;
        self.ensure_taskdef(&pair.right.name)?;

        for &hour in hours {
            if let Some(def) = self.taskdefs.get_mut(&pair.left.name) {
                def.add_hour(hour);
            }
            if let Some(def) = self.taskdefs.get_mut(&pair.right.name) {
                def.add_hour(hour);
            }
            let edge = (pair.left.name.clone(), pair.right.name.clone());
            let edges = self.edges.entry(hour).or_default();
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        }

        // coldstart lefts are startup-only by construction
        if pair.oneoff_left || pair.kind != PairKind::Normal {
            if let Some(def) = self.taskdefs.get_mut(&pair.left.name) {
                def.add_modifier(Modifier::Oneoff);
            }
        }

        if pair.kind == PairKind::ModelColdstart {
            // the left task must produce the right task's restart outputs
            // at startup
            let message = format!("{} restart files ready for $(CYCLE_TIME)", pair.right.name);
            if let Some(def) = self.taskdefs.get_mut(&pair.left.name) {
                for &hour in hours {
                    push_unique(def.outputs.entry(hour).or_default(), &message);
                }
            }
            return Ok(());
        }

        // form the prerequisite message
        let mut message = match &pair.left.output {
            Some(label) => {
                let template = self
                    .taskdefs
                    .get(&pair.left.name)
                    .and_then(|d| d.named_outputs.get(label))
                    .cloned()
                    .ok_or_else(|| SuiteConfigError::UnknownOutputRef {
                        task: pair.left.name.clone(),
                        output: label.clone(),
                    })?;
                // a referenced output must actually be produced
                if let Some(def) = self.taskdefs.get_mut(&pair.left.name) {
                    for &hour in hours {
                        push_unique(def.outputs.entry(hour).or_default(), &template);
                    }
                }
                template
            }
            None => format!("{}%$(CYCLE_TIME) finished", pair.left.name),
        };

        if let Some(offset) = pair.left.offset_hours {
            if let Some(def) = self.taskdefs.get_mut(&pair.left.name) {
                def.intercycle = true;
            }
            message = offset_template(&message, offset);
        }

        if let Some(def) = self.taskdefs.get_mut(&pair.right.name) {
            let target = match pair.kind {
                PairKind::Coldstart => &mut def.coldstart_prerequisites,
                _ => &mut def.prerequisites,
            };
            for &hour in hours {
                push_unique(target.entry(hour).or_default(), &message);
            }
        }
        Ok(())
    }

    fn apply_families(&mut self) -> Result<(), SuiteConfigError> {
        let families: Vec<(String, Vec<String>)> = self
            .suite
            .families
            .iter()
            .map(|(name, members)| (name.clone(), members.clone()))
            .collect();
        for (family, members) in &families {
            self.ensure_taskdef(family)?;
            let family_hours = match self.taskdefs.get_mut(family) {
                Some(def) => {
                    def.task_type = TaskType::Family;
                    def.members = members.clone();
                    def.valid_hours.clone()
                }
                None => Vec::new(),
            };
            for member in members {
                self.ensure_taskdef(member)?;
                if let Some(def) = self.taskdefs.get_mut(member) {
                    def.member_of = Some(family.clone());
                    // family hours REPLACE any the member picked up from
                    // the graph
                    def.valid_hours = family_hours.clone();
                }
            }
        }
        Ok(())
    }
}

fn push_unique(list: &mut Vec<String>, message: &str) {
    if !list.iter().any(|m| m == message) {
        list.push(message.to_string());
    }
}

#[allow(clippy::expect_used)]
fn restarts_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^model\(\s*restarts\s*=\s*(\d+)\s*\)$").expect("static regex"))
}

#[allow(clippy::expect_used)]
fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^clock\(\s*offset\s*=\s*(-?[0-9.]+)\s*hour\s*\)$").expect("static regex")
    })
}

#[allow(clippy::expect_used)]
fn catchup_clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^catchup\s+clock\(\s*offset\s*=\s*([0-9.]+)\s*hour\s*\)$")
            .expect("static regex")
    })
}

/// Parse one entry of a task's modifier list.
fn apply_modifier(def: &mut TaskDef, item: &str) -> Result<(), SuiteConfigError> {
    let item = item.trim();
    match item {
        "oneoff" => {
            def.add_modifier(Modifier::Oneoff);
            return Ok(());
        }
        "sequential" => {
            def.add_modifier(Modifier::Sequential);
            return Ok(());
        }
        "catchup" => {
            def.add_modifier(Modifier::Catchup);
            return Ok(());
        }
        _ => {}
    }
    if let Some(caps) = restarts_re().captures(item) {
        def.task_type = TaskType::Tied;
        def.n_restart_outputs = caps[1].parse().unwrap_or(0);
        return Ok(());
    }
    if let Some(caps) = clock_re().captures(item) {
        def.add_modifier(Modifier::Contact);
        def.contact_offset_hours = caps[1].parse().unwrap_or(0.0);
        return Ok(());
    }
    if let Some(caps) = catchup_clock_re().captures(item) {
        def.add_modifier(Modifier::CatchupContact);
        def.contact_offset_hours = caps[1].parse().unwrap_or(0.0);
        return Ok(());
    }
    Err(SuiteConfigError::IllegalModifier {
        task: def.name.clone(),
        modifier: item.to_string(),
    })
}

#[cfg(test)]
#[path = "compile_tests.rs"]
mod tests;
