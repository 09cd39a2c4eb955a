// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task manager and scheduling tick.
//!
//! Owns the live proxy population. Each tick runs the timeout checks, the
//! O(N^2) satisfaction pass (outputs are monotonic within a tick, so a
//! single pass reaches the fixed point), the launch pass, the spawn pass,
//! and the retirement sweep, then publishes a summary snapshot.

use crate::hooks::HookRunner;
use crate::launcher::LauncherRegistry;
use crate::proxy::{ProxyHarness, TaskProxy};
use crate::state_dump;
use crate::stats::{SharedStats, TaskStats};
use chrono::Duration;
use indexmap::IndexMap;
use rota_core::{
    ChangeFlag, Clock, CycleTag, OutputSet, Priority, StateError, TaskId, TaskStatus, TaskSummary,
};
use rota_suite::{Compiled, TaskDef};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// Transport-side registry of live proxies: the manager registers each
/// identity on creation and deregisters it atomically with retirement.
pub trait ProxyDirectory: Send + Sync {
    fn register(&self, id: &TaskId);
    fn deregister(&self, id: &TaskId);
}

/// Directory that tracks nothing, for tests and embedded use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectory;

impl ProxyDirectory for NoDirectory {
    fn register(&self, _id: &TaskId) {}
    fn deregister(&self, _id: &TaskId) {}
}

/// Operator reset targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTarget {
    /// Waiting with prerequisites forced satisfied.
    Ready,
    /// Waiting with prerequisites unsatisfied.
    Waiting,
    Succeeded,
    Failed,
    Held,
}

/// Manager configuration.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub suite: String,
    pub initial_tag: CycleTag,
    pub dummy_mode: bool,
    /// Simulated run length per task in dummy mode, seconds.
    pub dummy_run_length_secs: u64,
    pub job_log_dir: PathBuf,
    pub submission_shell: String,
    /// Write a state dump here after each tick when set.
    pub state_dump_path: Option<PathBuf>,
    pub dry_run: bool,
}

/// What one scheduling tick did.
#[derive(Debug, Default)]
pub struct TickReport {
    pub launched: usize,
    pub spawned: usize,
    pub retired: usize,
    /// True once the proxy population is empty: the run is complete.
    pub all_done: bool,
    pub summaries: Vec<TaskSummary>,
}

/// Owner of the live task-proxy population.
pub struct TaskManager {
    defs: IndexMap<String, Arc<TaskDef>>,
    stats: HashMap<String, SharedStats>,
    proxies: IndexMap<TaskId, TaskProxy>,
    harness: ProxyHarness,
    registry: LauncherRegistry,
    directory: Arc<dyn ProxyDirectory>,
    config: ManagerConfig,
    finished_logged: bool,
}

impl TaskManager {
    pub fn new(
        compiled: Compiled,
        config: ManagerConfig,
        clock: Arc<dyn Clock>,
        hooks: Arc<dyn HookRunner>,
        registry: LauncherRegistry,
        directory: Arc<dyn ProxyDirectory>,
        flag: ChangeFlag,
    ) -> Self {
        let mut defs = IndexMap::new();
        let mut stats = HashMap::new();
        for (name, def) in compiled.taskdefs {
            stats.insert(name.clone(), TaskStats::shared());
            defs.insert(name, Arc::new(def));
        }
        let harness = ProxyHarness {
            clock,
            hooks,
            flag,
            suite: config.suite.clone(),
        };
        Self {
            defs,
            stats,
            proxies: IndexMap::new(),
            harness,
            registry,
            directory,
            config,
            finished_logged: false,
        }
    }

    pub fn change_flag(&self) -> ChangeFlag {
        self.harness.flag.clone()
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn proxy(&self, id: &TaskId) -> Option<&TaskProxy> {
        self.proxies.get(id)
    }

    pub fn proxies(&self) -> impl Iterator<Item = &TaskProxy> {
        self.proxies.values()
    }

    fn stats_for(&mut self, name: &str) -> SharedStats {
        Arc::clone(
            self.stats
                .entry(name.to_string())
                .or_insert_with(TaskStats::shared),
        )
    }

    /// Create the initial population at the initial tag: every definition
    /// valid at that hour, waiting, with coldstart prerequisites applied.
    pub fn populate_initial(&mut self) {
        let tag = self.config.initial_tag;
        let hour = tag.hour().unwrap_or(0);
        let defs: Vec<Arc<TaskDef>> = self.defs.values().cloned().collect();
        for def in defs {
            if !def.valid_at(hour) {
                tracing::debug!(task = %def.name, hour, "not valid at the initial hour");
                continue;
            }
            tracing::info!(task = %def.name, tag = %tag, "creating initial task");
            let stats = self.stats_for(&def.name);
            let proxy = TaskProxy::new(
                def,
                tag,
                TaskStatus::Waiting,
                true,
                stats,
                self.harness.clone(),
            );
            self.insert(proxy);
        }
    }

    /// Insert a proxy into the population, registering it with the
    /// transport directory. A duplicate identity is dropped.
    pub fn insert(&mut self, proxy: TaskProxy) {
        if self.proxies.contains_key(&proxy.id) {
            tracing::warn!(task = %proxy.id, "duplicate proxy dropped");
            if let Some(stats) = self.stats.get(&proxy.id.name) {
                stats.lock().count_down();
            }
            return;
        }
        self.directory.register(&proxy.id);
        self.proxies.insert(proxy.id.clone(), proxy);
    }

    fn remove(&mut self, id: &TaskId) {
        if let Some(proxy) = self.proxies.shift_remove(id) {
            self.directory.deregister(id);
            if let Some(stats) = self.stats.get(&proxy.id.name) {
                stats.lock().count_down();
            }
        }
    }

    /// Route one inbound message to its proxy. Returns false (dead letter)
    /// when the target no longer exists.
    pub fn deliver(&mut self, id: &TaskId, priority: Priority, message: &str) -> bool {
        match self.proxies.get_mut(id) {
            Some(proxy) => {
                proxy.incoming(priority, message);
                true
            }
            None => {
                tracing::warn!("DEAD LETTER: [{}] {}", id, message);
                false
            }
        }
    }

    /// Operator reset of one task.
    pub fn reset_task(&mut self, id: &TaskId, target: ResetTarget) -> bool {
        match self.proxies.get_mut(id) {
            Some(proxy) => {
                match target {
                    ResetTarget::Ready => proxy.reset_state_ready(),
                    ResetTarget::Waiting => proxy.reset_state_waiting(),
                    ResetTarget::Succeeded => proxy.reset_state_succeeded(),
                    ResetTarget::Failed => proxy.reset_state_failed(),
                    ResetTarget::Held => proxy.reset_state_held(),
                }
                self.harness.flag.raise();
                true
            }
            None => false,
        }
    }

    /// One scheduling tick.
    pub fn tick(&mut self) -> Result<TickReport, StateError> {
        let mut report = TickReport::default();
        if self.proxies.is_empty() {
            self.log_all_done();
            report.all_done = true;
            return Ok(report);
        }

        // 1. timers
        for proxy in self.proxies.values_mut() {
            proxy.check_submission_timeout();
            proxy.check_execution_timeout();
            proxy.promote_retry()?;
        }

        // 2. satisfaction pass over an output snapshot: outputs only grow
        //    within a tick, so one pass reaches the fixed point
        let snapshot: Vec<(TaskId, OutputSet)> = self
            .proxies
            .values()
            .map(|q| (q.id.clone(), q.outputs.clone()))
            .collect();
        for proxy in self.proxies.values_mut() {
            for (owner, outputs) in &snapshot {
                if owner != &proxy.id {
                    proxy.satisfy_me(owner, outputs);
                }
            }
        }

        // 3. launch pass
        let method_override = self.config.dummy_mode.then(|| "dummy".to_string());
        for proxy in self.proxies.values_mut() {
            if proxy.ready_to_run() {
                let method = method_override
                    .as_deref()
                    .unwrap_or(&proxy.def().job_submission_method)
                    .to_string();
                proxy.submit(
                    &self.registry,
                    &method,
                    &self.config.job_log_dir,
                    &self.config.submission_shell,
                    self.config.dry_run,
                )?;
                report.launched += 1;
            }
        }

        // 4. dummy-mode simulation: drive submitted tasks to started, and
        //    running tasks past the simulated run length to succeeded
        if self.config.dummy_mode {
            self.simulate();
        }

        // 5. spawn pass: a successor exists before the current instance
        //    can finish and be retired
        let mut successors = Vec::new();
        for proxy in self.proxies.values_mut() {
            if !proxy.has_spawned()
                && matches!(
                    proxy.status(),
                    TaskStatus::Running | TaskStatus::Succeeded
                )
            {
                successors.push(proxy.spawn()?);
            }
        }
        report.spawned = successors.len();
        for successor in successors {
            tracing::info!(task = %successor.id, "spawned successor");
            self.insert(successor);
        }

        // 6. suicide requests
        let suicides: Vec<TaskId> = self
            .proxies
            .values()
            .filter(|p| p.suicide_requested())
            .map(|p| p.id.clone())
            .collect();
        for id in &suicides {
            Priority::Normal.log(id, "suicide prerequisites satisfied, removing task");
            self.remove(id);
        }
        report.retired += suicides.len();

        // 7. retirement sweep
        report.retired += self.retire();

        if self.proxies.is_empty() {
            self.log_all_done();
            report.all_done = true;
        }

        // 8. summary snapshot
        report.summaries = self
            .proxies
            .values_mut()
            .map(|p| p.get_state_summary())
            .collect();

        // 9. state dump
        if let Some(path) = self.config.state_dump_path.clone() {
            if let Err(err) = self.write_state_dump(&path) {
                tracing::warn!(path = %path.display(), error = %err, "state dump failed");
            }
        }

        Ok(report)
    }

    /// Delete spent proxies under the intercycle cutoff rule.
    ///
    /// The cutoff is the oldest running tag, pulled back to the most
    /// recent finished feeder tag when feeder tasks exist: a downstream
    /// catchup task may still need that feeder batch's outputs. Only
    /// fully-finished batches strictly older than the cutoff go.
    fn retire(&mut self) -> usize {
        let running_tags: Vec<CycleTag> = self
            .proxies
            .values()
            .filter(|p| p.status() == TaskStatus::Running)
            .map(|p| p.id.tag)
            .collect();

        let Some(&oldest_running) = running_tags.iter().min() else {
            // nothing running: if everyone is spent the run is over
            if self.proxies.values().all(|p| p.is_spent()) {
                let all: Vec<TaskId> = self.proxies.keys().cloned().collect();
                let count = all.len();
                for id in &all {
                    tracing::debug!(task = %id, "removing spent task");
                    self.remove(id);
                }
                return count;
            }
            return 0;
        };
        let mut cutoff = oldest_running;
        tracing::debug!(cutoff = %cutoff, "oldest running tag");

        let finished_feeder = self
            .proxies
            .values()
            .filter(|p| p.def().feeder && p.status() == TaskStatus::Succeeded)
            .map(|p| p.id.tag)
            .max();
        if let Some(feeder_tag) = finished_feeder {
            if feeder_tag < cutoff {
                tracing::debug!(feeder = %feeder_tag, "cutoff pulled back to finished feeder");
                cutoff = feeder_tag;
            }
        }

        let mut batch_finished: BTreeMap<CycleTag, bool> = BTreeMap::new();
        for proxy in self.proxies.values() {
            let entry = batch_finished.entry(proxy.id.tag).or_insert(true);
            if !proxy.is_spent() {
                *entry = false;
            }
        }

        let spent: Vec<TaskId> = self
            .proxies
            .values()
            .filter(|p| {
                p.id.tag < cutoff
                    && p.is_spent()
                    && batch_finished.get(&p.id.tag).copied().unwrap_or(false)
            })
            .map(|p| p.id.clone())
            .collect();
        for id in &spent {
            tracing::debug!(task = %id, "removing spent task");
            self.remove(id);
        }
        spent.len()
    }

    /// Dummy-mode execution: feed progress messages through the normal
    /// absorption path instead of running real jobs.
    fn simulate(&mut self) {
        let now = self.harness.clock.now();
        let run_length = Duration::seconds(self.config.dummy_run_length_secs as i64);
        for proxy in self.proxies.values_mut() {
            match proxy.status() {
                TaskStatus::Submitted => {
                    let started = proxy.id.started_message();
                    proxy.incoming(Priority::Normal, &started);
                }
                TaskStatus::Running => {
                    if let Some(started) = proxy.started_time() {
                        if now - started >= run_length {
                            proxy.set_all_internal_outputs_completed();
                            let succeeded = proxy.id.succeeded_message();
                            proxy.incoming(Priority::Normal, &succeeded);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn write_state_dump(&self, path: &std::path::Path) -> std::io::Result<()> {
        let mut class_lines = Vec::new();
        for (name, def) in &self.defs {
            if let Some(shared) = self.stats.get(name.as_str()) {
                class_lines.push(shared.lock().dump_line(&def.name));
            }
        }
        let proxy_lines: Vec<String> = self.proxies.values().map(|p| p.dump_line()).collect();
        state_dump::write(path, &class_lines, &proxy_lines)
    }

    fn log_all_done(&mut self) {
        if !self.finished_logged {
            tracing::error!("ALL TASKS DONE");
            self.finished_logged = true;
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
