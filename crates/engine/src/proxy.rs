// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task proxies.
//!
//! A [`TaskProxy`] is the live scheduler-side representation of one task at
//! one cycle tag: lifecycle state, prerequisite and output sets, timers,
//! the retry queue, and the message-absorption routine that external
//! workers drive through the transport.

use crate::hooks::HookRunner;
use crate::launcher::{JobSpec, LaunchHandle, LauncherRegistry};
use crate::stats::SharedStats;
use chrono::{Duration, NaiveDateTime};
use rota_core::{
    hms, hms_or_star, time_fmt, ChangeFlag, Clock, CycleTag, Lifecycle, OutputSet,
    PrerequisiteSet, Priority, StateError, TaskId, TaskStatus, TaskSummary,
};
use rota_suite::{expand_template, HookEvent, TaskDef};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

/// Shared collaborators every proxy holds a handle to.
#[derive(Debug, Clone)]
pub struct ProxyHarness {
    pub clock: Arc<dyn Clock>,
    pub hooks: Arc<dyn HookRunner>,
    pub flag: ChangeFlag,
    pub suite: String,
}

/// The live representation of one (task, cycle tag) instance.
#[derive(Debug)]
pub struct TaskProxy {
    def: Arc<TaskDef>,
    pub id: TaskId,
    lifecycle: Lifecycle,
    pub prerequisites: PrerequisiteSet,
    pub suicide_prerequisites: PrerequisiteSet,
    pub outputs: OutputSet,
    latest_message: String,
    latest_message_priority: Priority,
    submitted_time: Option<NaiveDateTime>,
    started_time: Option<NaiveDateTime>,
    succeeded_time: Option<NaiveDateTime>,
    submission_timer_start: Option<NaiveDateTime>,
    execution_timer_start: Option<NaiveDateTime>,
    retry_delay_timer_start: Option<NaiveDateTime>,
    current_retry_delay: Option<f64>,
    retry_delays: VecDeque<f64>,
    try_number: u32,
    launch_handle: Option<LaunchHandle>,
    stats: SharedStats,
    harness: ProxyHarness,
    etc: Option<NaiveDateTime>,
    to_go: Option<i64>,
}

fn minutes_to_duration(minutes: f64) -> Duration {
    Duration::milliseconds((minutes * 60_000.0) as i64)
}

impl TaskProxy {
    /// Materialise a proxy from its definition at the given tag.
    ///
    /// `startup` marks the first cycle of the run: coldstart prerequisites
    /// apply and sequential tasks skip the previous-instance prerequisite
    /// (there is no previous instance).
    pub fn new(
        def: Arc<TaskDef>,
        tag: CycleTag,
        status: TaskStatus,
        startup: bool,
        stats: SharedStats,
        harness: ProxyHarness,
    ) -> Self {
        let id = TaskId::new(def.name.clone(), tag);
        let hour = tag.hour().unwrap_or(0);

        let mut prerequisites = PrerequisiteSet::new();
        for template in def.prerequisites_for(hour) {
            prerequisites.add(expand_template(template, &tag));
        }
        if startup {
            for template in def.coldstart_prerequisites_for(hour) {
                prerequisites.add(expand_template(template, &tag));
            }
        }
        if def.is_sequential() && !startup {
            let prev = TaskId::new(def.name.clone(), tag.prev_valid(&def.valid_hours));
            prerequisites.add(prev.succeeded_message());
        }
        if def.is_tied() {
            prerequisites.add(format!("{} restart files ready for {}", def.name, tag));
        }

        let mut outputs = OutputSet::new();
        outputs.add(id.started_message(), false);
        for template in def.outputs_for(hour) {
            outputs.add(expand_template(template, &tag), false);
        }
        if def.is_tied() {
            let mut next = tag;
            for _ in 0..def.n_restart_outputs {
                next = next.next_valid(&def.valid_hours);
                outputs.add(
                    format!("{} restart files ready for {}", def.name, next),
                    false,
                );
            }
        }
        outputs.add(id.succeeded_message(), false);
        outputs.add(id.finished_message(), false);

        stats.lock().count_up();

        Self {
            def,
            id,
            lifecycle: Lifecycle::new(status),
            prerequisites,
            suicide_prerequisites: PrerequisiteSet::new(),
            outputs,
            latest_message: String::new(),
            latest_message_priority: Priority::Normal,
            submitted_time: None,
            started_time: None,
            succeeded_time: None,
            submission_timer_start: None,
            execution_timer_start: None,
            retry_delay_timer_start: None,
            current_retry_delay: None,
            retry_delays: VecDeque::new(),
            try_number: 1,
            launch_handle: None,
            stats,
            harness,
            etc: None,
            to_go: None,
        }
        .with_retry_queue()
    }

    fn with_retry_queue(mut self) -> Self {
        self.retry_delays = self.def.retry_delays.iter().copied().collect();
        self
    }

    pub fn def(&self) -> &TaskDef {
        &self.def
    }

    pub fn status(&self) -> TaskStatus {
        self.lifecycle.status()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn try_number(&self) -> u32 {
        self.try_number
    }

    pub fn latest_message(&self) -> &str {
        &self.latest_message
    }

    pub fn submitted_time(&self) -> Option<NaiveDateTime> {
        self.submitted_time
    }

    pub fn started_time(&self) -> Option<NaiveDateTime> {
        self.started_time
    }

    pub fn succeeded_time(&self) -> Option<NaiveDateTime> {
        self.succeeded_time
    }

    pub fn retry_start(&self) -> Option<NaiveDateTime> {
        self.retry_delay_timer_start
    }

    pub fn launch_handle(&self) -> Option<&LaunchHandle> {
        self.launch_handle.as_ref()
    }

    // ---------------------------------------------------------------
    // readiness
    // ---------------------------------------------------------------

    /// Ready for submission: queued, or waiting/retry-delayed with all
    /// prerequisites satisfied, with no active retry delay and the contact
    /// gate (if any) open.
    pub fn ready_to_run(&self) -> bool {
        let state_ready = match self.lifecycle.status() {
            TaskStatus::Queued => true,
            TaskStatus::Waiting | TaskStatus::RetryDelayed => self.prerequisites.all_satisfied(),
            _ => false,
        };
        state_ready && self.retry_delay_elapsed() && self.contact_gate_open()
    }

    fn retry_delay_elapsed(&self) -> bool {
        match (self.retry_delay_timer_start, self.current_retry_delay) {
            (Some(start), Some(minutes)) => {
                self.harness.clock.now() - start >= minutes_to_duration(minutes)
            }
            _ => true,
        }
    }

    /// Contact tasks wait for the wall clock to reach cycle time + offset.
    fn contact_gate_open(&self) -> bool {
        if !self.def.is_contact() {
            return true;
        }
        match self.id.tag {
            CycleTag::Time(point) => {
                let gate = point + minutes_to_duration(self.def.contact_offset_hours * 60.0);
                self.harness.clock.now() >= gate
            }
            CycleTag::Seq(_) => true,
        }
    }

    /// Promote an expired retry delay back to waiting. Returns true when
    /// the promotion happened.
    pub fn promote_retry(&mut self) -> Result<bool, StateError> {
        if self.lifecycle.status() == TaskStatus::RetryDelayed && self.retry_delay_elapsed() {
            self.lifecycle.advance(TaskStatus::Waiting)?;
            self.retry_delay_timer_start = None;
            self.current_retry_delay = None;
            return Ok(true);
        }
        Ok(false)
    }

    // ---------------------------------------------------------------
    // submission
    // ---------------------------------------------------------------

    /// Submit via the named method. Launcher failures are absorbed into
    /// the failed state (with the submission-failed hook); only an illegal
    /// lifecycle transition propagates.
    pub fn submit(
        &mut self,
        registry: &LauncherRegistry,
        method: &str,
        job_log_dir: &Path,
        shell: &str,
        dry_run: bool,
    ) -> Result<(), StateError> {
        Priority::Debug.log(&self.id, "submitting task job script");
        // a fresh handle per submission: a re-triggered task gets new job
        // logs instead of overwriting the old ones
        let spec = self.job_spec(job_log_dir, shell);
        match registry
            .resolve(method)
            .and_then(|launcher| launcher.submit(&spec, dry_run))
        {
            Ok(handle) => {
                self.launch_handle = Some(handle);
                self.set_submitted()
            }
            Err(err) => {
                self.set_submit_failed(&format!("job submission failed: {}", err));
                Ok(())
            }
        }
    }

    fn job_spec(&self, job_log_dir: &Path, shell: &str) -> JobSpec {
        JobSpec {
            id: self.id.clone(),
            suite: self.harness.suite.clone(),
            initial_scripting: self.def.initial_scripting.clone(),
            pre_command: self.def.pre_command.clone(),
            command: self.def.command.clone(),
            post_command: self.def.post_command.clone(),
            try_number: self.try_number,
            environment: self.def.environment.clone(),
            directives: self.def.directives.clone(),
            namespace_hierarchy: self.def.namespace_hierarchy(),
            logfiles: self.def.logfiles.clone(),
            owner: self.def.owner.clone(),
            job_log_dir: job_log_dir.to_path_buf(),
            shell: shell.to_string(),
        }
    }

    fn set_submitted(&mut self) -> Result<(), StateError> {
        self.lifecycle.advance(TaskStatus::Submitted)?;
        Priority::Normal.log(&self.id, "job submitted");
        let now = self.harness.clock.now();
        self.submitted_time = Some(now);
        self.submission_timer_start = Some(now);
        self.fire_hook(HookEvent::Submitted, "(task submitted)");
        Ok(())
    }

    fn set_running(&mut self) {
        self.lifecycle.set_status(TaskStatus::Running);
        let now = self.harness.clock.now();
        self.started_time = Some(now);
        self.execution_timer_start = Some(now);
        self.fire_hook(HookEvent::Started, "(task started)");
    }

    fn set_succeeded(&mut self) {
        self.lifecycle.set_status(TaskStatus::Succeeded);
        Priority::Normal.log(&self.id, "task succeeded");
        self.fire_hook(HookEvent::Succeeded, "(task succeeded)");
    }

    fn set_failed(&mut self, reason: &str) {
        self.lifecycle.set_status(TaskStatus::Failed);
        Priority::Critical.log(&self.id, reason);
        self.fire_hook(HookEvent::Failed, reason);
    }

    fn set_submit_failed(&mut self, reason: &str) {
        self.lifecycle.set_status(TaskStatus::Failed);
        Priority::Critical.log(&self.id, reason);
        self.fire_hook(HookEvent::SubmissionFailed, reason);
    }

    fn fire_hook(&self, event: HookEvent, message: &str) {
        if !self.def.hooks.handles(event) {
            return;
        }
        if let Some(script) = &self.def.hooks.script {
            Priority::Normal.log(&self.id, &format!("calling task {} hook script", event));
            self.harness
                .hooks
                .fire(script, event, &self.harness.suite, &self.id, message);
        }
    }

    // ---------------------------------------------------------------
    // message absorption
    // ---------------------------------------------------------------

    /// Absorb one progress message. The ordering here is load-bearing:
    /// warning hook before the failed-state drop, state-changed flag before
    /// any state transition or hook firing.
    pub fn incoming(&mut self, priority: Priority, message: &str) {
        if priority == Priority::Warning {
            if let Some(script) = &self.def.hooks.script {
                self.harness.hooks.fire(
                    script,
                    HookEvent::Warning,
                    &self.harness.suite,
                    &self.id,
                    message,
                );
            }
        }

        if self.lifecycle.status() == TaskStatus::Failed {
            if self.def.resurrectable {
                Priority::Warning.log(
                    &self.id,
                    "message received while failed: returning from the dead",
                );
            } else {
                Priority::Warning.log(&self.id, "rejecting a message received while failed:");
                Priority::Warning.log(&self.id, &format!("  {}", message));
                return;
            }
        }

        if self.def.reset_execution_timeout {
            self.execution_timer_start = Some(self.harness.clock.now());
        }

        self.latest_message = message.to_string();
        self.latest_message_priority = priority;
        self.harness.flag.raise();

        if message == self.id.started_message() && self.lifecycle.status() != TaskStatus::Running {
            self.set_running();
        }
        if self.lifecycle.status() != TaskStatus::Running {
            Priority::Warning.log(&self.id, "UNEXPECTED MESSAGE (task should not be running)");
            Priority::Warning.log(&self.id, &format!("-> {}", message));
        }

        if message == self.id.failed_message() {
            self.succeeded_time = Some(self.harness.clock.now());
            match self.retry_delays.pop_front() {
                Some(minutes) => {
                    Priority::Normal
                        .log(&self.id, &format!("setting retry delay: {} minutes", minutes));
                    self.current_retry_delay = Some(minutes);
                    self.retry_delay_timer_start = Some(self.harness.clock.now());
                    self.try_number += 1;
                    self.lifecycle.set_status(TaskStatus::RetryDelayed);
                    self.prerequisites.set_all_satisfied();
                    self.outputs.set_all_incomplete();
                    self.fire_hook(HookEvent::Retry, "(task retrying)");
                }
                None => {
                    // failure outputs are not registered in advance; add
                    // one now so downstream tasks can trigger off it
                    self.outputs.add(message, true);
                    self.set_failed(message);
                }
            }
            return;
        }

        if self.outputs.exists(message) {
            if !self.outputs.is_completed(message) {
                priority.log(&self.id, message);
                if let Err(err) = self.outputs.set_completed(message) {
                    Priority::Warning.log(&self.id, &err.to_string());
                }
                if message == self.id.succeeded_message() {
                    let now = self.harness.clock.now();
                    self.succeeded_time = Some(now);
                    if let Some(started) = self.started_time {
                        self.stats
                            .lock()
                            .record_elapsed((now - started).num_seconds());
                    }
                    // workers report "succeeded"; the coarse "finished"
                    // output other tasks trigger off completes with it
                    let finished = self.id.finished_message();
                    if self.outputs.exists(&finished) {
                        let _ = self.outputs.set_completed(&finished);
                    }
                    if self.outputs.all_completed() {
                        self.set_succeeded();
                    } else {
                        self.set_failed("succeeded before all outputs were completed");
                    }
                }
            } else {
                Priority::Warning.log(&self.id, "UNEXPECTED OUTPUT (already completed):");
                Priority::Warning.log(&self.id, &format!("-> {}", message));
            }
        } else {
            priority.log(&self.id, &format!("*{}", message));
        }
    }

    // ---------------------------------------------------------------
    // timers
    // ---------------------------------------------------------------

    /// Fire the submission-timeout hook once if the job has been submitted
    /// longer than the configured limit without starting.
    pub fn check_submission_timeout(&mut self) {
        if !self.def.hooks.handles(HookEvent::SubmissionTimeout) {
            return;
        }
        let Some(minutes) = self.def.submission_timeout_minutes else {
            return;
        };
        let Some(start) = self.submission_timer_start else {
            return;
        };
        if self.lifecycle.status() != TaskStatus::Submitted {
            return;
        }
        if self.harness.clock.now() > start + minutes_to_duration(minutes) {
            let message = format!("submitted {} minutes ago, but has not started", minutes);
            Priority::Warning.log(&self.id, &message);
            self.fire_hook(HookEvent::SubmissionTimeout, &message);
            // null the timer so the hook fires once
            self.submission_timer_start = None;
        }
    }

    /// Fire the execution-timeout hook once if the job has been running
    /// longer than the configured limit without succeeding.
    pub fn check_execution_timeout(&mut self) {
        if !self.def.hooks.handles(HookEvent::ExecutionTimeout) {
            return;
        }
        let Some(minutes) = self.def.execution_timeout_minutes else {
            return;
        };
        let Some(start) = self.execution_timer_start else {
            return;
        };
        if self.lifecycle.status() != TaskStatus::Running {
            return;
        }
        if self.harness.clock.now() > start + minutes_to_duration(minutes) {
            let message = if self.def.reset_execution_timeout {
                format!("last message {} minutes ago, but has not succeeded", minutes)
            } else {
                format!("started {} minutes ago, but has not succeeded", minutes)
            };
            Priority::Warning.log(&self.id, &message);
            self.fire_hook(HookEvent::ExecutionTimeout, &message);
            self.execution_timer_start = None;
        }
    }

    // ---------------------------------------------------------------
    // operator resets
    // ---------------------------------------------------------------

    /// Remove a synthetic failed output, so a later success is not seen as
    /// having incomplete outputs.
    fn unfail(&mut self) {
        let failed = self.id.failed_message();
        if self.outputs.exists(&failed) {
            self.outputs.remove(&failed);
        }
    }

    /// Waiting with prerequisites forced satisfied: runs next tick.
    pub fn reset_state_ready(&mut self) {
        self.lifecycle.set_status(TaskStatus::Waiting);
        self.prerequisites.set_all_satisfied();
        self.unfail();
        self.outputs.set_all_incomplete();
    }

    /// Waiting with prerequisites unsatisfied.
    pub fn reset_state_waiting(&mut self) {
        self.lifecycle.set_status(TaskStatus::Waiting);
        self.prerequisites.set_all_unsatisfied();
        self.unfail();
        self.outputs.set_all_incomplete();
    }

    /// Succeeded with all outputs completed.
    pub fn reset_state_succeeded(&mut self) {
        self.lifecycle.set_status(TaskStatus::Succeeded);
        self.prerequisites.set_all_satisfied();
        self.unfail();
        self.outputs.set_all_completed();
    }

    /// Failed, with a synthetic failed output as if the message came in.
    pub fn reset_state_failed(&mut self) {
        self.lifecycle.set_status(TaskStatus::Failed);
        self.prerequisites.set_all_satisfied();
        self.outputs.set_all_incomplete();
        self.outputs.add(self.id.failed_message(), true);
    }

    pub fn reset_state_held(&mut self) {
        self.lifecycle.set_status(TaskStatus::Held);
    }

    /// Feed every registered internal output back through `incoming`, for
    /// simulation mode.
    pub fn set_all_internal_outputs_completed(&mut self) {
        if self.lifecycle.status() == TaskStatus::Failed && !self.def.resurrectable {
            Priority::Warning.log(
                &self.id,
                "rejecting set_all_internal_outputs_completed while failed",
            );
            return;
        }
        Priority::Debug.log(&self.id, "setting all internal outputs completed");
        let skip = [
            self.id.started_message(),
            self.id.succeeded_message(),
            self.id.finished_message(),
        ];
        let internal: Vec<String> = self
            .outputs
            .iter()
            .map(|(message, _)| message.to_string())
            .filter(|message| !skip.contains(message))
            .collect();
        for message in internal {
            self.incoming(Priority::Normal, &message);
        }
    }

    // ---------------------------------------------------------------
    // satisfaction and spawning
    // ---------------------------------------------------------------

    /// Satisfy my prerequisites (and suicide prerequisites, if any are
    /// declared) against another instance's completed outputs.
    pub fn satisfy_me(&mut self, owner: &TaskId, outputs: &OutputSet) {
        self.prerequisites.satisfy_me(owner, outputs);
        if !self.suicide_prerequisites.is_empty() {
            self.suicide_prerequisites.satisfy_me(owner, outputs);
        }
    }

    pub fn not_fully_satisfied(&self) -> bool {
        !self.prerequisites.all_satisfied() || !self.suicide_prerequisites.all_satisfied()
    }

    /// All declared suicide prerequisites satisfied: this proxy asks to be
    /// retired. An empty suicide set never triggers.
    pub fn suicide_requested(&self) -> bool {
        !self.suicide_prerequisites.is_empty() && self.suicide_prerequisites.all_satisfied()
    }

    /// The tag of this task's next instance.
    pub fn next_tag(&self) -> CycleTag {
        self.id.tag.next_valid(&self.def.valid_hours)
    }

    /// One-off tasks report spawned without ever spawning.
    pub fn has_spawned(&self) -> bool {
        self.def.is_oneoff() || self.lifecycle.has_spawned()
    }

    /// Produce the successor instance and set the spawned bit. At most
    /// once per proxy.
    pub fn spawn(&mut self) -> Result<TaskProxy, StateError> {
        self.lifecycle.set_spawned()?;
        Ok(TaskProxy::new(
            Arc::clone(&self.def),
            self.next_tag(),
            TaskStatus::Waiting,
            false,
            Arc::clone(&self.stats),
            self.harness.clone(),
        ))
    }

    /// Succeeded and spawned.
    pub fn done(&self) -> bool {
        self.lifecycle.status() == TaskStatus::Succeeded && self.has_spawned()
    }

    /// Terminal for retirement: done, or failed with no retries left.
    pub fn is_spent(&self) -> bool {
        self.done()
            || (self.lifecycle.status() == TaskStatus::Failed && self.retry_delays.is_empty())
    }

    // ---------------------------------------------------------------
    // reporting
    // ---------------------------------------------------------------

    /// State-dump line for this proxy.
    pub fn dump_line(&self) -> String {
        format!("{} : {}", self.id, self.lifecycle.dump())
    }

    /// Flat record for external monitors, including the estimated time of
    /// completion once a mean elapsed time is known.
    pub fn get_state_summary(&mut self) -> TaskSummary {
        let mean = self.stats.lock().mean_secs();
        let now = self.harness.clock.now();

        let (mean_str, etc_str) = match mean {
            Some(mean_secs) => {
                let mean_str = time_fmt::elapsed(mean_secs);
                let etc_str = match self.started_time {
                    Some(started) if self.succeeded_time.is_none() => {
                        let run_time = (now - started).num_seconds();
                        let to_go = mean_secs - run_time;
                        let etc = now + Duration::seconds(to_go);
                        self.to_go = Some(to_go);
                        self.etc = Some(etc);
                        format!("{}({})", hms(etc), time_fmt::elapsed(to_go))
                    }
                    Some(_) => match (self.etc, self.to_go) {
                        // succeeded: keep the final prediction
                        (Some(etc), Some(to_go)) => {
                            format!("{}({})", hms(etc), time_fmt::elapsed(to_go))
                        }
                        _ => "*".to_string(),
                    },
                    None => "*".to_string(),
                };
                (mean_str, etc_str)
            }
            None => ("*".to_string(), "*".to_string()),
        };

        TaskSummary {
            name: self.def.name.clone(),
            tag: self.id.tag.to_string(),
            state: self.lifecycle.status(),
            spawned: self.has_spawned(),
            n_total_outputs: self.outputs.count(),
            n_completed_outputs: self.outputs.count_completed(),
            latest_message: self.latest_message.clone(),
            latest_message_priority: self.latest_message_priority,
            submitted_time: hms_or_star(self.submitted_time),
            started_time: hms_or_star(self.started_time),
            succeeded_time: hms_or_star(self.succeeded_time),
            mean_total_elapsed_time: mean_str,
            etc: etc_str,
            logfiles: self.def.logfiles.clone(),
        }
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
