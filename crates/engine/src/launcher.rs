// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job submission back-ends.
//!
//! Launchers are resolved from a registry by method name; an unknown name
//! is a structured error, not a runtime lookup failure. The shipped
//! `background` method assembles a shell script from the task's commands
//! and spawns it detached, with stdout/stderr redirected to per-try job
//! logs. Jobs are never awaited; completion is reported back through the
//! message transport by the job itself.

use indexmap::IndexMap;
use rota_core::TaskId;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// The fixed parameter vector handed to a launcher for one submission.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub id: TaskId,
    pub suite: String,
    pub initial_scripting: Option<String>,
    pub pre_command: Option<String>,
    pub command: Option<String>,
    pub post_command: Option<String>,
    pub try_number: u32,
    pub environment: IndexMap<String, String>,
    pub directives: IndexMap<String, String>,
    pub namespace_hierarchy: Vec<String>,
    pub logfiles: Vec<String>,
    pub owner: Option<String>,
    pub job_log_dir: PathBuf,
    pub shell: String,
}

impl JobSpec {
    /// stdout/stderr log paths for this try.
    pub fn log_paths(&self) -> (PathBuf, PathBuf) {
        let stem = format!("{}-try{}", self.id, self.try_number);
        (
            self.job_log_dir.join(format!("{}.out", stem)),
            self.job_log_dir.join(format!("{}.err", stem)),
        )
    }

    /// Assemble the job script: initial scripting, environment exports,
    /// then pre/main/post commands.
    pub fn script(&self) -> String {
        let mut lines = Vec::new();
        if let Some(scripting) = &self.initial_scripting {
            lines.push(scripting.clone());
        }
        for (key, value) in &self.environment {
            lines.push(format!("export {}=\"{}\"", key, value));
        }
        for command in [&self.pre_command, &self.command, &self.post_command]
            .into_iter()
            .flatten()
        {
            lines.push(command.clone());
        }
        lines.join("\n")
    }
}

/// Errors from job submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("job submission method not registered: {0}")]
    UnknownMethod(String),
    #[error("job submission rejected: {0}")]
    Rejected(String),
    #[error("failed to launch job: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to one accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchHandle {
    pub submission_id: String,
    pub pid: Option<u32>,
}

impl LaunchHandle {
    fn new(pid: Option<u32>) -> Self {
        Self {
            submission_id: Uuid::new_v4().to_string(),
            pid,
        }
    }
}

/// A job submission back-end.
pub trait Launcher: Send + Sync + std::fmt::Debug {
    fn submit(&self, job: &JobSpec, dry_run: bool) -> Result<LaunchHandle, SubmitError>;
}

/// Registry of launchers by method name.
#[derive(Clone, Default)]
pub struct LauncherRegistry {
    methods: HashMap<String, Arc<dyn Launcher>>,
}

impl LauncherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in methods: `background` and `dummy`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("background", Arc::new(BackgroundLauncher));
        registry.register("dummy", Arc::new(DummyLauncher));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, launcher: Arc<dyn Launcher>) {
        self.methods.insert(name.into(), launcher);
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Launcher>, SubmitError> {
        self.methods
            .get(name)
            .cloned()
            .ok_or_else(|| SubmitError::UnknownMethod(name.to_string()))
    }
}

/// Detached local-shell launcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackgroundLauncher;

impl Launcher for BackgroundLauncher {
    fn submit(&self, job: &JobSpec, dry_run: bool) -> Result<LaunchHandle, SubmitError> {
        let script = job.script();
        if dry_run {
            tracing::info!(task = %job.id, "dry run, job script not submitted:\n{}", script);
            return Ok(LaunchHandle::new(None));
        }
        std::fs::create_dir_all(&job.job_log_dir)?;
        let (out_path, err_path) = job.log_paths();
        let stdout = std::fs::File::create(out_path)?;
        let stderr = std::fs::File::create(err_path)?;
        let child = Command::new(&job.shell)
            .arg("-c")
            .arg(&script)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()?;
        // the child is dropped, not awaited; the job runs detached
        Ok(LaunchHandle::new(Some(child.id())))
    }
}

/// Accepts every submission without running anything. Used in dummy mode,
/// where the manager simulates task execution instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyLauncher;

impl Launcher for DummyLauncher {
    fn submit(&self, job: &JobSpec, _dry_run: bool) -> Result<LaunchHandle, SubmitError> {
        tracing::debug!(task = %job.id, "dummy submission accepted");
        Ok(LaunchHandle::new(None))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeLauncher;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Test double recording every submission; can be primed to reject.
    #[derive(Debug, Clone, Default)]
    pub struct FakeLauncher {
        submissions: Arc<Mutex<Vec<(TaskId, u32, bool)>>>,
        reject: Arc<AtomicBool>,
    }

    impl FakeLauncher {
        pub fn new() -> Self {
            Self::default()
        }

        /// (task, try number, dry run) per accepted submission.
        pub fn submissions(&self) -> Vec<(TaskId, u32, bool)> {
            self.submissions.lock().clone()
        }

        pub fn set_reject(&self, reject: bool) {
            self.reject.store(reject, Ordering::SeqCst);
        }
    }

    impl Launcher for FakeLauncher {
        fn submit(&self, job: &JobSpec, dry_run: bool) -> Result<LaunchHandle, SubmitError> {
            if self.reject.load(Ordering::SeqCst) {
                return Err(SubmitError::Rejected("rejected by fake launcher".into()));
            }
            self.submissions
                .lock()
                .push((job.id.clone(), job.try_number, dry_run));
            Ok(LaunchHandle::new(None))
        }
    }
}

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
