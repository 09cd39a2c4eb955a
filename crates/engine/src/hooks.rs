// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event hook dispatch.
//!
//! Hook scripts run fire-and-forget: they may be slow, and they may try to
//! operate on the suite (e.g. removing a failed task), which would deadlock
//! a scheduler that waited on them. Failure of a hook script is therefore
//! undetected beyond spawn errors.

use rota_core::TaskId;
use rota_suite::HookEvent;
use std::path::Path;
use std::process::{Command, Stdio};

/// Dispatches lifecycle event hooks.
pub trait HookRunner: Send + Sync + std::fmt::Debug {
    /// Invoke `<script> <event> <suite> <task-id> <message>`; never await.
    fn fire(&self, script: &Path, event: HookEvent, suite: &str, task: &TaskId, message: &str);
}

/// Spawns the configured hook script detached.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptHooks;

impl HookRunner for ScriptHooks {
    fn fire(&self, script: &Path, event: HookEvent, suite: &str, task: &TaskId, message: &str) {
        let result = Command::new(script)
            .arg(event.to_string())
            .arg(suite)
            .arg(task.to_string())
            .arg(message)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match result {
            Ok(_child) => {
                // the child is dropped, not reaped; it runs on its own
                tracing::debug!(task = %task, event = %event, "hook script spawned");
            }
            Err(err) => {
                tracing::warn!(
                    task = %task,
                    event = %event,
                    script = %script.display(),
                    error = %err,
                    "failed to spawn hook script"
                );
            }
        }
    }
}

/// Records fired hooks instead of running anything.
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FiredHook, RecordingHooks};

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// One recorded hook invocation.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FiredHook {
        pub event: HookEvent,
        pub task: TaskId,
        pub message: String,
    }

    /// Test double that records every fired hook.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingHooks {
        fired: Arc<Mutex<Vec<FiredHook>>>,
    }

    impl RecordingHooks {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fired(&self) -> Vec<FiredHook> {
            self.fired.lock().clone()
        }

        pub fn count(&self, event: HookEvent) -> usize {
            self.fired.lock().iter().filter(|h| h.event == event).count()
        }

        pub fn clear(&self) {
            self.fired.lock().clear();
        }
    }

    impl HookRunner for RecordingHooks {
        fn fire(
            &self,
            _script: &Path,
            event: HookEvent,
            _suite: &str,
            task: &TaskId,
            message: &str,
        ) {
            self.fired.lock().push(FiredHook {
                event,
                task: task.clone(),
                message: message.to_string(),
            });
        }
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
