// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared scheduler rig for the scenario tests: a real manager, compiler,
//! and message hub wired to a fake clock, recording hooks, and a fake
//! launcher.

use chrono::{NaiveDate, NaiveDateTime};
use rota_core::{ChangeFlag, CycleTag, FakeClock, Priority, TaskId, TaskStatus};
use rota_daemon::{Envelope, HubClient, MessageHub};
use rota_engine::{
    FakeLauncher, LauncherRegistry, ManagerConfig, RecordingHooks, TaskManager, TickReport,
};
use rota_suite::{compile, parse_suite, Format};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub struct Rig {
    pub clock: FakeClock,
    pub hooks: RecordingHooks,
    pub launcher: FakeLauncher,
    pub hub: Arc<MessageHub>,
    pub client: HubClient,
    pub rx: UnboundedReceiver<Envelope>,
    pub manager: TaskManager,
}

impl Rig {
    /// Build a rig from suite TOML, populated at the given initial tag.
    pub fn new(suite_toml: &str, initial_tag: &str) -> Self {
        let suite = parse_suite(suite_toml, Format::Toml).expect("suite parses");
        let compiled = compile(&suite).expect("suite compiles");

        let clock = FakeClock::new(t0());
        let hooks = RecordingHooks::new();
        let launcher = FakeLauncher::new();
        let mut registry = LauncherRegistry::with_builtins();
        registry.register("background", Arc::new(launcher.clone()));

        let (hub, rx) = MessageHub::new();
        let client = hub.client();

        let config = ManagerConfig {
            suite: "testsuite".to_string(),
            initial_tag: CycleTag::parse(initial_tag).expect("initial tag parses"),
            dummy_mode: suite.dummy_mode,
            dummy_run_length_secs: suite.dummy.run_length_seconds,
            job_log_dir: std::env::temp_dir(),
            submission_shell: "/bin/sh".to_string(),
            state_dump_path: None,
            dry_run: false,
        };
        let directory: Arc<dyn rota_engine::ProxyDirectory> = hub.clone();
        let mut manager = TaskManager::new(
            compiled,
            config,
            Arc::new(clock.clone()),
            Arc::new(hooks.clone()),
            registry,
            directory,
            ChangeFlag::new(),
        );
        manager.populate_initial();

        Self {
            clock,
            hooks,
            launcher,
            hub,
            client,
            rx,
            manager,
        }
    }

    pub fn id(&self, text: &str) -> TaskId {
        TaskId::parse(text).expect("task id parses")
    }

    /// Send `"<id> <suffix>"` through the hub, as an external worker would.
    pub fn send(&mut self, id: &str, suffix: &str) {
        let id = self.id(id);
        let message = format!("{} {}", id, suffix);
        assert!(
            self.client.incoming(&id, Priority::Normal, &message),
            "message to {} was dead-lettered",
            id
        );
        self.pump();
    }

    /// Drain queued envelopes into the manager.
    pub fn pump(&mut self) {
        while let Ok(envelope) = self.rx.try_recv() {
            self.manager
                .deliver(&envelope.id, envelope.priority, &envelope.message);
        }
    }

    /// One scheduler tick, with the change flag cleared first.
    pub fn tick(&mut self) -> TickReport {
        self.pump();
        self.manager.change_flag().clear();
        self.manager.tick().expect("tick succeeds")
    }

    pub fn status(&self, id: &str) -> TaskStatus {
        self.manager
            .proxy(&self.id(id))
            .unwrap_or_else(|| panic!("no proxy {}", id))
            .status()
    }

    pub fn has_proxy(&self, id: &str) -> bool {
        self.manager.proxy(&self.id(id)).is_some()
    }
}
