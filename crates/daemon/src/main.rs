// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rota daemon (rotad)
//!
//! Loads and compiles a suite, builds the initial proxy population, and
//! runs the cooperative event pump: one scheduling tick per inbound
//! message batch or per bounded timeout.
//!
//! Exit codes: 0 on ALL TASKS DONE, 1 on suite-configuration errors or
//! illegal internal transitions.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rota_core::{ChangeFlag, CycleTag, SystemClock};
use rota_daemon::{MessageHub, Monitor};
use rota_engine::{LauncherRegistry, ManagerConfig, ScriptHooks, TaskManager};
use rota_suite::{compile, load_suite, Suite};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct Args {
    suite_file: PathBuf,
    initial_tag: String,
    dummy: bool,
    dry_run: bool,
}

fn usage() {
    eprintln!("Usage: rotad SUITE_FILE INITIAL_TAG [--dummy] [--dry-run]");
}

fn parse_args() -> Result<Args, i32> {
    let mut positional = Vec::new();
    let mut dummy = false;
    let mut dry_run = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("rotad {}", env!("CARGO_PKG_VERSION"));
                return Err(0);
            }
            "--help" | "-h" | "help" => {
                println!("rotad {}", env!("CARGO_PKG_VERSION"));
                println!("rota daemon - cycling workflow metascheduler");
                println!();
                println!("USAGE:");
                println!("    rotad SUITE_FILE INITIAL_TAG [--dummy] [--dry-run]");
                println!();
                println!("ARGS:");
                println!("    SUITE_FILE     suite configuration (.toml, .hcl, or .json)");
                println!("    INITIAL_TAG    initial cycle tag (YYYYMMDDHH or an integer)");
                println!();
                println!("OPTIONS:");
                println!("    --dummy      simulate task execution instead of submitting jobs");
                println!("    --dry-run    build and log job scripts without submitting");
                println!("    -h, --help       Print help information");
                println!("    -V, --version    Print version information");
                return Err(0);
            }
            "--dummy" => dummy = true,
            "--dry-run" => dry_run = true,
            other if other.starts_with('-') => {
                eprintln!("error: unexpected argument '{other}'");
                usage();
                return Err(1);
            }
            other => positional.push(other.to_string()),
        }
    }
    let [suite_file, initial_tag] = positional.as_slice() else {
        usage();
        return Err(1);
    };
    Ok(Args {
        suite_file: PathBuf::from(suite_file),
        initial_tag: initial_tag.clone(),
        dummy,
        dry_run,
    })
}

fn directory(hub: &Arc<MessageHub>) -> Arc<dyn rota_engine::ProxyDirectory> {
    hub.clone()
}

fn setup_logging(suite: &Suite) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let dir = Path::new(&suite.logging_dir);
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("rotad: cannot create logging directory {}: {}", dir.display(), err);
        return None;
    }
    let appender = tracing_appender::rolling::daily(dir, "suite.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() {
    std::process::exit(run().await);
}

async fn run() -> i32 {
    let args = match parse_args() {
        Ok(args) => args,
        Err(code) => return code,
    };

    let mut suite = match load_suite(&args.suite_file) {
        Ok(suite) => suite,
        Err(err) => {
            eprintln!("rotad: {}", err);
            return 1;
        }
    };
    if args.dummy {
        suite.dummy_mode = true;
    }

    let initial_tag = match CycleTag::parse(&args.initial_tag) {
        Ok(tag) => tag,
        Err(err) => {
            eprintln!("rotad: {}", err);
            return 1;
        }
    };

    let compiled = match compile(&suite) {
        Ok(compiled) => compiled,
        Err(err) => {
            eprintln!("rotad: {}", err);
            return 1;
        }
    };

    let _log_guard = setup_logging(&suite);

    let suite_name = if suite.title.is_empty() {
        args.suite_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "suite".to_string())
    } else {
        suite.title.clone()
    };
    info!(suite = %suite_name, tag = %initial_tag, "startup");

    let (hub, mut rx) = MessageHub::new();
    let monitor = Monitor::new();

    let config = ManagerConfig {
        suite: suite_name,
        initial_tag,
        dummy_mode: suite.dummy_mode,
        dummy_run_length_secs: suite.dummy.run_length_seconds,
        job_log_dir: PathBuf::from(&suite.job_log_dir),
        submission_shell: suite.submission_shell.clone(),
        state_dump_path: Some(PathBuf::from(&suite.state_dump_dir).join("state")),
        dry_run: args.dry_run,
    };
    let mut manager = TaskManager::new(
        compiled,
        config,
        Arc::new(SystemClock),
        Arc::new(ScriptHooks),
        LauncherRegistry::with_builtins(),
        directory(&hub),
        ChangeFlag::new(),
    );
    manager.populate_initial();
    info!(tasks = manager.len(), "initial population created");

    // process once to start tasks that have no prerequisites; thereafter
    // things happen per inbound message or per timer tick
    let flag = manager.change_flag();

    // NOTE: created outside the loop - select! re-evaluates branches each
    // iteration, so a sleep() inside would reset on every message
    let mut interval = tokio::time::interval(Duration::from_secs(1));

    loop {
        flag.clear();
        match manager.tick() {
            Ok(report) => {
                monitor.publish(report.summaries);
                if report.all_done {
                    return 0;
                }
            }
            Err(err) => {
                error!(error = %err, "illegal internal transition");
                return 1;
            }
        }

        tokio::select! {
            maybe = rx.recv() => {
                match maybe {
                    Some(envelope) => {
                        manager.deliver(&envelope.id, envelope.priority, &envelope.message);
                        // drain whatever else arrived before ticking
                        while let Ok(next) = rx.try_recv() {
                            manager.deliver(&next.id, next.priority, &next.message);
                        }
                    }
                    None => {
                        // all transport handles dropped; timers still drive us
                    }
                }
            }
            _ = interval.tick() => {}
        }
    }
}
