// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dummy-mode end-to-end: simulated execution cycles the whole suite
//! forward without any real job submission.

use crate::prelude::*;
use chrono::Duration;
use rota_core::TaskStatus;

const SUITE: &str = r#"
dummy_mode = true

[dummy]
run_length_seconds = 10

[graph]
"0,12" = """
obs => model
model => products
"""
"#;

#[test]
fn a_full_cycle_completes_and_the_next_begins() {
    let mut rig = Rig::new(SUITE, "2024010100");

    // run the simulated suite for a while
    for _ in 0..40 {
        rig.clock.advance(Duration::seconds(5));
        rig.tick();
    }

    // the startup batch finished and was retired, and the suite rolled on
    // to later cycles
    assert!(!rig.has_proxy("obs%2024010100"));
    assert!(!rig.manager.is_empty());
    let start = rota_core::CycleTag::parse("2024010100").unwrap();
    assert!(rig.manager.proxies().all(|p| p.id.tag > start));

    // no real submissions in dummy mode
    assert!(rig.launcher.submissions().is_empty());
}

#[test]
fn simulation_respects_the_run_length() {
    let mut rig = Rig::new(SUITE, "2024010100");
    rig.tick();
    assert_eq!(rig.status("obs%2024010100"), TaskStatus::Running);

    rig.clock.advance(Duration::seconds(5));
    rig.tick();
    assert_eq!(rig.status("obs%2024010100"), TaskStatus::Running);

    rig.clock.advance(Duration::seconds(5));
    rig.tick();
    assert_eq!(rig.status("obs%2024010100"), TaskStatus::Succeeded);
}
