// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Intercycle dependencies, coldstart prerequisites, and cycle spawning.

use crate::prelude::*;
use rota_core::TaskStatus;
use rota_engine::ResetTarget;

const CYCLING_MODEL: &str = r#"
[graph]
"0,6,12,18" = "model(T-6) => model"
"#;

#[test]
fn intercycle_prerequisite_names_the_previous_cycle() {
    let rig = Rig::new(CYCLING_MODEL, "2024010106");
    let model = rig.manager.proxy(&rig.id("model%2024010106")).unwrap();
    assert!(model.prerequisites.exists("model%2024010100 finished"));
    assert!(model.def().intercycle);
}

#[test]
fn successor_waits_on_the_instance_that_spawned_it() {
    let mut rig = Rig::new(CYCLING_MODEL, "2024010106");

    // force the startup instance off (its T-6 predecessor predates the run)
    rig.manager
        .reset_task(&rig.id("model%2024010106"), ResetTarget::Ready);
    rig.tick();
    assert_eq!(rig.status("model%2024010106"), TaskStatus::Submitted);

    rig.send("model%2024010106", "started");
    rig.tick();

    // spawned at the next valid hour, waiting on 06's finished output
    assert!(rig.has_proxy("model%2024010112"));
    let next = rig.manager.proxy(&rig.id("model%2024010112")).unwrap();
    assert!(next.prerequisites.exists("model%2024010106 finished"));
    assert!(!next.prerequisites.all_satisfied());

    rig.send("model%2024010106", "succeeded");
    rig.tick();
    assert_eq!(rig.status("model%2024010112"), TaskStatus::Submitted);
}

#[test]
fn coldstart_and_intercycle_prerequisites_compose_at_startup() {
    let suite = r#"
[graph]
"0,6" = """
coldstart|prep => model
model(T-6) => model
"""
"#;
    let rig = Rig::new(suite, "2024010100");
    let model = rig.manager.proxy(&rig.id("model%2024010100")).unwrap();
    assert!(model.prerequisites.exists("prep%2024010100 finished"));
    assert!(model.prerequisites.exists("model%2023123118 finished"));
}

#[test]
fn coldstart_prerequisites_apply_only_at_startup() {
    let suite = r#"
[graph]
"0,6" = "coldstart|prep => model"
"#;
    let mut rig = Rig::new(suite, "2024010100");

    // at startup the model instance triggers off the coldstart task
    let model = rig.manager.proxy(&rig.id("model%2024010100")).unwrap();
    assert!(model.prerequisites.exists("prep%2024010100 finished"));

    rig.tick();
    assert_eq!(rig.status("prep%2024010100"), TaskStatus::Submitted);
    rig.send("prep%2024010100", "started");
    rig.send("prep%2024010100", "succeeded");
    rig.tick();
    assert_eq!(rig.status("model%2024010100"), TaskStatus::Submitted);
    rig.send("model%2024010100", "started");
    rig.tick();

    // the spawned 06 instance has no coldstart prerequisite
    let next = rig.manager.proxy(&rig.id("model%2024010106")).unwrap();
    assert!(!next.prerequisites.exists("prep%2024010106 finished"));
    assert!(next.prerequisites.all_satisfied());

    // prep is oneoff: no 06 instance was spawned for it
    assert!(!rig.has_proxy("prep%2024010106"));
}

const TIED: &str = r#"
[tasks.model]
modifiers = ["model(restarts=1)"]

[graph]
"0,6" = "model_coldstart|prep => model"
"#;

#[test]
fn restart_outputs_chain_tied_instances() {
    let mut rig = Rig::new(TIED, "2024010100");

    // the coldstart provider owns the startup restart output
    let prep = rig.manager.proxy(&rig.id("prep%2024010100")).unwrap();
    assert!(prep
        .outputs
        .exists("model restart files ready for 2024010100"));

    // the tied model waits on it
    let model = rig.manager.proxy(&rig.id("model%2024010100")).unwrap();
    assert!(model
        .prerequisites
        .exists("model restart files ready for 2024010100"));
    assert!(model
        .outputs
        .exists("model restart files ready for 2024010106"));

    rig.tick();
    rig.send("prep%2024010100", "started");
    let prep_id = rig.id("prep%2024010100");
    rig.client.incoming(
        &prep_id,
        rota_core::Priority::Normal,
        "model restart files ready for 2024010100",
    );
    rig.pump();
    rig.send("prep%2024010100", "succeeded");

    rig.tick();
    assert_eq!(rig.status("model%2024010100"), TaskStatus::Submitted);

    // the running model feeds the next instance's restart prerequisite
    rig.send("model%2024010100", "started");
    let model_id = rig.id("model%2024010100");
    rig.client.incoming(
        &model_id,
        rota_core::Priority::Normal,
        "model restart files ready for 2024010106",
    );
    rig.pump();
    rig.tick(); // spawns model@06
    rig.tick(); // satisfaction pass sees the restart output
    let next = rig.manager.proxy(&rig.id("model%2024010106")).unwrap();
    assert!(next
        .prerequisites
        .is_satisfied("model restart files ready for 2024010106"));
}
