// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A depends-on-B suites driven end to end through the hub.

use crate::prelude::*;
use rota_core::TaskStatus;
use rota_suite::HookEvent;

const AB: &str = r#"
[graph]
"0" = "a => b"
"#;

#[test]
fn downstream_submits_after_upstream_succeeds() {
    let mut rig = Rig::new(AB, "2024010100");
    assert!(rig.has_proxy("a%2024010100"));
    assert!(rig.has_proxy("b%2024010100"));

    rig.tick();
    assert_eq!(rig.status("a%2024010100"), TaskStatus::Submitted);
    assert_eq!(rig.status("b%2024010100"), TaskStatus::Waiting);

    rig.send("a%2024010100", "started");
    rig.send("a%2024010100", "succeeded");

    // the next tick satisfies b's prerequisites and submits it
    rig.tick();
    assert_eq!(rig.status("b%2024010100"), TaskStatus::Submitted);
    assert!(rig
        .manager
        .proxy(&rig.id("b%2024010100"))
        .unwrap()
        .prerequisites
        .all_satisfied());
}

#[test]
fn prerequisites_resolve_to_the_satisfying_identity() {
    let mut rig = Rig::new(AB, "2024010100");
    rig.tick();
    rig.send("a%2024010100", "started");
    rig.send("a%2024010100", "succeeded");
    rig.tick();

    let b = rig.manager.proxy(&rig.id("b%2024010100")).unwrap();
    assert_eq!(b.prerequisites.resolved(), vec![rig.id("a%2024010100")]);
}

const WITH_OUTPUTS: &str = r#"
[tasks.y]
hook_script = "/bin/alert"
hook_events = ["failed"]

[tasks.y.outputs]
o1 = "y first product ready for $(CYCLE_TIME)"
o2 = "y second product ready for $(CYCLE_TIME)"

[graph]
"0" = "y:o1 & y:o2 => z"
"#;

#[test]
fn succeeding_before_outputs_complete_fails_the_task() {
    let mut rig = Rig::new(WITH_OUTPUTS, "2024010100");
    rig.tick();
    rig.send("y%2024010100", "started");
    rig.send("y%2024010100", "succeeded");

    assert_eq!(rig.status("y%2024010100"), TaskStatus::Failed);
    assert_eq!(rig.hooks.count(HookEvent::Failed), 1);
    let fired = rig.hooks.fired();
    assert_eq!(
        fired[0].message,
        "succeeded before all outputs were completed"
    );
}

#[test]
fn reporting_every_output_first_succeeds_cleanly() {
    let mut rig = Rig::new(WITH_OUTPUTS, "2024010100");
    rig.tick();
    rig.send("y%2024010100", "started");
    let y = rig.id("y%2024010100");
    rig.client.incoming(
        &y,
        rota_core::Priority::Normal,
        "y first product ready for 2024010100",
    );
    rig.client.incoming(
        &y,
        rota_core::Priority::Normal,
        "y second product ready for 2024010100",
    );
    rig.pump();
    rig.send("y%2024010100", "succeeded");

    assert_eq!(rig.status("y%2024010100"), TaskStatus::Succeeded);
    assert_eq!(rig.hooks.count(HookEvent::Failed), 0);

    // z triggered off both named outputs
    rig.tick();
    assert_eq!(rig.status("z%2024010100"), TaskStatus::Submitted);
}
