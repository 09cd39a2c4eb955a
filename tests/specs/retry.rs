// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry-with-delay behavior.

use crate::prelude::*;
use chrono::Duration;
use rota_core::TaskStatus;
use rota_suite::HookEvent;

const RETRYING: &str = r#"
[tasks.x]
retry_delays = [0.5, 1.0]
hook_script = "/bin/alert"
hook_events = ["retry", "failed"]

[graph]
"0" = "x => y"
"#;

#[test]
fn failure_with_a_retry_slot_delays_then_requeues() {
    let mut rig = Rig::new(RETRYING, "2024010100");
    rig.tick();
    rig.send("x%2024010100", "started");
    rig.send("x%2024010100", "failed");

    {
        let x = rig.manager.proxy(&rig.id("x%2024010100")).unwrap();
        assert_eq!(x.status(), TaskStatus::RetryDelayed);
        assert_eq!(x.try_number(), 2);
        assert_eq!(x.retry_start(), Some(t0()));
        assert!(x.prerequisites.all_satisfied());
        assert_eq!(x.outputs.count_completed(), 0);
        // the delay has not elapsed
        assert!(!x.ready_to_run());
    }
    assert_eq!(rig.hooks.count(HookEvent::Retry), 1);

    // half a minute later the proxy is ready again
    rig.clock.advance(Duration::seconds(30));
    assert!(rig
        .manager
        .proxy(&rig.id("x%2024010100"))
        .unwrap()
        .ready_to_run());

    // and the next tick resubmits it with the bumped try number
    rig.tick();
    assert_eq!(rig.status("x%2024010100"), TaskStatus::Submitted);
    let submissions = rig.launcher.submissions();
    assert_eq!(submissions.last().unwrap().1, 2);
}

#[test]
fn retries_exhaust_into_terminal_failure() {
    let mut rig = Rig::new(RETRYING, "2024010100");
    rig.tick();

    for expected_try in [2, 3] {
        rig.send("x%2024010100", "started");
        rig.send("x%2024010100", "failed");
        assert_eq!(rig.status("x%2024010100"), TaskStatus::RetryDelayed);
        assert_eq!(
            rig.manager
                .proxy(&rig.id("x%2024010100"))
                .unwrap()
                .try_number(),
            expected_try
        );
        rig.clock.advance(Duration::minutes(2));
        rig.tick();
        assert_eq!(rig.status("x%2024010100"), TaskStatus::Submitted);
    }

    // no slots left: the third failure is final
    rig.send("x%2024010100", "started");
    rig.send("x%2024010100", "failed");
    let x = rig.manager.proxy(&rig.id("x%2024010100")).unwrap();
    assert_eq!(x.status(), TaskStatus::Failed);
    assert!(x.outputs.is_completed("x%2024010100 failed"));
    assert!(x.is_spent());
    assert_eq!(rig.hooks.count(HookEvent::Failed), 1);
    assert_eq!(rig.hooks.count(HookEvent::Retry), 2);
}

#[test]
fn ready_no_earlier_than_the_declared_delay() {
    let mut rig = Rig::new(RETRYING, "2024010100");
    rig.tick();
    rig.send("x%2024010100", "started");
    rig.send("x%2024010100", "failed");

    for seconds in [5, 15, 29] {
        rig.clock.set(t0() + Duration::seconds(seconds));
        assert!(
            !rig.manager
                .proxy(&rig.id("x%2024010100"))
                .unwrap()
                .ready_to_run(),
            "ready {}s into a 30s delay",
            seconds
        );
    }
    rig.clock.set(t0() + Duration::seconds(30));
    assert!(rig
        .manager
        .proxy(&rig.id("x%2024010100"))
        .unwrap()
        .ready_to_run());
}
