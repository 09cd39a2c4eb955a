// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-cutting invariants checked over whole scheduler runs.

use crate::prelude::*;
use chrono::Duration;
use rota_core::TaskStatus;
use rota_suite::HookEvent;

const HOOKED: &str = r#"
[tasks.a]
hook_script = "/bin/alert"
hook_events = ["submitted", "started", "succeeded", "failed"]

[graph]
"0,6" = "a => b"
"#;

#[test]
fn timestamps_are_monotone() {
    let mut rig = Rig::new(HOOKED, "2024010100");
    rig.tick();
    rig.clock.advance(Duration::seconds(7));
    rig.send("a%2024010100", "started");
    rig.clock.advance(Duration::seconds(53));
    rig.send("a%2024010100", "succeeded");

    let a = rig.manager.proxy(&rig.id("a%2024010100")).unwrap();
    let submitted = a.submitted_time().unwrap();
    let started = a.started_time().unwrap();
    let succeeded = a.succeeded_time().unwrap();
    assert!(submitted <= started);
    assert!(started <= succeeded);
    assert_eq!(succeeded - submitted, Duration::seconds(60));
}

#[test]
fn every_spawned_proxy_has_a_live_successor() {
    let mut rig = Rig::new(HOOKED, "2024010100");
    rig.tick();
    rig.send("a%2024010100", "started");
    rig.tick();
    rig.send("a%2024010100", "succeeded");
    rig.tick();
    rig.send("b%2024010100", "started");
    rig.tick();

    let spawned: Vec<_> = rig
        .manager
        .proxies()
        .filter(|p| p.lifecycle().has_spawned())
        .map(|p| (p.id.clone(), p.next_tag()))
        .collect();
    assert!(!spawned.is_empty());
    for (id, next_tag) in spawned {
        let successor = rota_core::TaskId::new(id.name.clone(), next_tag);
        assert!(
            rig.manager.proxy(&successor).is_some(),
            "{} spawned but {} is not live",
            id,
            successor
        );
    }
}

#[test]
fn hooks_fire_exactly_once_per_state_entry() {
    let mut rig = Rig::new(HOOKED, "2024010100");
    rig.tick();
    rig.send("a%2024010100", "started");
    rig.send("a%2024010100", "succeeded");
    rig.tick();

    assert_eq!(rig.hooks.count(HookEvent::Submitted), 1);
    assert_eq!(rig.hooks.count(HookEvent::Started), 1);
    assert_eq!(rig.hooks.count(HookEvent::Succeeded), 1);
    // no transition into failed happened, so no failed hook
    assert_eq!(rig.hooks.count(HookEvent::Failed), 0);

    // a's successor submits too (b has no hook script configured)
    rig.tick();
    assert_eq!(rig.hooks.count(HookEvent::Submitted), 2);
}

#[test]
fn no_live_unsatisfied_prerequisite_names_a_retired_tag() {
    let mut rig = Rig::new(HOOKED, "2024010100");
    // finish batch 00 and start batch 06
    rig.tick();
    rig.send("a%2024010100", "started");
    rig.tick();
    rig.send("a%2024010100", "succeeded");
    rig.tick();
    rig.send("b%2024010100", "started");
    rig.tick();
    rig.send("b%2024010100", "succeeded");
    rig.tick();
    rig.send("a%2024010106", "started");
    rig.tick();
    assert!(!rig.has_proxy("a%2024010100"));

    // anything still unsatisfied refers only to live tags
    for proxy in rig.manager.proxies() {
        for (message, satisfied) in proxy.prerequisites.iter() {
            if !satisfied {
                assert!(
                    !message.contains("2024010100"),
                    "{} still waits on retired batch output {:?}",
                    proxy.id,
                    message
                );
            }
        }
    }
}

#[test]
fn summaries_cover_the_whole_population() {
    let mut rig = Rig::new(HOOKED, "2024010100");
    let report = rig.tick();
    assert_eq!(report.summaries.len(), rig.manager.len());
    let states: Vec<TaskStatus> = report.summaries.iter().map(|s| s.state).collect();
    assert!(states.contains(&TaskStatus::Submitted));
    assert!(states.contains(&TaskStatus::Waiting));
}

#[test]
fn the_change_flag_tracks_message_arrival() {
    let mut rig = Rig::new(HOOKED, "2024010100");
    let flag = rig.manager.change_flag();
    rig.tick();
    assert!(!flag.is_raised());
    rig.send("a%2024010100", "started");
    assert!(flag.is_raised());
    rig.tick();
    assert!(!flag.is_raised());
}
