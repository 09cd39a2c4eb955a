// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retirement sweep: the intercycle cutoff and the feeder rule.

use crate::prelude::*;
use rota_core::TaskStatus;

const AB: &str = r#"
[graph]
"0,6" = "a => b"
"#;

/// Drive one batch from waiting through succeeded-and-spawned.
fn finish_batch(rig: &mut Rig, tag: &str) {
    rig.tick();
    rig.send(&format!("a%{}", tag), "started");
    rig.tick(); // spawn a@next
    rig.send(&format!("a%{}", tag), "succeeded");
    rig.tick(); // launch b
    rig.send(&format!("b%{}", tag), "started");
    rig.tick(); // spawn b@next
    rig.send(&format!("b%{}", tag), "succeeded");
}

#[test]
fn finished_batches_behind_the_oldest_running_are_deleted() {
    let mut rig = Rig::new(AB, "2024010100");
    finish_batch(&mut rig, "2024010100");

    rig.tick();
    rig.send("a%2024010106", "started");
    rig.tick();

    assert!(!rig.has_proxy("a%2024010100"));
    assert!(!rig.has_proxy("b%2024010100"));
    assert!(rig.has_proxy("a%2024010106"));
    assert!(rig.has_proxy("b%2024010106"));

    // retirement deregistered the identities from the transport
    assert!(!rig.hub.is_registered(&rig.id("a%2024010100")));
    assert!(rig.hub.is_registered(&rig.id("a%2024010106")));
}

#[test]
fn unfinished_batches_are_never_deleted() {
    let mut rig = Rig::new(AB, "2024010100");
    rig.tick();
    rig.send("a%2024010100", "started");
    rig.tick();
    rig.send("a%2024010100", "succeeded");
    rig.tick();

    // b@00 still waiting-to-run: batch 00 is not finished, and nothing is
    // running, so nothing goes
    rig.send("b%2024010100", "started");
    rig.tick();
    assert!(rig.has_proxy("a%2024010100"));
}

const FEEDER: &str = r#"
[tasks.f]
feeder = true

[graph]
"0,6" = "f => x"
"#;

#[test]
fn cutoff_is_pulled_back_to_the_most_recent_finished_feeder() {
    let mut rig = Rig::new(FEEDER, "2024010100");

    // batch 00 fully finished
    rig.tick();
    rig.send("f%2024010100", "started");
    rig.tick();
    rig.send("f%2024010100", "succeeded");
    rig.tick();
    rig.send("x%2024010100", "started");
    rig.tick();
    rig.send("x%2024010100", "succeeded");

    // f@06 running but not finished: a catchup consumer may still need
    // the tag-00 feeder outputs
    rig.send("f%2024010106", "started");
    rig.tick();

    assert!(rig.has_proxy("f%2024010100"));
    assert!(rig.has_proxy("x%2024010100"));
}

#[test]
fn cutoff_advances_once_the_feeder_finishes() {
    let mut rig = Rig::new(FEEDER, "2024010100");
    rig.tick();
    rig.send("f%2024010100", "started");
    rig.tick();
    rig.send("f%2024010100", "succeeded");
    rig.tick();
    rig.send("x%2024010100", "started");
    rig.tick();
    rig.send("x%2024010100", "succeeded");

    rig.send("f%2024010106", "started");
    rig.tick();
    rig.send("f%2024010106", "succeeded");
    rig.tick();
    rig.send("x%2024010106", "started");
    rig.tick();

    // most recent finished feeder is now 06 and the oldest running tag is
    // 06: batch 00 goes
    assert!(!rig.has_proxy("f%2024010100"));
    assert!(!rig.has_proxy("x%2024010100"));
    assert_eq!(rig.status("x%2024010106"), TaskStatus::Running);
}
