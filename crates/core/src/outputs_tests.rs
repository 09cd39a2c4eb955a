// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn set() -> OutputSet {
    let mut outputs = OutputSet::new();
    outputs.add("a%1 started", false);
    outputs.add("a%1 succeeded", false);
    outputs.add("obs file ready for 1", false);
    outputs
}

#[test]
fn declared_outputs_start_incomplete() {
    let outputs = set();
    assert_eq!(outputs.count(), 3);
    assert_eq!(outputs.count_completed(), 0);
    assert!(!outputs.all_completed());
}

#[test]
fn set_completed_flips_one_bit() {
    let mut outputs = set();
    outputs.set_completed("a%1 started").unwrap();
    assert!(outputs.is_completed("a%1 started"));
    assert!(!outputs.is_completed("a%1 succeeded"));
    assert_eq!(outputs.count_completed(), 1);
}

#[test]
fn set_completed_on_unknown_message_fails() {
    let mut outputs = set();
    let err = outputs.set_completed("nope").unwrap_err();
    assert_eq!(err, OutputError::Unknown("nope".to_string()));
}

#[test]
fn set_all_completed_and_incomplete() {
    let mut outputs = set();
    outputs.set_all_completed();
    assert!(outputs.all_completed());
    outputs.set_all_incomplete();
    assert_eq!(outputs.count_completed(), 0);
}

#[test]
fn remove_reports_presence() {
    let mut outputs = set();
    assert!(outputs.remove("obs file ready for 1"));
    assert!(!outputs.remove("obs file ready for 1"));
    assert_eq!(outputs.count(), 2);
}

#[test]
fn failure_message_can_be_added_at_runtime() {
    let mut outputs = set();
    outputs.add("a%1 failed", true);
    assert!(outputs.is_completed("a%1 failed"));
}

#[test]
fn iteration_preserves_insertion_order() {
    let outputs = set();
    let order: Vec<&str> = outputs.iter().map(|(m, _)| m).collect();
    assert_eq!(
        order,
        vec!["a%1 started", "a%1 succeeded", "obs file ready for 1"]
    );
}

#[test]
fn completed_lists_only_completed() {
    let mut outputs = set();
    outputs.set_completed("a%1 succeeded").unwrap();
    let done: Vec<&str> = outputs.completed().collect();
    assert_eq!(done, vec!["a%1 succeeded"]);
}

#[test]
fn all_completed_on_empty_set_is_true() {
    assert!(OutputSet::new().all_completed());
}
