// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::NaiveDate;
use yare::parameterized;

#[test]
fn hms_formats_the_time_of_day() {
    let t = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(6, 5, 4)
        .unwrap();
    assert_eq!(hms(t), "06:05:04");
    assert_eq!(hms_or_star(Some(t)), "06:05:04");
}

#[test]
fn missing_time_is_a_star() {
    assert_eq!(hms_or_star(None), "*");
}

#[parameterized(
    zero = { 0, "0:00:00" },
    seconds = { 59, "0:00:59" },
    minutes = { 90, "0:01:30" },
    hours = { 3750, "1:02:30" },
    day_plus = { 90000, "25:00:00" },
    negative = { -300, "-0:05:00" },
)]
fn elapsed_formats(secs: i64, expect: &str) {
    assert_eq!(elapsed(secs), expect);
}
