// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time formatting helpers for summaries and logs.

use chrono::NaiveDateTime;

/// Wall-clock reading as `HH:MM:SS`.
pub fn hms(t: NaiveDateTime) -> String {
    t.format("%H:%M:%S").to_string()
}

/// Optional reading, `*` when unset.
pub fn hms_or_star(t: Option<NaiveDateTime>) -> String {
    match t {
        Some(t) => hms(t),
        None => "*".to_string(),
    }
}

/// Whole-second duration as `[-]H:MM:SS`.
pub fn elapsed(secs: i64) -> String {
    let sign = if secs < 0 { "-" } else { "" };
    let s = secs.abs();
    format!("{}{}:{:02}:{:02}", sign, s / 3600, (s % 3600) / 60, s % 60)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
