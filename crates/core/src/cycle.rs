// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cycle tags.
//!
//! A [`CycleTag`] identifies one cycle of the suite. Cycling tasks use a
//! calendar point with hour precision (text form `YYYYMMDDHH`); asynchronous
//! tasks use a bare sequence number. Ordering is total: all calendar points
//! sort before all sequence numbers, though a run only ever mixes tags of
//! one kind.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing a cycle tag.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("invalid cycle tag: {0}")]
    Invalid(String),
}

/// A cycle identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CycleTag {
    /// Calendar cycle point, hour precision.
    Time(NaiveDateTime),
    /// Sequence number for asynchronous tasks.
    Seq(u64),
}

impl CycleTag {
    /// Parse a tag from its text form: ten digits are a `YYYYMMDDHH`
    /// calendar point, any other digit string is a sequence number.
    pub fn parse(s: &str) -> Result<Self, TagError> {
        let bad = || TagError::Invalid(s.to_string());
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        if s.len() == 10 {
            let year: i32 = s[0..4].parse().map_err(|_| bad())?;
            let month: u32 = s[4..6].parse().map_err(|_| bad())?;
            let day: u32 = s[6..8].parse().map_err(|_| bad())?;
            let hour: u32 = s[8..10].parse().map_err(|_| bad())?;
            let point = NaiveDate::from_ymd_opt(year, month, day)
                .and_then(|d| d.and_hms_opt(hour, 0, 0))
                .ok_or_else(bad)?;
            Ok(CycleTag::Time(point))
        } else {
            Ok(CycleTag::Seq(s.parse().map_err(|_| bad())?))
        }
    }

    /// The hour of day, for calendar tags.
    pub fn hour(&self) -> Option<u32> {
        match self {
            CycleTag::Time(t) => Some(t.hour()),
            CycleTag::Seq(_) => None,
        }
    }

    pub fn is_cycling(&self) -> bool {
        matches!(self, CycleTag::Time(_))
    }

    /// Shift the tag by a signed number of hours. Sequence tags treat each
    /// hour as one step.
    pub fn add_hours(&self, hours: i64) -> CycleTag {
        match self {
            CycleTag::Time(t) => CycleTag::Time(*t + Duration::hours(hours)),
            CycleTag::Seq(n) => {
                if hours < 0 {
                    CycleTag::Seq(n.saturating_sub(hours.unsigned_abs()))
                } else {
                    CycleTag::Seq(n + hours as u64)
                }
            }
        }
    }

    /// The previous tag at which a task with the given valid hours ran.
    ///
    /// Mirror of [`CycleTag::next_valid`]. Sequence tags decrement,
    /// saturating at zero.
    pub fn prev_valid(&self, valid_hours: &[u32]) -> CycleTag {
        match self {
            CycleTag::Seq(n) => CycleTag::Seq(n.saturating_sub(1)),
            CycleTag::Time(t) => {
                if valid_hours.is_empty() {
                    return CycleTag::Time(*t - Duration::hours(1));
                }
                let hour = t.hour();
                let mut sorted: Vec<u32> = valid_hours.to_vec();
                sorted.sort_unstable();
                sorted.dedup();
                let prev = match sorted.iter().rev().find(|&&h| h < hour) {
                    Some(&h) => t.date().and_hms_opt(h, 0, 0),
                    None => {
                        let last = sorted[sorted.len() - 1];
                        (t.date() - Duration::days(1)).and_hms_opt(last, 0, 0)
                    }
                };
                match prev {
                    Some(point) => CycleTag::Time(point),
                    None => CycleTag::Time(*t - Duration::hours(1)),
                }
            }
        }
    }

    /// The next tag at which a task with the given valid hours runs.
    ///
    /// Calendar tags advance to the next listed hour, rolling over to the
    /// first listed hour of the following day; an empty list means every
    /// hour is valid. Sequence tags increment.
    pub fn next_valid(&self, valid_hours: &[u32]) -> CycleTag {
        match self {
            CycleTag::Seq(n) => CycleTag::Seq(n + 1),
            CycleTag::Time(t) => {
                if valid_hours.is_empty() {
                    return CycleTag::Time(*t + Duration::hours(1));
                }
                let hour = t.hour();
                let mut sorted: Vec<u32> = valid_hours.to_vec();
                sorted.sort_unstable();
                sorted.dedup();
                let next = match sorted.iter().find(|&&h| h > hour) {
                    Some(&h) => t.date().and_hms_opt(h, 0, 0),
                    None => (t.date() + Duration::days(1)).and_hms_opt(sorted[0], 0, 0),
                };
                match next {
                    Some(point) => CycleTag::Time(point),
                    // valid hours are checked at suite load; out-of-range
                    // values cannot reach here
                    None => CycleTag::Time(*t + Duration::hours(1)),
                }
            }
        }
    }
}

impl fmt::Display for CycleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleTag::Time(t) => write!(f, "{}", t.format("%Y%m%d%H")),
            CycleTag::Seq(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for CycleTag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CycleTag::parse(s)
    }
}

impl Serialize for CycleTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CycleTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CycleTag::parse(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
#[path = "cycle_tests.rs"]
mod tests;
