// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The textual dependency-graph grammar.
//!
//! One statement per line:
//!
//! ```text
//! statement := expr ( '=>' expr )+
//! expr      := and_term ( '|' and_term )*
//! and_term  := node ( '&' node )*
//! node      := [ MOD '|' ] NAME [ '(' 'T' ('+'|'-') INT ')' ] [ ':' OUTPUT ]
//! ```
//!
//! `=>` chains left-to-right dependency; `&` fans out on the left and in on
//! the right; `|` alternatives are legal only on the left, resolved to the
//! `*`-starred member (else the rightmost). `MOD` is one of `coldstart`,
//! `model_coldstart`, `oneoff`. No parentheses for grouping — decompose
//! into multiple statements instead.

use crate::error::SuiteConfigError;
use regex::Regex;
use std::sync::OnceLock;

/// How a dependency pair routes its prerequisite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    Normal,
    /// Right depends on left only on the first cycle of a run.
    Coldstart,
    /// Left produces the right task's restart outputs at startup.
    ModelColdstart,
}

/// One parsed graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub name: String,
    /// Intercycle offset in hours, from `(T-N)`.
    pub offset_hours: Option<u32>,
    /// Specific named output, from `name:output`.
    pub output: Option<String>,
}

/// One left -> right dependency extracted from a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepPair {
    pub left: GraphNode,
    pub right: GraphNode,
    pub kind: PairKind,
    /// The left node carried the `oneoff|` decoration.
    pub oneoff_left: bool,
}

const MODIFIER_KEYWORDS: &[&str] = &["coldstart", "model_coldstart", "oneoff"];

/// Strip a trailing `#` comment.
pub fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Parse one statement into its dependency pairs.
///
/// Blank (or comment-only) lines yield no pairs.
pub fn parse_statement(line: &str) -> Result<Vec<DepPair>, SuiteConfigError> {
    let line = strip_comment(line).trim();
    if line.is_empty() {
        return Ok(Vec::new());
    }
    if !line.contains("=>") {
        return Err(SuiteConfigError::NoArrow(line.to_string()));
    }

    let segments: Vec<&str> = line.split("=>").map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(SuiteConfigError::BadNode(line.to_string()));
    }

    let mut pairs = Vec::new();
    for window in segments.windows(2) {
        let (lgroup, rgroup) = (window[0], window[1]);

        // '|' (OR) and the '*' choice marker are left-side only
        if rgroup.contains('|') {
            return Err(SuiteConfigError::OrOnRight(rgroup.to_string()));
        }
        if rgroup.contains('*') {
            return Err(SuiteConfigError::StarOnRight(rgroup.to_string()));
        }

        let chosen = resolve_alternatives(lgroup)?;
        let kind = chosen.kind;
        let oneoff_left = chosen.oneoff;

        let mut lefts = Vec::new();
        for text in chosen.text.split('&') {
            lefts.push(parse_node(text.trim())?);
        }
        let mut rights = Vec::new();
        for text in rgroup.split('&') {
            rights.push(parse_node(text.trim())?);
        }

        for right in &rights {
            for left in &lefts {
                pairs.push(DepPair {
                    left: left.clone(),
                    right: right.clone(),
                    kind,
                    oneoff_left,
                });
            }
        }
    }
    Ok(pairs)
}

struct Alternative {
    text: String,
    kind: PairKind,
    oneoff: bool,
    starred: bool,
}

/// Resolve a left-side expression's `|` alternatives to the chosen member.
///
/// Elements that are exactly a modifier keyword decorate the member that
/// follows them, so `coldstart|A` and `A | B` share one separator.
fn resolve_alternatives(lgroup: &str) -> Result<Alternative, SuiteConfigError> {
    let mut members: Vec<Alternative> = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for element in lgroup.split('|').map(str::trim) {
        if MODIFIER_KEYWORDS.contains(&element) {
            pending.push(element);
            continue;
        }
        let (text, starred) = match element.strip_suffix('*') {
            Some(stripped) => (stripped.trim_end(), true),
            None => (element, false),
        };
        let kind = if pending.contains(&"model_coldstart") {
            PairKind::ModelColdstart
        } else if pending.contains(&"coldstart") {
            PairKind::Coldstart
        } else {
            PairKind::Normal
        };
        members.push(Alternative {
            text: text.to_string(),
            kind,
            oneoff: pending.contains(&"oneoff"),
            starred,
        });
        pending.clear();
    }

    if !pending.is_empty() || members.is_empty() {
        return Err(SuiteConfigError::BadNode(lgroup.to_string()));
    }

    // Starred member wins; otherwise the rightmost.
    let chosen = match members.iter().position(|m| m.starred) {
        Some(i) => i,
        None => members.len() - 1,
    };
    Ok(members.swap_remove(chosen))
}

#[allow(clippy::expect_used)]
fn offset_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.*)\(\s*T\s*([+-])\s*(\d+)\s*\)(.*)$").expect("static regex")
    })
}

#[allow(clippy::expect_used)]
fn node_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\w+)\s*(?::\s*(\w+))?$").expect("static regex"))
}

/// Parse a single node: `NAME`, `NAME(T-N)`, `NAME:OUTPUT`, or both in
/// either order.
pub fn parse_node(text: &str) -> Result<GraphNode, SuiteConfigError> {
    let mut offset_hours = None;
    let mut rest = text.to_string();

    if let Some(caps) = offset_re().captures(&rest) {
        let sign = &caps[2];
        if sign == "+" {
            return Err(SuiteConfigError::PositiveOffset(text.to_string()));
        }
        offset_hours = Some(caps[3].parse::<u32>().unwrap_or(0));
        rest = format!("{}{}", caps[1].trim(), caps[4].trim());
    }

    match node_re().captures(&rest) {
        Some(caps) => Ok(GraphNode {
            name: caps[1].to_string(),
            offset_hours,
            output: caps.get(2).map(|m| m.as_str().to_string()),
        }),
        None => Err(SuiteConfigError::BadNode(text.to_string())),
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
