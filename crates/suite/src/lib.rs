// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rota-suite: suite configuration and dependency compilation
//!
//! Parses the hierarchical suite settings (TOML, HCL, or JSON) and the
//! textual dependency-graph language, and compiles them into the immutable
//! per-task templates ([`TaskDef`]) the engine materialises proxies from.

pub mod compile;
pub mod config;
pub mod error;
pub mod graph;
pub mod taskdef;

pub use compile::{compile, Compiled};
pub use config::{load_suite, parse_suite, Format, Suite, TaskSettings};
pub use error::SuiteConfigError;
pub use graph::{DepPair, GraphNode, PairKind};
pub use taskdef::{expand_template, HookConfig, HookEvent, Modifier, TaskDef, TaskType};
