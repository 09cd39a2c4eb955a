// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Suite configuration errors. All fatal at load time.

use thiserror::Error;

/// Errors raised while loading or compiling a suite configuration.
#[derive(Debug, Error)]
pub enum SuiteConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] Box<toml::de::Error>),

    #[error("HCL parse error: {0}")]
    Hcl(#[from] Box<hcl::Error>),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read suite file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognised suite file extension: {0}")]
    UnknownFormat(String),

    #[error("OR '|' alternatives are illegal on the right of '=>': {0}")]
    OrOnRight(String),

    #[error("'*' choice marker is only legal on the left of '=>': {0}")]
    StarOnRight(String),

    #[error("only negative intercycle offsets are allowed (e.g. T-6): {0}")]
    PositiveOffset(String),

    #[error("unparsable graph node: {0}")]
    BadNode(String),

    #[error("graph statement has no '=>': {0}")]
    NoArrow(String),

    #[error("illegal type modifier for task {task}: {modifier}")]
    IllegalModifier { task: String, modifier: String },

    #[error("illegal task type for {task}: {value}")]
    IllegalType { task: String, value: String },

    #[error("task {task} has no declared output named {output}")]
    UnknownOutputRef { task: String, output: String },

    #[error("invalid cycle hours section \"{section}\": {message}")]
    BadHours { section: String, message: String },

    #[error("suite validation failed: {0}")]
    Validation(String),
}

impl From<toml::de::Error> for SuiteConfigError {
    fn from(e: toml::de::Error) -> Self {
        SuiteConfigError::Toml(Box::new(e))
    }
}

impl From<hcl::Error> for SuiteConfigError {
    fn from(e: hcl::Error) -> Self {
        SuiteConfigError::Hcl(Box::new(e))
    }
}
