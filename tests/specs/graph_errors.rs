// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Suite-configuration rejection: the load phase is fatal on bad input.

use rota_suite::{compile, parse_suite, Format, SuiteConfigError};

fn compile_toml(toml: &str) -> Result<rota_suite::Compiled, SuiteConfigError> {
    compile(&parse_suite(toml, Format::Toml)?)
}

#[test]
fn or_on_the_right_is_rejected() {
    let err = compile_toml(
        r#"
[graph]
"0" = "a => b | c"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, SuiteConfigError::OrOnRight(_)));
}

#[test]
fn positive_intercycle_offset_is_rejected() {
    let err = compile_toml(
        r#"
[graph]
"0" = "model(T+6) => post"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, SuiteConfigError::PositiveOffset(_)));
}

#[test]
fn unknown_settings_keys_are_rejected() {
    assert!(parse_suite("shiny_new_toggle = 1", Format::Toml).is_err());
}

#[test]
fn illegal_modifier_is_rejected() {
    let err = compile_toml(
        r#"
[tasks.a]
modifiers = ["weekly"]

[graph]
"0" = "a => b"
"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SuiteConfigError::IllegalModifier { task, .. } if task == "a"
    ));
}

#[test]
fn unknown_output_reference_is_rejected() {
    let err = compile_toml(
        r#"
[graph]
"0" = "a:missing => b"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, SuiteConfigError::UnknownOutputRef { .. }));
}

#[test]
fn out_of_range_hours_are_rejected() {
    let err = compile_toml(
        r#"
[graph]
"0,24" = "a => b"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, SuiteConfigError::BadHours { .. }));
}
