// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    port          = { "Port 5173 in use by pid 999", Some(ErrorType::PortInUse) },
    path_missing  = { "Path not found: /home/dev/web", Some(ErrorType::PathNotFound) },
    path_gone     = { "directory does not exist", Some(ErrorType::PathNotFound) },
    node_modules  = { "Missing node_modules, run npm install", Some(ErrorType::MissingModule) },
    loud_module   = { "MODULE_NOT_FOUND", Some(ErrorType::MissingModule) },
    crash         = { "App exited with code 1", Some(ErrorType::Crash) },
    plain         = { "Started", None },
)]
fn message_classification(message: &str, expected: Option<ErrorType>) {
    assert_eq!(classify_message(message), expected);
}

#[test]
fn normal_exit_codes_are_not_crashes() {
    assert_eq!(classify_message("App exited with code 0"), None);
    assert_eq!(classify_message("App exited with code 3221225786"), None);
    assert_eq!(classify_message("App exited with code 1073872900"), None);
}

#[test]
fn port_rule_wins_over_later_rules() {
    // Contains both "Port ... in use" and "module"; the port rule is first.
    assert_eq!(
        classify_message("Port 5173 in use by module server"),
        Some(ErrorType::PortInUse)
    );
}

#[yare::parameterized(
    port    = { "recurring port conflict", ErrorType::PortInUse },
    path    = { "the project directory vanished", ErrorType::PathNotFound },
    file    = { "config file corrupted", ErrorType::PathNotFound },
    deps    = { "needs a dependency install", ErrorType::MissingModule },
    crash   = { "keeps crashing at night", ErrorType::Crash },
    exits   = { "exits right after start", ErrorType::Crash },
    other   = { "something odd", ErrorType::Unknown },
)]
fn issue_classification(issue: &str, expected: ErrorType) {
    assert_eq!(classify_issue(issue), expected);
}

#[test]
fn wire_tags_round_trip() {
    for et in [
        ErrorType::PortInUse,
        ErrorType::PathNotFound,
        ErrorType::MissingModule,
        ErrorType::Crash,
        ErrorType::AutoDetectedResolved,
        ErrorType::TodoTriaged,
        ErrorType::Unknown,
    ] {
        assert_eq!(ErrorType::parse(et.as_str()), Some(et));
        assert_eq!(serde_json::to_value(et).unwrap(), et.as_str());
    }
}
