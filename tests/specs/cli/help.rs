//! CLI help output specs
//!
//! Verify help text displays for all commands.

use crate::prelude::*;

#[test]
fn ql_help_shows_usage() {
    Harness::new().ql().args(&["--help"]).passes().stdout_has("Usage:");
}

#[test]
fn ql_help_lists_subcommands() {
    Harness::new()
        .ql()
        .args(&["--help"])
        .passes()
        .stdout_has("status")
        .stdout_has("start")
        .stdout_has("schedule")
        .stdout_has("todos");
}

#[test]
fn ql_apps_help_shows_subcommands() {
    Harness::new()
        .ql()
        .args(&["apps", "--help"])
        .passes()
        .stdout_has("add")
        .stdout_has("remove")
        .stdout_has("import");
}

#[test]
fn ql_daemon_help_shows_subcommands() {
    Harness::new()
        .ql()
        .args(&["daemon", "--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("stop")
        .stdout_has("status");
}

#[test]
fn ql_version_shows_version() {
    Harness::new().ql().args(&["--version"]).passes().stdout_has("0.1");
}
