//! Daemon binary help/version specs.

use crate::prelude::*;

#[test]
fn qld_help_shows_usage() {
    Harness::new()
        .qld()
        .args(&["--help"])
        .passes()
        .stdout_has("USAGE:")
        .stdout_has("qld");
}

#[test]
fn qld_version_shows_version() {
    Harness::new().qld().args(&["--version"]).passes().stdout_has("qld 0.1");
}

#[test]
fn qld_rejects_unknown_arguments() {
    Harness::new()
        .qld()
        .args(&["--frobnicate"])
        .fails()
        .stderr_has("unexpected argument");
}
