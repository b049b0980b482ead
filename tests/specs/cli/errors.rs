//! CLI error handling specs
//!
//! Verify error messages for invalid commands and arguments, and the
//! fail-fast path when no daemon is reachable.

use crate::prelude::*;

#[test]
fn unknown_subcommand_fails() {
    Harness::new()
        .ql()
        .args(&["frobnicate"])
        .fails()
        .stderr_has("unrecognized subcommand");
}

#[test]
fn start_without_id_fails() {
    Harness::new().ql().args(&["start"]).fails().stderr_has("required");
}

#[test]
fn triage_rejects_unknown_action() {
    Harness::new()
        .ql()
        .args(&["triage", "some item", "--action", "shred"])
        .fails()
        .stderr_has("invalid value");
}

#[test]
fn query_without_daemon_fails_fast() {
    Harness::new()
        .ql()
        .args(&["status"])
        .fails()
        .stderr_has("Daemon not running");
}

#[test]
fn todos_without_daemon_fails_fast() {
    Harness::new()
        .ql()
        .args(&["todos"])
        .fails()
        .stderr_has("Daemon not running");
}
