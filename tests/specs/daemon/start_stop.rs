//! End-to-end start/status/stop specs.
//!
//! These drive the real binaries: `ql` boots a `qld` daemon against a
//! throwaway state dir, declares an app, and supervises an actual child
//! process through its lifecycle.

use crate::prelude::*;

#[test]
fn start_status_stop_round_trip() {
    let h = Harness::new();
    let app_dir = h.state.path().join("app");
    std::fs::create_dir_all(&app_dir).unwrap();

    // Declaring the app is an action command, so it boots the daemon.
    h.ql()
        .args(&[
            "apps",
            "add",
            "--id",
            "sleepy",
            "--name",
            "Sleepy",
            "--path",
            app_dir.to_str().unwrap(),
            "--command",
            "sleep 30",
        ])
        .passes()
        .stdout_has("Added sleepy");

    h.ql()
        .args(&["start", "sleepy"])
        .passes()
        .stdout_has("Started Sleepy");

    h.ql()
        .args(&["status"])
        .passes()
        .stdout_has("sleepy")
        .stdout_has("running")
        .stdout_has("Sleepy");

    h.ql()
        .args(&["stop", "sleepy"])
        .passes()
        .stdout_has("Stopped sleepy");

    // The entry is gone and nothing external answers, so the table is empty.
    h.ql().args(&["status"]).passes().stdout_has("No apps running");

    h.ql().args(&["daemon", "stop"]).passes();
}

#[test]
fn starting_a_running_app_twice_is_rejected() {
    let h = Harness::new();
    let app_dir = h.state.path().join("app");
    std::fs::create_dir_all(&app_dir).unwrap();

    h.ql()
        .args(&[
            "apps",
            "add",
            "--id",
            "sleepy",
            "--name",
            "Sleepy",
            "--path",
            app_dir.to_str().unwrap(),
            "--command",
            "sleep 30",
        ])
        .passes();

    h.ql().args(&["start", "sleepy"]).passes();
    h.ql()
        .args(&["start", "sleepy"])
        .fails()
        .stderr_has("already");

    h.ql().args(&["stop", "sleepy"]).passes();
    h.ql().args(&["daemon", "stop"]).passes();
}

#[test]
fn stop_of_an_unmanaged_app_is_an_error() {
    let h = Harness::new();
    h.ql().args(&["daemon", "start"]).passes().stdout_has("Daemon started");

    h.ql()
        .args(&["stop", "ghost"])
        .fails()
        .stderr_has("not running");

    h.ql().args(&["daemon", "stop"]).passes();
}

#[test]
fn start_of_an_undeclared_app_fails_with_a_hint() {
    let h = Harness::new();
    h.ql().args(&["daemon", "start"]).passes();

    h.ql()
        .args(&["start", "ghost"])
        .fails()
        .stderr_has("unknown app");

    h.ql().args(&["daemon", "stop"]).passes();
}

#[test]
fn startup_crash_surfaces_a_support_code() {
    let h = Harness::new();
    let app_dir = h.state.path().join("app");
    std::fs::create_dir_all(&app_dir).unwrap();

    h.ql()
        .args(&[
            "apps",
            "add",
            "--id",
            "crashy",
            "--name",
            "Crashy",
            "--path",
            app_dir.to_str().unwrap(),
            "--command",
            "false",
        ])
        .passes();

    h.ql()
        .args(&["start", "crashy"])
        .fails()
        .stderr_has("error [QL-")
        .stderr_has("troubleshooting:");

    h.ql().args(&["daemon", "stop"]).passes();
}
