// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background daemon process management.

use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Locate the `qld` binary: explicit override, then a sibling of the `ql`
/// binary, then PATH.
fn daemon_binary() -> PathBuf {
    if let Ok(explicit) = std::env::var("QL_DAEMON_BINARY") {
        return PathBuf::from(explicit);
    }
    if let Ok(current) = std::env::current_exe() {
        let sibling = current.with_file_name("qld");
        if sibling.is_file() {
            return sibling;
        }
    }
    PathBuf::from("qld")
}

/// Spawn the daemon detached. The caller polls the socket for readiness.
pub fn start_daemon_background() -> std::io::Result<()> {
    Command::new(daemon_binary())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}
