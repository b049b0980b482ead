// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-tree kill leaf.
//!
//! Children are spawned in their own process group, so killing the group
//! takes the whole tree (dev servers love to fork). SIGTERM first for a
//! graceful exit, SIGKILL shortly after for the stragglers.

use std::time::Duration;
use tracing::{debug, warn};

/// Grace period between SIGTERM and SIGKILL.
const KILL_GRACE: Duration = Duration::from_millis(1500);

/// Kill the process group rooted at `pid` (tree kill, forced).
///
/// Fire-and-forget: errors are logged, not surfaced — the table entry is
/// already removed by the time this runs.
pub async fn kill_tree(pid: u32) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let pgid = Pid::from_raw(pid as i32);
        match killpg(pgid, Signal::SIGTERM) {
            Ok(()) => debug!(pid, "sent SIGTERM to process group"),
            Err(e) => {
                // Group may already be gone, or the child never got its own
                // group; fall back to the single pid.
                debug!(pid, error = %e, "killpg SIGTERM failed, trying single pid");
                let _ = nix::sys::signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
        }

        tokio::time::sleep(KILL_GRACE).await;

        if let Err(e) = killpg(pgid, Signal::SIGKILL) {
            // ESRCH means everything exited during the grace period.
            if e != nix::errno::Errno::ESRCH {
                warn!(pid, error = %e, "killpg SIGKILL failed");
            }
            let _ = nix::sys::signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
        }
    }

    #[cfg(not(unix))]
    {
        // Windows: taskkill /T takes the tree, /F forces, window hidden by
        // the detached creation flags of the supervisor itself.
        let result = tokio::process::Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/T", "/F"])
            .output()
            .await;
        match result {
            Ok(out) if out.status.success() => debug!(pid, "taskkill succeeded"),
            Ok(out) => warn!(pid, code = ?out.status.code(), "taskkill failed"),
            Err(e) => warn!(pid, error = %e, "taskkill could not run"),
        }
    }
}

/// Kill a single foreign process (used by the port broker's `free_port`).
pub async fn kill_pid(pid: u32) -> bool {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let target = Pid::from_raw(pid as i32);
        if kill(target, Signal::SIGTERM).is_err() {
            return false;
        }
        tokio::time::sleep(KILL_GRACE).await;
        // Best-effort escalation; ESRCH means it exited on SIGTERM.
        match kill(target, Signal::SIGKILL) {
            Ok(()) => true,
            Err(nix::errno::Errno::ESRCH) => true,
            Err(e) => {
                warn!(pid, error = %e, "SIGKILL failed");
                false
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::process::Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/T", "/F"])
            .output()
            .await
            .map(|out| out.status.success())
            .unwrap_or(false)
    }
}
