//! Test helpers for behavioral specifications.
//!
//! Provides a small fluent DSL for testing ql CLI behavior.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

// Aggressive timeouts for fast tests.
const QL_TIMEOUT_CONNECT_MS: &str = "2000";
const QL_TIMEOUT_IPC_MS: &str = "500";
const QL_CONNECT_POLL_MS: &str = "5";

/// Returns the path to a binary built by cargo.
///
/// Resolves relative to the test binary itself: the test executable lives
/// at target/debug/deps/specs-<hash>, so its grandparent is target/debug/
/// where ql and qld are built.
fn binary_path(name: &str) -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let candidate = debug_dir.join(name);
            if candidate.exists() {
                return candidate;
            }
        }
    }
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("target/debug")
        .join(name)
}

/// Returns the path to the qld daemon binary.
pub fn qld_binary() -> PathBuf {
    binary_path("qld")
}

/// A throwaway state directory plus a CLI builder bound to it.
pub struct Harness {
    pub state: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            state: TempDir::new().unwrap(),
        }
    }

    /// Create a CLI builder for ql commands against this state dir.
    pub fn ql(&self) -> CliBuilder {
        CliBuilder::new(binary_path("ql"), self.state.path())
    }

    /// Create a CLI builder for the qld binary itself.
    pub fn qld(&self) -> CliBuilder {
        CliBuilder::new(qld_binary(), self.state.path())
    }
}

/// High-level CLI builder for fluent test assertions
pub struct CliBuilder {
    binary: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new(binary: PathBuf, state_dir: &Path) -> Self {
        Self {
            binary,
            args: Vec::new(),
            envs: vec![
                ("QL_STATE_DIR".into(), state_dir.to_string_lossy().into()),
                (
                    "QL_DAEMON_BINARY".into(),
                    qld_binary().to_string_lossy().into(),
                ),
                ("QL_TIMEOUT_CONNECT_MS".into(), QL_TIMEOUT_CONNECT_MS.into()),
                ("QL_TIMEOUT_IPC_MS".into(), QL_TIMEOUT_IPC_MS.into()),
                ("QL_CONNECT_POLL_MS".into(), QL_CONNECT_POLL_MS.into()),
            ],
        }
    }

    /// Add CLI arguments
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    fn run(&self) -> Output {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.args);
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }
        cmd.output().expect("failed to run binary")
    }

    /// Assert the command exits zero.
    pub fn passes(self) -> Assertion {
        let output = self.run();
        assert!(
            output.status.success(),
            "expected success, got {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        Assertion { output }
    }

    /// Assert the command exits non-zero.
    pub fn fails(self) -> Assertion {
        let output = self.run();
        assert!(
            !output.status.success(),
            "expected failure, got success\nstdout: {}",
            String::from_utf8_lossy(&output.stdout),
        );
        Assertion { output }
    }
}

/// Assertions over a finished command.
pub struct Assertion {
    output: Output,
}

impl Assertion {
    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = String::from_utf8_lossy(&self.output.stdout);
        assert!(
            stdout.contains(needle),
            "stdout missing '{}'\nstdout: {}",
            needle,
            stdout
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = String::from_utf8_lossy(&self.output.stderr);
        assert!(
            stderr.contains(needle),
            "stderr missing '{}'\nstderr: {}",
            needle,
            stderr
        );
        self
    }
}
