//! Behavioral specifications for the ql CLI and qld daemon.
//!
//! These tests are black-box: they invoke the binaries and verify stdout,
//! stderr, and exit codes. Anything touching daemon state points
//! QL_STATE_DIR at a throwaway directory.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// cli/
#[path = "specs/cli/errors.rs"]
mod cli_errors;
#[path = "specs/cli/help.rs"]
mod cli_help;

// daemon/
#[path = "specs/daemon/help.rs"]
mod daemon_help;
#[path = "specs/daemon/start_stop.rs"]
mod daemon_start_stop;
