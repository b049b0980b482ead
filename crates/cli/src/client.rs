// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::PathBuf;
use std::time::Duration;

use crate::daemon_process;
use ql_daemon::lifecycle::Config;
use ql_daemon::protocol::{self, ProtocolError};
use ql_daemon::{Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("QL_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(30))
}

/// Timeout for waiting for daemon to start
pub fn timeout_connect() -> Duration {
    parse_duration_ms("QL_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Polling interval for connection retries
pub fn poll_interval() -> Duration {
    parse_duration_ms("QL_CONNECT_POLL_MS").unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running (start it with `ql daemon start`)")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    fn socket_path() -> Result<PathBuf, ClientError> {
        Config::load()
            .map(|c| c.socket_path)
            .map_err(|_| ClientError::NoStateDir)
    }

    /// For action commands - auto-start the daemon once if it is not
    /// reachable. Action commands mutate state and are user-initiated.
    pub async fn for_action() -> Result<Self, ClientError> {
        let socket_path = Self::socket_path()?;
        let client = Self { socket_path };
        if client.probe().await {
            return Ok(client);
        }

        daemon_process::start_daemon_background()
            .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))?;

        let deadline = std::time::Instant::now() + timeout_connect();
        while std::time::Instant::now() < deadline {
            if client.probe().await {
                return Ok(client);
            }
            tokio::time::sleep(poll_interval()).await;
        }
        Err(ClientError::DaemonStartTimeout)
    }

    /// For query commands - connect only, fail fast when not running.
    pub async fn for_query() -> Result<Self, ClientError> {
        let socket_path = Self::socket_path()?;
        let client = Self { socket_path };
        if client.probe().await {
            Ok(client)
        } else {
            Err(ClientError::DaemonNotRunning)
        }
    }

    async fn probe(&self) -> bool {
        matches!(self.request(&Request::Ping).await, Ok(Response::Pong))
    }

    /// Send one request and read the response.
    pub async fn request(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|_| ClientError::DaemonNotRunning)?;
        let (mut reader, mut writer) = stream.into_split();

        tokio::time::timeout(timeout_ipc(), protocol::write_frame(&mut writer, request))
            .await
            .map_err(|_| ProtocolError::TimedOut)??;

        let response: Response =
            tokio::time::timeout(timeout_ipc(), protocol::read_frame(&mut reader))
                .await
                .map_err(|_| ProtocolError::TimedOut)??;
        Ok(response)
    }

    /// Ask the daemon to shut down.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.request(&Request::Shutdown).await {
            Ok(Response::ShuttingDown) | Err(ClientError::DaemonNotRunning) => Ok(()),
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
