// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and handling
//! them without blocking the scheduler loop. Handlers are stateless over
//! the shared supervisor/scheduler context; config-document mutations are
//! serialized by the store itself.

mod apps;
mod deps;
mod ports;
mod schedule;
mod start_stop;
mod todos;

use std::sync::Arc;

use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::protocol::{self, Request, Response, IPC_TIMEOUT, PROTOCOL_VERSION};
use crate::sched::Scheduler;
use crate::supervisor::Supervisor;

/// Shared daemon context for all request handlers.
pub struct ListenCtx {
    pub supervisor: Arc<Supervisor>,
    pub scheduler: Arc<Scheduler>,
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub struct Listener {
    socket: UnixListener,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl Listener {
    /// Create a new listener.
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { socket, ctx }
    }

    /// Run the listener loop until shutdown, spawning tasks for each connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(
                                    protocol::ProtocolError::Disconnected,
                                ) => debug!("Client disconnected"),
                                ConnectionError::Protocol(protocol::ProtocolError::TimedOut) => {
                                    warn!("Connection timeout")
                                }
                                _ => error!("Connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(stream: UnixStream, ctx: &ListenCtx) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol::read_request(&mut reader, IPC_TIMEOUT).await?;

    // Log status polls at debug level (frequent), other requests at info.
    if matches!(request, Request::Status | Request::Ping) {
        debug!(request = ?request, "received query");
    } else {
        tracing::info!(request = ?request, "received request");
    }

    let response = handle_request(request, ctx).await;

    debug!("Sending response: {:?}", response);
    protocol::write_response(&mut writer, &response, IPC_TIMEOUT).await?;

    Ok(())
}

/// Handle a single request and return a response.
async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }

        Request::Status => start_stop::handle_status(ctx).await,

        Request::History { id } => start_stop::handle_history(ctx, &id),

        Request::Apps => apps::handle_apps(ctx),

        Request::AppAdd { app } => apps::handle_app_add(ctx, app),

        Request::AppUpdate { id, patch } => apps::handle_app_update(ctx, &id, patch),

        Request::AppRemove { id } => apps::handle_app_remove(ctx, &id),

        Request::AppsMigrate { apps } => apps::handle_migrate(ctx, apps),

        Request::PortCheck { port, exclude } => {
            ports::handle_check(ctx, port, exclude.as_deref()).await
        }

        Request::PortSuggest { base } => ports::handle_suggest(ctx, base),

        Request::PortReserve { port, description } => {
            ports::handle_reserve(ctx, port, description)
        }

        Request::PortRelease { port } => ports::handle_release(ctx, port),

        Request::DepsCheck { path, command: _ } => deps::handle_check(&path),

        Request::InstallStart { id } => deps::handle_install_start(ctx, &id).await,

        Request::InstallStatus { id } => deps::handle_install_status(ctx, &id),

        Request::Start {
            id,
            name,
            port,
            path,
            command,
            retry,
            override_port,
            health_check_url,
            startup_timeout,
            auto_restart,
            max_restart_attempts,
        } => {
            start_stop::handle_start(
                ctx,
                start_stop::StartParams {
                    id,
                    name,
                    port,
                    path,
                    command,
                    retry,
                    override_port,
                    health_check_url,
                    startup_timeout,
                    auto_restart,
                    max_restart_attempts,
                },
            )
            .await
        }

        Request::Stop { id } => start_stop::handle_stop(ctx, &id),

        Request::ScheduleGet { id } => schedule::handle_get(ctx, &id),

        Request::ScheduleEnable { id, enabled } => schedule::handle_enable(ctx, &id, enabled),

        Request::ScheduleRun { id } => schedule::handle_run(ctx, &id).await,

        Request::ScheduleUpdate { id, patch } => schedule::handle_update(ctx, &id, patch),

        Request::Schedules => schedule::handle_list(ctx),

        Request::Todos => todos::handle_todos(ctx),

        Request::Triage { items } => todos::handle_triage(ctx, &items),

        Request::Resolutions => todos::handle_resolutions(ctx),

        Request::ResolutionAdd {
            app,
            issue,
            error_type,
            explanation,
            notes,
        } => todos::handle_resolution_add(ctx, app, issue, error_type, explanation, notes),
    }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
