// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket framing for the supervisor protocol.
//!
//! Every request and response travels as a single frame: a 4-byte
//! big-endian payload length followed by that many bytes of JSON. One
//! request/response pair per connection keeps the listener stateless and
//! lets the CLI treat each command as an independent round trip.

use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::{Request, Response};

/// Upper bound on a single frame's JSON payload (16 MB).
///
/// Responses carry bounded log tails, so a larger frame means a corrupt
/// length header or a peer speaking something else entirely.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Default deadline for one read or write on the socket.
pub const IPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Version string exchanged in the Hello handshake.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Framing and transport errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame of {len} bytes exceeds the {MAX_FRAME_BYTES}-byte limit")]
    FrameTooLarge { len: usize },

    #[error("peer disconnected")]
    Disconnected,

    #[error("socket deadline elapsed")]
    TimedOut,
}

/// Serialize a message and write it as one frame.
pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<(), ProtocolError>
where
    W: AsyncWriteExt + Unpin,
    T: Serialize,
{
    let payload = serde_json::to_vec(msg)?;
    if payload.len() > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge {
            len: payload.len(),
        });
    }
    writer.write_all(&(payload.len() as u32).to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame and deserialize its payload.
///
/// A clean EOF before the length header is a normal disconnect, reported
/// as [`ProtocolError::Disconnected`] so callers can log it quietly.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, ProtocolError>
where
    R: AsyncReadExt + Unpin,
    T: DeserializeOwned,
{
    let mut header = [0u8; 4];
    if let Err(e) = reader.read_exact(&mut header).await {
        return Err(if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::Disconnected
        } else {
            ProtocolError::Io(e)
        });
    }

    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge { len });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(serde_json::from_slice(&payload)?)
}

/// Read the connection's request within `timeout`.
pub async fn read_request<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    tokio::time::timeout(timeout, read_frame(reader))
        .await
        .map_err(|_| ProtocolError::TimedOut)?
}

/// Write the response within `timeout`.
pub async fn write_response<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    tokio::time::timeout(timeout, write_frame(writer, response))
        .await
        .map_err(|_| ProtocolError::TimedOut)?
}
