//! Session and transport error types.

use clip_wire::WireError;
use std::time::Duration;
use thiserror::Error;

/// Failures of the underlying connection. All of these are recovered by the
/// reconnect loop; `send` only ever passes them through.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not open the connection
    #[error("dial failed: {0}")]
    Dial(String),

    /// Dial did not complete in time
    #[error("dial timed out after {0:?}")]
    DialTimeout(Duration),

    /// Write did not complete in time
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// WebSocket protocol or I/O error
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// Remote closed the connection
    #[error("connection closed by remote")]
    Closed,

    /// Nothing arrived, not even a pong, for this long
    #[error("no traffic from remote for {0:?}")]
    Idle(Duration),
}

/// Errors returned by [`crate::Client`] operations and client construction
#[derive(Error, Debug)]
pub enum ClientError {
    /// No connection is currently established
    #[error("not connected")]
    NotConnected,

    /// Encoded snapshot is over the frame cap; nothing was written
    #[error("snapshot of {size} bytes exceeds the {cap} byte cap, dropped")]
    TooLarge {
        /// Encoded size in bytes
        size: usize,
        /// Configured cap
        cap: usize,
    },

    /// Key material is malformed
    #[error("key must be 16 hex chars (8 bytes)")]
    InvalidKey,

    /// Remote URL is not a ws:// or wss:// URL
    #[error("invalid url {0:?}: expected ws:// or wss://")]
    InvalidUrl(String),

    /// Snapshot could not be encoded
    #[error("wire error: {0}")]
    Wire(WireError),

    /// The write itself failed
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<WireError> for ClientError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::TooLarge { size, cap } => Self::TooLarge { size, cap },
            WireError::InvalidKey => Self::InvalidKey,
            other => Self::Wire(other),
        }
    }
}
