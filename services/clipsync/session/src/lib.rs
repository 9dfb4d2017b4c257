//! Reconnecting websocket client, keepalive and serialized writes for clipsync.
//!
//! This crate keeps one logical connection to a relay alive over an
//! unreliable network. It redials with doubling backoff when the connection
//! drops, probes the link with periodic pings, serializes every write onto
//! the connection, and drops snapshots this node produced when the relay
//! echoes them back.
//!
//! ## Features
//!
//! - **WebSocket Transport**: tokio-tungstenite dialer with the auth token in
//!   the `X-Auth-Token` handshake header
//! - **Auto-reconnect**: 0.5s floor, doubling to an 8s ceiling, reset on success
//! - **Keepalive**: ping every 25s while connected; a link silent for two
//!   intervals is dropped and redialed
//! - **Write Serializer**: one writer at a time, each write bounded by a timeout
//! - **Origin Filtering**: own snapshots are never delivered back
//!
//! ## Example
//!
//! ```rust,no_run
//! use clip_session::{Client, WsClient};
//! use clip_wire::Snapshot;
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), clip_session::ClientError> {
//! let client = Arc::new(WsClient::new("ws://127.0.0.1:5002/clip", "1a2b3c4d", "0011223344556677")?);
//! let cancel = CancellationToken::new();
//! let (tx, mut rx) = mpsc::channel(8);
//!
//! let poller = client.clone();
//! let token = cancel.clone();
//! tokio::spawn(async move { poller.poll(token, tx).await });
//!
//! client.send(Snapshot::new("1a2b3c4d", 0, vec![])).await?;
//!
//! while let Some(snapshot) = rx.recv().await {
//!     println!("{} sent {} items", snapshot.origin, snapshot.items.len());
//! }
//! cancel.cancel();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backoff;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod writer;

#[cfg(test)]
mod testing;

// Re-export main types
pub use backoff::Backoff;
pub use client::{Client, WsClient};
pub use config::ClientConfig;
pub use error::{ClientError, TransportError};
pub use transport::{Connection, Dialer, FrameSink, FrameSource, WsDialer};
pub use writer::WriteSerializer;
