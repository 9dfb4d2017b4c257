//! The reconnecting client: `send` on the application side, `poll` as the
//! long-lived connection owner.
//!
//! `poll` drives an explicit state machine:
//!
//! ```text
//!              dial ok
//!   Dialing ─────────────▶ Connected ──── cancelled ───▶ (exit)
//!    ▲  ▲  │                   │
//!    │  │  │ dial failed       │ read/ping failure
//!    │  │  ▼                   │
//!    │  │ Disconnected         │
//!    │  │  │ backoff elapsed   │
//!    │  └──┘                   │
//!    └─────────────────────────┘
//! ```
//!
//! Backoff only spaces out failed dials. A lost connection is redialed at
//! once, and a dial failing after it waits the floor.
//!
//! Only the loop reads from the connection, so the read half needs no lock.
//! Both writers (`send` and the keepalive probe) go through the
//! [`WriteSerializer`]. The probe runs as its own task so a long write never
//! holds up reads.

use async_trait::async_trait;
use clip_wire::{decode_inbound, encode_outbound, Identity, Snapshot, WireError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::backoff::Backoff;
use crate::config::ClientConfig;
use crate::error::{ClientError, TransportError};
use crate::transport::{Connection, Dialer, FrameSource, WsDialer};
use crate::writer::WriteSerializer;

/// A transport that carries snapshots to and from a relay
#[async_trait]
pub trait Client: Send + Sync {
    /// Send one snapshot.
    ///
    /// Fails immediately with [`ClientError::NotConnected`] when there is no
    /// connection; nothing is queued.
    async fn send(&self, snapshot: Snapshot) -> Result<(), ClientError>;

    /// Receive snapshots from other nodes into `out` until `cancel` fires.
    ///
    /// Connection failures are handled internally by reconnecting. `poll` also
    /// returns, after closing the connection, once the receiving half of `out`
    /// has been dropped.
    async fn poll(&self, cancel: CancellationToken, out: mpsc::Sender<Snapshot>);
}

enum LinkState {
    Dialing,
    Disconnected,
    Connected(Box<dyn FrameSource>),
}

enum ServeExit {
    Cancelled,
    ConsumerGone,
    Lost(ClientError),
}

/// The keepalive ping in flight, if any.
///
/// A ping left behind when the connection goes away still finishes (bounded
/// by the write timeout) before the serializer lets the close through.
#[derive(Default)]
struct Probe(Option<JoinHandle<Result<(), ClientError>>>);

impl Probe {
    fn in_flight(&self) -> bool {
        self.0.is_some()
    }

    fn start(&mut self, writer: &Arc<WriteSerializer>) {
        let writer = writer.clone();
        self.0 = Some(tokio::spawn(async move { writer.ping().await }));
    }

    /// Wait for the running ping; pending forever when there is none
    async fn finished(&mut self) -> Result<(), ClientError> {
        let Some(handle) = self.0.as_mut() else {
            return std::future::pending().await;
        };
        let result = handle.await;
        self.0 = None;
        result.unwrap_or_else(|e| {
            Err(TransportError::WebSocket(format!("keepalive task failed: {}", e)).into())
        })
    }
}


/// WebSocket implementation of [`Client`]
pub struct WsClient<D = WsDialer> {
    url: String,
    identity: Identity,
    config: ClientConfig,
    dialer: D,
    writer: Arc<WriteSerializer>,
}

impl WsClient<WsDialer> {
    /// Build a client for `url` with default settings.
    ///
    /// Fails if `key_hex` is not 16 hex characters or `url` is not a ws:// or
    /// wss:// URL.
    pub fn new(url: &str, node_id: &str, key_hex: &str) -> Result<Self, ClientError> {
        Self::with_config(url, node_id, key_hex, ClientConfig::default())
    }

    /// Build a client with explicit settings
    pub fn with_config(
        url: &str,
        node_id: &str,
        key_hex: &str,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let identity = Identity::new(node_id, key_hex)?;
        let dialer = WsDialer::new(config.read_limit(), config.idle_timeout());
        Self::with_dialer(url, identity, config, dialer)
    }
}

impl<D: Dialer> WsClient<D> {
    /// Build a client that opens connections through `dialer`
    pub fn with_dialer(
        url: &str,
        identity: Identity,
        config: ClientConfig,
        dialer: D,
    ) -> Result<Self, ClientError> {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(ClientError::InvalidUrl(url.to_string()));
        }

        Ok(Self {
            url: url.to_string(),
            identity,
            writer: Arc::new(WriteSerializer::new(config.write_timeout)),
            config,
            dialer,
        })
    }

    /// This node's id
    pub fn node_id(&self) -> &str {
        self.identity.node_id()
    }

    /// Whether a connection is currently established
    pub fn is_connected(&self) -> bool {
        self.writer.is_connected()
    }

    async fn dial(&self) -> Result<Connection, TransportError> {
        // Fresh token per attempt so the timestamp is current
        let token = self
            .identity
            .auth_token()
            .map_err(|e| TransportError::Dial(e.to_string()))?;

        timeout(self.config.dial_timeout, self.dialer.dial(&self.url, &token))
            .await
            .map_err(|_| TransportError::DialTimeout(self.config.dial_timeout))?
    }

    async fn run(&self, cancel: &CancellationToken, out: &mpsc::Sender<Snapshot>) {
        let mut backoff = Backoff::new(self.config.backoff_floor, self.config.backoff_ceiling);
        let mut state = LinkState::Dialing;

        loop {
            state = match state {
                LinkState::Dialing => {
                    debug!("Dialing {}", self.url);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return,
                        result = self.dial() => match result {
                            Ok(conn) => {
                                info!("Connected to {} as {}", conn.remote, self.node_id());
                                backoff.reset();
                                self.writer.install(conn.sink).await;
                                LinkState::Connected(conn.source)
                            }
                            Err(e) => {
                                warn!(
                                    "Failed to connect to {}: {}; retrying in {:?}",
                                    self.url, e, backoff.current()
                                );
                                LinkState::Disconnected
                            }
                        }
                    }
                }

                LinkState::Disconnected => {
                    let wait = backoff.advance();
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return,
                        _ = sleep(wait) => LinkState::Dialing,
                    }
                }

                LinkState::Connected(source) => match self.serve(source, cancel, out).await {
                    ServeExit::Lost(e) => {
                        warn!("Connection to {} lost: {}; reconnecting", self.url, e);
                        self.writer.close(self.config.close_timeout).await;
                        LinkState::Dialing
                    }
                    ServeExit::ConsumerGone => {
                        info!("Snapshot consumer went away, stopping");
                        return;
                    }
                    ServeExit::Cancelled => return,
                },
            };
        }
    }

    async fn serve(
        &self,
        mut source: Box<dyn FrameSource>,
        cancel: &CancellationToken,
        out: &mpsc::Sender<Snapshot>,
    ) -> ServeExit {
        let period = self.config.ping_interval;
        let mut keepalive = interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut probe = Probe::default();

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => return ServeExit::Cancelled,

                result = probe.finished(), if probe.in_flight() => {
                    if let Err(e) = result {
                        return ServeExit::Lost(e);
                    }
                    trace!("Sent keepalive ping to {}", self.url);
                }

                _ = keepalive.tick() => {
                    // skipped while the previous ping waits behind a write
                    if !probe.in_flight() {
                        probe.start(&self.writer);
                    }
                }

                frame = source.next_frame() => {
                    let frame = match frame {
                        Ok(frame) => frame,
                        Err(e) => return ServeExit::Lost(e.into()),
                    };
                    let Some(snapshot) = self.accept(&frame) else {
                        continue;
                    };

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return ServeExit::Cancelled,
                        sent = out.send(snapshot) => {
                            if sent.is_err() {
                                return ServeExit::ConsumerGone;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Filter one inbound frame: size cap, decode, then origin
    fn accept(&self, frame: &[u8]) -> Option<Snapshot> {
        match decode_inbound(frame, self.config.max_frame_size) {
            Ok(snapshot) if snapshot.origin == self.node_id() => {
                trace!("Dropping own snapshot {} echoed back", snapshot.quick);
                None
            }
            Ok(snapshot) => {
                debug!(
                    dir = "recv",
                    "Received snapshot {} from {} ({} items)",
                    snapshot.quick,
                    snapshot.origin,
                    snapshot.items.len()
                );
                Some(snapshot)
            }
            Err(WireError::TooLarge { size, cap }) => {
                debug!("Dropping oversized frame ({} > {} bytes)", size, cap);
                None
            }
            Err(e) => {
                debug!("Dropping undecodable frame: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl<D: Dialer> Client for WsClient<D> {
    async fn send(&self, mut snapshot: Snapshot) -> Result<(), ClientError> {
        if !self.writer.is_connected() {
            return Err(ClientError::NotConnected);
        }

        let frame = encode_outbound(&mut snapshot, self.config.max_frame_size)?;
        let size = frame.len();
        self.writer.write_text(frame).await?;

        debug!(
            dir = "send",
            "Sent snapshot {} ({} items, {} bytes)",
            snapshot.quick,
            snapshot.items.len(),
            size
        );
        Ok(())
    }

    async fn poll(&self, cancel: CancellationToken, out: mpsc::Sender<Snapshot>) {
        self.run(&cancel, &out).await;
        self.writer.close(self.config.close_timeout).await;
        info!("Stopped polling {}", self.url);
    }
}

impl<D> std::fmt::Debug for WsClient<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsClient")
            .field("url", &self.url)
            .field("identity", &self.identity)
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}
