//! Connection abstraction and the WebSocket implementation.
//!
//! A dial yields a [`Connection`] split into two owned halves: the write half
//! ([`FrameSink`]) goes behind the write serializer, the read half
//! ([`FrameSource`]) stays with the reconnect loop, which is the only reader.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::{Message, WebSocketConfig};
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::TransportError;
use clip_wire::AUTH_HEADER;

/// Write half of a connection
#[async_trait]
pub trait FrameSink: Send {
    /// Write one text frame
    async fn send_text(&mut self, frame: String) -> Result<(), TransportError>;

    /// Write one keepalive probe
    async fn ping(&mut self) -> Result<(), TransportError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Read half of a connection
#[async_trait]
pub trait FrameSource: Send {
    /// Wait for the next data frame. Control frames are consumed internally.
    ///
    /// Must be cancel safe: dropping the future loses no data frame.
    async fn next_frame(&mut self) -> Result<Vec<u8>, TransportError>;
}

/// An open connection, already split into its halves
pub struct Connection {
    /// Remote address the connection was opened to
    pub remote: String,
    /// Write half
    pub sink: Box<dyn FrameSink>,
    /// Read half
    pub source: Box<dyn FrameSource>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}

/// Opens connections to a remote endpoint
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Open a connection, presenting `auth_token` in the auth header
    async fn dial(&self, url: &str, auth_token: &str) -> Result<Connection, TransportError>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials ws:// and wss:// endpoints with tokio-tungstenite
#[derive(Debug, Clone)]
pub struct WsDialer {
    read_limit: usize,
    idle_timeout: Duration,
}

impl WsDialer {
    /// Create a dialer that refuses inbound messages over `read_limit` bytes
    /// and fails the read half after `idle_timeout` without any traffic
    pub fn new(read_limit: usize, idle_timeout: Duration) -> Self {
        Self {
            read_limit,
            idle_timeout,
        }
    }
}

#[async_trait]
impl Dialer for WsDialer {
    async fn dial(&self, url: &str, auth_token: &str) -> Result<Connection, TransportError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| TransportError::Dial(e.to_string()))?;
        let token =
            HeaderValue::from_str(auth_token).map_err(|e| TransportError::Dial(e.to_string()))?;
        request.headers_mut().insert(AUTH_HEADER, token);

        let mut config = WebSocketConfig::default();
        config.max_message_size = Some(self.read_limit);
        config.max_frame_size = Some(self.read_limit);

        let (ws, response) = connect_async_with_config(request, Some(config), false)
            .await
            .map_err(|e| TransportError::Dial(e.to_string()))?;
        debug!("WebSocket handshake with {} returned {}", url, response.status());

        let (sink, source) = ws.split();
        Ok(Connection {
            remote: url.to_string(),
            sink: Box::new(WsSink(sink)),
            source: Box::new(WsSource {
                stream: source,
                idle_timeout: self.idle_timeout,
                last_seen: Instant::now(),
            }),
        })
    }
}

struct WsSink(SplitSink<WsStream, Message>);

#[async_trait]
impl FrameSink for WsSink {
    async fn send_text(&mut self, frame: String) -> Result<(), TransportError> {
        self.0.send(Message::Text(frame)).await.map_err(ws_error)
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        self.0.send(Message::Ping(Vec::new())).await.map_err(ws_error)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.0.close().await.map_err(ws_error)
    }
}

struct WsSource {
    stream: SplitStream<WsStream>,
    idle_timeout: Duration,
    last_seen: Instant,
}

#[async_trait]
impl FrameSource for WsSource {
    async fn next_frame(&mut self) -> Result<Vec<u8>, TransportError> {
        loop {
            // deadline survives the future being dropped between calls
            let deadline = self.last_seen + self.idle_timeout;
            let next = timeout_at(deadline, self.stream.next())
                .await
                .map_err(|_| TransportError::Idle(self.idle_timeout))?;
            self.last_seen = Instant::now();

            match next {
                Some(Ok(Message::Text(text))) => return Ok(text.into_bytes()),
                Some(Ok(Message::Binary(data))) => return Ok(data),
                Some(Ok(Message::Close(_))) | None => return Err(TransportError::Closed),
                Some(Ok(_)) => continue, // Ping, Pong, raw frames
                Some(Err(e)) => return Err(ws_error(e)),
            }
        }
    }
}

fn ws_error(e: tokio_tungstenite::tungstenite::Error) -> TransportError {
    TransportError::WebSocket(e.to_string())
}
