//! Single-writer access to the connection.
//!
//! Application sends and keepalive probes both go through [`WriteSerializer`],
//! which holds the write half of the current connection behind one async
//! mutex. Every write is bounded by the write timeout, so a waiting writer is
//! never stuck behind another for longer than that.
//!
//! Only the reconnect loop installs or clears the write half.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ClientError, TransportError};
use crate::transport::FrameSink;

/// Mutual exclusion over the write half of the current connection
pub struct WriteSerializer {
    sink: Mutex<Option<Box<dyn FrameSink>>>,
    connected: AtomicBool,
    write_timeout: Duration,
}

impl WriteSerializer {
    /// Create an empty serializer (no connection)
    pub fn new(write_timeout: Duration) -> Self {
        Self {
            sink: Mutex::new(None),
            connected: AtomicBool::new(false),
            write_timeout,
        }
    }

    /// Whether a connection is currently installed
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Write one text frame
    pub async fn write_text(&self, frame: String) -> Result<(), ClientError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(ClientError::NotConnected)?;

        timeout(self.write_timeout, sink.send_text(frame))
            .await
            .map_err(|_| TransportError::WriteTimeout(self.write_timeout))??;
        Ok(())
    }

    /// Write one keepalive probe
    pub async fn ping(&self) -> Result<(), ClientError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(ClientError::NotConnected)?;

        timeout(self.write_timeout, sink.ping())
            .await
            .map_err(|_| TransportError::WriteTimeout(self.write_timeout))??;
        Ok(())
    }

    /// Make `sink` the current write half
    pub(crate) async fn install(&self, sink: Box<dyn FrameSink>) {
        let mut guard = self.sink.lock().await;
        *guard = Some(sink);
        self.connected.store(true, Ordering::Release);
    }

    /// Clear the current write half and close it, ignoring close errors
    pub(crate) async fn close(&self, close_timeout: Duration) {
        self.connected.store(false, Ordering::Release);
        let taken = self.sink.lock().await.take();

        if let Some(mut sink) = taken {
            match timeout(close_timeout, sink.close()).await {
                Ok(Ok(())) => debug!("Connection closed"),
                Ok(Err(e)) => debug!("Ignoring close error: {}", e),
                Err(_) => debug!("Close timed out after {:?}", close_timeout),
            }
        }
    }
}

impl std::fmt::Debug for WriteSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteSerializer")
            .field("connected", &self.is_connected())
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}
