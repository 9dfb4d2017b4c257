//! Client tuning knobs.

use clip_wire::MAX_FRAME_SIZE;
use std::time::Duration;

/// Configuration for a reconnecting client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Upper bound on one dial attempt
    pub dial_timeout: Duration,
    /// Upper bound on one write (snapshot or keepalive ping)
    pub write_timeout: Duration,
    /// Upper bound on the best-effort close
    pub close_timeout: Duration,
    /// Interval between keepalive pings while connected
    pub ping_interval: Duration,
    /// First reconnect delay, restored after every successful dial
    pub backoff_floor: Duration,
    /// Largest reconnect delay
    pub backoff_ceiling: Duration,
    /// Largest frame accepted on either path
    pub max_frame_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dial_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(2),
            ping_interval: Duration::from_secs(25),
            backoff_floor: Duration::from_millis(500),
            backoff_ceiling: Duration::from_secs(8),
            max_frame_size: MAX_FRAME_SIZE, // 32 MiB
        }
    }
}

impl ClientConfig {
    /// Largest message the websocket layer will buffer before failing the
    /// connection. Frames between `max_frame_size` and this limit are read and
    /// then dropped, leaving the connection up.
    pub fn read_limit(&self) -> usize {
        self.max_frame_size.saturating_mul(2)
    }

    /// Longest the connection may stay silent (no frame, no pong) before it
    /// is treated as dead: two keepalive periods.
    pub fn idle_timeout(&self) -> Duration {
        self.ping_interval.saturating_mul(2)
    }
}
