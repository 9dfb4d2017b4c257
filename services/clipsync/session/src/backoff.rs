//! Reconnect delay bookkeeping.

use std::time::Duration;

/// Doubling delay between dial attempts, capped at a ceiling
#[derive(Debug, Clone)]
pub struct Backoff {
    floor: Duration,
    ceiling: Duration,
    current: Duration,
}

impl Backoff {
    /// Create a backoff starting at `floor`
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        let floor = floor.min(ceiling);
        Self {
            floor,
            ceiling,
            current: floor,
        }
    }

    /// Delay the next failed attempt will wait
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Take the delay to wait now and double it for next time
    pub fn advance(&mut self) -> Duration {
        let wait = self.current;
        self.current = self.current.saturating_mul(2).min(self.ceiling);
        wait
    }

    /// Return to the floor after a successful dial
    pub fn reset(&mut self) {
        self.current = self.floor;
    }
}
