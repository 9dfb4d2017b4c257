//! Wire error types.

use thiserror::Error;

/// Errors raised while building or parsing clipsync frames and credentials
#[derive(Error, Debug)]
pub enum WireError {
    /// Encoded frame is over the size cap
    #[error("frame of {size} bytes exceeds the {cap} byte cap")]
    TooLarge {
        /// Encoded size in bytes
        size: usize,
        /// Cap that was exceeded
        cap: usize,
    },

    /// Frame is not a valid JSON snapshot
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Key material is not 16 hex characters
    #[error("key must be 16 hex chars (8 bytes)")]
    InvalidKey,

    /// Auth token could not be decoded
    #[error("auth token invalid: {0}")]
    InvalidToken(String),
}
