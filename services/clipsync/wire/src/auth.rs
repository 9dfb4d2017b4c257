//! Node identity and the dial-time auth token.
//!
//! The token is base64(JSON `{"ts": <unix secs>, "ts_enc": <ts ^ key>}`), sent
//! once per connection in the [`AUTH_HEADER`] request header.

use crate::error::WireError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Request header carrying the auth token
pub const AUTH_HEADER: &str = "X-Auth-Token";

/// Length of the shared key in bytes
const KEY_LEN: usize = 8;

/// Decoded auth token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    /// Unix timestamp (seconds) at which the token was built
    pub ts: i64,
    /// `ts` XOR the shared key
    pub ts_enc: i64,
}

impl AuthToken {
    /// Parse a header value back into a token
    pub fn decode(header: &str) -> Result<Self, WireError> {
        let raw = STANDARD
            .decode(header)
            .map_err(|e| WireError::InvalidToken(e.to_string()))?;
        serde_json::from_slice(&raw).map_err(|e| WireError::InvalidToken(e.to_string()))
    }
}

/// Node id plus shared key material; immutable once built
#[derive(Clone)]
pub struct Identity {
    node_id: String,
    key: u64,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("node_id", &self.node_id)
            .finish_non_exhaustive()
    }
}

impl Identity {
    /// Build an identity from a node id and a 16 hex character key
    pub fn new(node_id: impl Into<String>, key_hex: &str) -> Result<Self, WireError> {
        let bytes = hex::decode(key_hex).map_err(|_| WireError::InvalidKey)?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| WireError::InvalidKey)?;

        Ok(Self {
            node_id: node_id.into(),
            key: u64::from_be_bytes(key),
        })
    }

    /// This node's id
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Build a fresh auth token header value stamped with the current time
    pub fn auth_token(&self) -> Result<String, WireError> {
        self.auth_token_at(unix_now())
    }

    /// Build an auth token for a given timestamp
    pub fn auth_token_at(&self, ts: i64) -> Result<String, WireError> {
        let token = AuthToken {
            ts,
            ts_enc: ts ^ self.key as i64,
        };
        let raw = serde_json::to_vec(&token)?;
        Ok(STANDARD.encode(raw))
    }

    /// Check that a header value was built with this identity's key
    pub fn verify(&self, header: &str) -> Result<AuthToken, WireError> {
        let token = AuthToken::decode(header)?;
        if token.ts_enc != token.ts ^ self.key as i64 {
            return Err(WireError::InvalidToken("key mismatch".to_string()));
        }
        Ok(token)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
