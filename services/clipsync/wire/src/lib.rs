//! Snapshot types, fingerprints, JSON framing and auth tokens for clipsync.
//!
//! This crate is the piece shared by every clipsync transport: it defines the
//! message that travels between nodes, the rules for turning it into a wire
//! frame and back, and the credential a node presents when it dials a relay.
//!
//! ## Wire Format
//!
//! One snapshot is one JSON text frame:
//!
//! ```text
//! {
//!   "origin": "1a2b3c4d",          producing node id
//!   "ts":     1717171717,          unix seconds
//!   "items":  [ { "fmt": 1, "payload": "<base64>", "byte_len": 5,
//!                 "fmt_name": "", "mime_type": "text/plain" } ],
//!   "qkey":   "9f86d081884c7d65"   fingerprint of the items
//! }
//! ```
//!
//! Frames larger than [`MAX_FRAME_SIZE`] are rejected on both the send and the
//! receive path.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod codec;
pub mod error;
pub mod snapshot;

// Re-export main types
pub use auth::{AuthToken, Identity, AUTH_HEADER};
pub use codec::{decode, decode_inbound, encode, encode_outbound, MAX_FRAME_SIZE};
pub use error::WireError;
pub use snapshot::{quick_key, Item, Snapshot, EMPTY_QUICK_KEY};
