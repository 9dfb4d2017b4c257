//! Clipboard snapshot types and the dedup fingerprint.

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Fingerprint of a snapshot with no items
pub const EMPTY_QUICK_KEY: &str = "empty";

/// Number of digest bytes kept in a fingerprint
const QUICK_KEY_BYTES: usize = 8;

/// One clipboard item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Numeric clipboard format
    #[serde(default)]
    pub fmt: u32,
    /// Base64-encoded data
    #[serde(default)]
    pub payload: String,
    /// Length of the decoded data
    #[serde(default)]
    pub byte_len: usize,
    /// Format name, e.g. "PNG"
    #[serde(default)]
    pub fmt_name: String,
    /// MIME type, e.g. "image/png"
    #[serde(default)]
    pub mime_type: String,
}

/// A batch of clipboard items produced by one node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Id of the node that produced the snapshot
    #[serde(default)]
    pub origin: String,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub ts: i64,
    /// Items, opaque to the transport
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<Item>,
    /// Fingerprint of `items`, see [`quick_key`]
    #[serde(rename = "qkey", default)]
    pub quick: String,
}

impl Snapshot {
    /// Create a snapshot stamped with the given origin and timestamp
    pub fn new(origin: impl Into<String>, ts: i64, items: Vec<Item>) -> Self {
        let quick = quick_key(&items);
        Self {
            origin: origin.into(),
            ts,
            items,
            quick,
        }
    }

    /// Recompute `quick` from the current items
    pub fn refresh_quick(&mut self) {
        self.quick = quick_key(&self.items);
    }
}

/// Compute the dedup fingerprint of a list of items.
///
/// SHA-256 over the concatenated payload strings, truncated to 8 bytes and
/// hex encoded. An empty list maps to [`EMPTY_QUICK_KEY`].
pub fn quick_key(items: &[Item]) -> String {
    if items.is_empty() {
        return EMPTY_QUICK_KEY.to_string();
    }

    let mut hasher = Sha256::new();
    for item in items {
        hasher.update(item.payload.as_bytes());
    }
    let digest = hasher.finalize();
    hex::encode(&digest[..QUICK_KEY_BYTES])
}

// Peers written against nil slices send `"items": null`
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Item>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Item>>::deserialize(deserializer)?.unwrap_or_default())
}
