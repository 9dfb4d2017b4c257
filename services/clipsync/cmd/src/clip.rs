//! Text clipboard items and duplicate suppression.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clip_wire::{quick_key, Item, Snapshot};

/// Numeric format for plain text items
pub const TEXT_FORMAT: u32 = 1;

const TEXT_MIME: &str = "text/plain";

/// Wrap `text` in a snapshot holding one text item
pub fn text_snapshot(origin: &str, text: &str, ts: i64) -> Snapshot {
    let item = Item {
        fmt: TEXT_FORMAT,
        payload: STANDARD.encode(text),
        byte_len: text.len(),
        fmt_name: "TEXT".to_string(),
        mime_type: TEXT_MIME.to_string(),
    };
    Snapshot::new(origin, ts, vec![item])
}

/// Decoded text of every text item in `snapshot`; other items are skipped
pub fn texts(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .items
        .iter()
        .filter(|item| item.fmt == TEXT_FORMAT || item.mime_type.starts_with("text/"))
        .filter_map(|item| STANDARD.decode(&item.payload).ok())
        .map(|data| String::from_utf8_lossy(&data).into_owned())
        .collect()
}

/// Remembers the last fingerprint seen in one direction
#[derive(Debug, Default)]
pub struct Dedup {
    last: Option<String>,
}

impl Dedup {
    /// True if `quick` matches the previous fingerprint; records it otherwise
    pub fn is_repeat(&mut self, quick: &str) -> bool {
        if self.last.as_deref() == Some(quick) {
            return true;
        }
        self.last = Some(quick.to_string());
        false
    }

    /// True if `snapshot` carries the same items as the previous one.
    ///
    /// The fingerprint is recomputed from the items; the `qkey` a peer put
    /// on the wire is not trusted.
    pub fn is_repeat_snapshot(&mut self, snapshot: &Snapshot) -> bool {
        self.is_repeat(&quick_key(&snapshot.items))
    }

    /// Drop the recorded fingerprint so the next value is never a repeat
    pub fn forget(&mut self) {
        self.last = None;
    }
}
