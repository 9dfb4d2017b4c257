//! JSON framing for snapshots.
//!
//! Outbound frames always carry a freshly computed fingerprint and are
//! checked against the size cap before they leave the process. Inbound frames
//! are checked against the same cap before any parsing happens.

use crate::error::WireError;
use crate::snapshot::Snapshot;
use tracing::trace;

/// Maximum size of one frame on the wire (32 MiB)
pub const MAX_FRAME_SIZE: usize = 32 * 1024 * 1024;

/// Encode a snapshot as a JSON text frame, as is
pub fn encode(snapshot: &Snapshot) -> Result<String, WireError> {
    Ok(serde_json::to_string(snapshot)?)
}

/// Prepare a snapshot for sending.
///
/// Recomputes the fingerprint from the items (a caller-supplied `quick` is
/// never trusted), encodes the snapshot and rejects it if the frame would be
/// larger than `cap`.
pub fn encode_outbound(snapshot: &mut Snapshot, cap: usize) -> Result<String, WireError> {
    snapshot.refresh_quick();
    let frame = encode(snapshot)?;
    if frame.len() > cap {
        return Err(WireError::TooLarge {
            size: frame.len(),
            cap,
        });
    }
    trace!("Encoded snapshot {} ({} bytes)", snapshot.quick, frame.len());
    Ok(frame)
}

/// Decode a JSON frame into a snapshot
pub fn decode(frame: &[u8]) -> Result<Snapshot, WireError> {
    Ok(serde_json::from_slice(frame)?)
}

/// Decode a received frame, refusing anything over `cap` without parsing it
pub fn decode_inbound(frame: &[u8], cap: usize) -> Result<Snapshot, WireError> {
    if frame.len() > cap {
        return Err(WireError::TooLarge {
            size: frame.len(),
            cap,
        });
    }
    decode(frame)
}
