//! Frame wire format
//!
//! Each barcode carries one JSON record:
//! ```text
//! {"metadata":{"index":0,"total":3,"filename":"a.txt","size":9},"data":"<payload>"}
//! ```
//! Key names and nesting are fixed so independently built senders and
//! receivers interoperate.

use airlock_core::{Frame, TransferError, TransferResult, MAX_FRAMES};

/// Serialize a frame to its JSON wire string.
pub fn encode_frame(frame: &Frame) -> TransferResult<String> {
    serde_json::to_string(frame)
        .map_err(|e| TransferError::Other(anyhow::anyhow!("frame serialization: {e}")))
}

/// Parse a decoded barcode string into a frame.
///
/// Anything that is not a structurally valid frame (bad JSON, missing keys,
/// non-integral or negative numbers, `index >= total`, `total` above
/// [`MAX_FRAMES`]) is `ForeignData`.
pub fn decode_frame(raw: &str) -> TransferResult<Frame> {
    let frame: Frame = serde_json::from_str(raw.trim())
        .map_err(|e| TransferError::ForeignData(format!("not a frame record: {e}")))?;

    if frame.metadata.total == 0 {
        return Err(TransferError::ForeignData("frame total is zero".into()));
    }
    if frame.metadata.total > MAX_FRAMES {
        return Err(TransferError::ForeignData(format!(
            "frame total {} exceeds limit {MAX_FRAMES}",
            frame.metadata.total
        )));
    }
    if frame.metadata.index >= frame.metadata.total {
        return Err(TransferError::ForeignData(format!(
            "frame index {} out of range for total {}",
            frame.metadata.index, frame.metadata.total
        )));
    }
    Ok(frame)
}
