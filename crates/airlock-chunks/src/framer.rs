//! Fixed-capacity slicing of transport text
//!
//! Unlike content-defined chunking, frame boundaries here depend only on the
//! capacity: every frame but the last carries exactly `capacity` characters.
//! Concatenating the payloads in index order reproduces the input exactly.

use airlock_core::config::validate_capacity;
use airlock_core::{Frame, FrameMetadata, TransferError, TransferResult, MAX_FRAMES};

/// Split `text` into frames of at most `capacity` characters each.
///
/// Every frame carries its index, the final frame count, and the
/// transmission's `filename` / `size`. Pure: the same input always yields
/// the same frames.
pub fn split(text: &str, capacity: usize, filename: &str, size: u64) -> TransferResult<Vec<Frame>> {
    validate_capacity(capacity)?;
    if text.is_empty() {
        return Err(TransferError::InvalidInput(
            "cannot frame empty transport text".into(),
        ));
    }

    let needed = text.chars().count().div_ceil(capacity) as u64;
    if needed > MAX_FRAMES {
        return Err(TransferError::InvalidInput(format!(
            "transport text needs {needed} frames at capacity {capacity} (limit {MAX_FRAMES})"
        )));
    }

    let payloads = slice_chars(text, capacity);
    let total = payloads.len() as u64;

    let frames: Vec<Frame> = payloads
        .into_iter()
        .enumerate()
        .map(|(index, payload)| Frame {
            metadata: FrameMetadata {
                index: index as u64,
                total,
                filename: filename.to_string(),
                size,
            },
            data: payload.to_string(),
        })
        .collect();

    tracing::debug!(total, capacity, filename, "split transport text");
    Ok(frames)
}

/// Concatenate frame payloads back into transport text.
///
/// `frames` must already be deduplicated, sorted by index, and cover
/// `0..total` without gaps. The assembler guarantees this before calling.
pub fn join(frames: &[Frame]) -> String {
    debug_assert!(
        frames
            .iter()
            .enumerate()
            .all(|(i, f)| f.index() == i as u64),
        "join requires frames ordered by index with no gaps"
    );

    let len = frames.iter().map(|f| f.data.len()).sum();
    let mut text = String::with_capacity(len);
    for frame in frames {
        text.push_str(&frame.data);
    }
    text
}

/// Greedy slices of `capacity` characters, split on char boundaries.
fn slice_chars(text: &str, capacity: usize) -> Vec<&str> {
    let mut slices = Vec::with_capacity(text.len() / capacity + 1);
    let mut start = 0;
    let mut count = 0;

    for (pos, _) in text.char_indices() {
        if count == capacity {
            slices.push(&text[start..pos]);
            start = pos;
            count = 0;
        }
        count += 1;
    }
    slices.push(&text[start..]);
    slices
}
