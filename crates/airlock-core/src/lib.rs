pub mod config;
pub mod error;
pub mod types;

pub use error::{TransferError, TransferResult};
pub use types::{Frame, FrameMetadata};

/// Hard ceiling on payload characters per frame.
///
/// A QR code at version 40 / error level L holds 2953 bytes in byte mode;
/// the JSON wrapper and metadata need the remainder, so payloads stop here.
pub const TRANSPORT_CEILING: usize = 2048;

/// Payload characters per frame when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Upper bound on `total` for any one transmission.
///
/// At the ceiling capacity this still covers a 1.5 GiB envelope. Frames
/// claiming more are rejected before a session is sized from them.
pub const MAX_FRAMES: u64 = 1 << 20;
