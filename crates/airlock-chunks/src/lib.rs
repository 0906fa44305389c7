//! airlock-chunks: slicing envelope transport text into barcode-sized frames
//!
//! # Overview
//! - `framer`: `split` transport text into indexed frames, `join` them back
//! - `wire`: JSON frame records exchanged with the barcode collaborators
//! - `transmission`: sender pipeline (encrypt → split → encode)

pub mod framer;
pub mod transmission;
pub mod wire;

// Convenience re-exports for the most common operations
pub use framer::{join, split};
pub use transmission::{frame_file, frame_file_with_params, Transmission};
pub use wire::{decode_frame, encode_frame};
