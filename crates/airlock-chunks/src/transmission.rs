//! Sender pipeline: file bytes → envelope → frames → wire strings

use airlock_core::{Frame, TransferResult};
use airlock_crypto::{encrypt_with_params, KdfParams};
use secrecy::SecretString;

use crate::framer::split;
use crate::wire::encode_frame;

/// One encrypted file, framed and ready to render.
#[derive(Debug, Clone)]
pub struct Transmission {
    pub filename: String,
    /// Original file length in bytes
    pub size: u64,
    /// Length of the envelope's transport text in characters
    pub envelope_len: usize,
    pub frames: Vec<Frame>,
}

impl Transmission {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Wire strings in index order, one per barcode.
    pub fn wire_strings(&self) -> TransferResult<Vec<String>> {
        self.frames.iter().map(encode_frame).collect()
    }
}

/// Encrypt `data` under `password` and split the envelope into frames.
pub fn frame_file(
    data: &[u8],
    filename: &str,
    password: &SecretString,
    capacity: usize,
) -> TransferResult<Transmission> {
    frame_file_with_params(data, filename, password, capacity, &KdfParams::default())
}

/// [`frame_file`] with explicit KDF parameters.
pub fn frame_file_with_params(
    data: &[u8],
    filename: &str,
    password: &SecretString,
    capacity: usize,
    params: &KdfParams,
) -> TransferResult<Transmission> {
    // Fail on a bad capacity before paying for key derivation
    airlock_core::config::validate_capacity(capacity)?;

    let text = encrypt_with_params(data, password, params)?;
    let size = data.len() as u64;
    let frames = split(&text, capacity, filename, size)?;

    tracing::info!(
        filename,
        size,
        envelope_len = text.len(),
        frames = frames.len(),
        "framed file for transmission"
    );

    Ok(Transmission {
        filename: filename.to_string(),
        size,
        envelope_len: text.len(),
        frames,
    })
}
