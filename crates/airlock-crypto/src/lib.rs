//! airlock-crypto: password-based envelope encryption for air-gapped transfer
//!
//! Envelope layout (binary, before transport encoding):
//! ```text
//! [16 bytes: PBKDF2 salt][12 bytes: AES-GCM nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! Key derivation: PBKDF2-HMAC-SHA256, 100,000 rounds, 256-bit output.
//! The parameters are fixed and not stored in the envelope, so every
//! sender and receiver must agree on them.
//!
//! The envelope travels as standard base64 (the "transport text"); filename
//! and size are not part of it and ride on the frames instead.

pub mod envelope;
pub mod kdf;

pub use envelope::{
    decrypt, decrypt_with_params, encrypt, encrypt_with_params, open, seal, Envelope,
};
pub use kdf::{derive_envelope_key, EnvelopeKey, KdfParams};

/// Size of the derived AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of the PBKDF2 salt
pub const SALT_SIZE: usize = 16;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// PBKDF2-HMAC-SHA256 rounds used by `encrypt` / `decrypt`
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Shortest byte string that can be split into salt and nonce
pub const MIN_ENVELOPE_SIZE: usize = SALT_SIZE + NONCE_SIZE;
