//! Key derivation: PBKDF2-HMAC-SHA256 password → envelope key

use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::{KEY_SIZE, PBKDF2_ITERATIONS, SALT_SIZE};

/// A 256-bit AES key derived from a password and per-envelope salt.
///
/// Zeroized on drop to prevent secrets lingering in memory.
pub struct EnvelopeKey {
    bytes: [u8; KEY_SIZE],
}

impl EnvelopeKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for EnvelopeKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for EnvelopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// PBKDF2 parameters.
///
/// Only `Default` is wire-compatible with other airlock peers; lower round
/// counts exist for tests and benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// HMAC-SHA256 rounds (default: 100,000)
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
        }
    }
}

/// Derive a 256-bit envelope key from a password and salt using PBKDF2-HMAC-SHA256.
///
/// The salt is 16 random bytes stored at the front of the envelope (it does
/// not need to be secret).
pub fn derive_envelope_key(
    password: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> EnvelopeKey {
    // Derived in place: the only copy of the key lives in the zeroizing wrapper
    let mut key = EnvelopeKey::from_bytes([0u8; KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(
        password.expose_secret().as_bytes(),
        salt,
        params.iterations,
        &mut key.bytes,
    );
    key
}
