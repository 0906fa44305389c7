//! Envelope encryption and its base64 transport text
//!
//! ```text
//! encrypt: password + fresh salt ─PBKDF2→ key
//!          key + fresh nonce + plaintext ─AES-256-GCM→ ciphertext‖tag
//!          base64(salt ‖ nonce ‖ ciphertext‖tag)
//! ```
//!
//! Decryption reports a wrong password and a tampered envelope the same
//! way: `TransferError::AuthenticationFailed`.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};

use airlock_core::{TransferError, TransferResult};

use crate::kdf::{derive_envelope_key, KdfParams};
use crate::{MIN_ENVELOPE_SIZE, NONCE_SIZE, SALT_SIZE};

/// Parsed envelope: `salt ‖ nonce ‖ ciphertext` (ciphertext includes the GCM tag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub salt: [u8; SALT_SIZE],
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Concatenate `salt ‖ nonce ‖ ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Split raw bytes into salt, nonce, and ciphertext.
    ///
    /// Anything shorter than salt + nonce (28 bytes) is malformed. A short
    /// ciphertext is left for the cipher to reject.
    pub fn from_bytes(bytes: &[u8]) -> TransferResult<Self> {
        if bytes.len() < MIN_ENVELOPE_SIZE {
            return Err(TransferError::MalformedEnvelope(format!(
                "envelope too short: {} bytes (minimum {})",
                bytes.len(),
                MIN_ENVELOPE_SIZE
            )));
        }

        let (salt, rest) = bytes.split_at(SALT_SIZE);
        let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

        let mut envelope = Envelope {
            salt: [0u8; SALT_SIZE],
            nonce: [0u8; NONCE_SIZE],
            ciphertext: ciphertext.to_vec(),
        };
        envelope.salt.copy_from_slice(salt);
        envelope.nonce.copy_from_slice(nonce);
        Ok(envelope)
    }

    /// Standard base64 with padding, no whitespace.
    pub fn to_transport_text(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    pub fn from_transport_text(text: &str) -> TransferResult<Self> {
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| TransferError::MalformedEnvelope(format!("base64 decode: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

/// Encrypt `plaintext` under `password` and return the envelope's transport text.
///
/// Salt and nonce are drawn fresh from the OS RNG on every call, so two
/// encryptions of the same input never produce the same output.
pub fn encrypt(plaintext: &[u8], password: &SecretString) -> TransferResult<String> {
    encrypt_with_params(plaintext, password, &KdfParams::default())
}

/// Decrypt transport text produced by [`encrypt`].
pub fn decrypt(text: &str, password: &SecretString) -> TransferResult<Vec<u8>> {
    decrypt_with_params(text, password, &KdfParams::default())
}

/// [`encrypt`] with explicit KDF parameters.
pub fn encrypt_with_params(
    plaintext: &[u8],
    password: &SecretString,
    params: &KdfParams,
) -> TransferResult<String> {
    Ok(seal(plaintext, password, params)?.to_transport_text())
}

/// [`decrypt`] with explicit KDF parameters.
pub fn decrypt_with_params(
    text: &str,
    password: &SecretString,
    params: &KdfParams,
) -> TransferResult<Vec<u8>> {
    let envelope = Envelope::from_transport_text(text)?;
    open(&envelope, password, params)
}

/// Encrypt into a parsed [`Envelope`] (no transport encoding).
pub fn seal(
    plaintext: &[u8],
    password: &SecretString,
    params: &KdfParams,
) -> TransferResult<Envelope> {
    if plaintext.is_empty() {
        return Err(TransferError::InvalidInput("plaintext is empty".into()));
    }
    if password.expose_secret().is_empty() {
        return Err(TransferError::InvalidInput("password is empty".into()));
    }

    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let key = derive_envelope_key(password, &salt, params);
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| TransferError::Other(anyhow::anyhow!("envelope encryption failed: {e}")))?;

    tracing::debug!(
        plaintext_len = plaintext.len(),
        ciphertext_len = ciphertext.len(),
        "sealed envelope"
    );

    Ok(Envelope {
        salt,
        nonce,
        ciphertext,
    })
}

/// Decrypt a parsed [`Envelope`], verifying the GCM tag.
pub fn open(
    envelope: &Envelope,
    password: &SecretString,
    params: &KdfParams,
) -> TransferResult<Vec<u8>> {
    let key = derive_envelope_key(password, &envelope.salt, params);
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .decrypt(Nonce::from_slice(&envelope.nonce), envelope.ciphertext.as_slice())
        .map_err(|_| TransferError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TAG_SIZE;
    use proptest::prelude::*;

    fn fast() -> KdfParams {
        KdfParams { iterations: 1_000 }
    }

    fn pw(s: &str) -> SecretString {
        SecretString::from(s)
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let text = encrypt_with_params(b"hello, air-gapped world!", &pw("pw"), &fast()).unwrap();
        let plain = decrypt_with_params(&text, &pw("pw"), &fast()).unwrap();
        assert_eq!(plain, b"hello, air-gapped world!");
    }

    #[test]
    fn test_roundtrip_default_params() {
        let text = encrypt(b"hello123!", &pw("pw")).unwrap();
        assert_eq!(decrypt(&text, &pw("pw")).unwrap(), b"hello123!");
    }

    #[test]
    fn test_empty_plaintext_rejected() {
        let result = encrypt_with_params(b"", &pw("pw"), &fast());
        assert!(matches!(result, Err(TransferError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_password_rejected() {
        let result = encrypt_with_params(b"data", &pw(""), &fast());
        assert!(matches!(result, Err(TransferError::InvalidInput(_))));
    }

    #[test]
    fn test_envelope_size() {
        let envelope = seal(&[0u8; 1000], &pw("pw"), &fast()).unwrap();
        // salt (16) + nonce (12) + plaintext (1000) + tag (16)
        assert_eq!(envelope.to_bytes().len(), SALT_SIZE + NONCE_SIZE + 1000 + TAG_SIZE);
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_call() {
        let a = seal(b"same input", &pw("pw"), &fast()).unwrap();
        let b = seal(b"same input", &pw("pw"), &fast()).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_transport_text_is_printable() {
        let text = encrypt_with_params(&[0xFFu8; 300], &pw("pw"), &fast()).unwrap();
        assert!(text
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'='));
    }

    #[test]
    fn test_wrong_password() {
        let text = encrypt_with_params(b"secret data", &pw("right"), &fast()).unwrap();
        let result = decrypt_with_params(&text, &pw("wrong"), &fast());
        assert!(matches!(result, Err(TransferError::AuthenticationFailed)));
    }

    #[test]
    fn test_every_bit_flip_fails_authentication() {
        let envelope = seal(b"hello123!", &pw("pw"), &fast()).unwrap();
        let bytes = envelope.to_bytes();

        for byte in 0..bytes.len() {
            for bit in 0..8 {
                let mut tampered = bytes.clone();
                tampered[byte] ^= 1 << bit;
                let text = STANDARD.encode(&tampered);
                let result = decrypt_with_params(&text, &pw("pw"), &fast());
                assert!(
                    matches!(result, Err(TransferError::AuthenticationFailed)),
                    "flip at byte {byte} bit {bit} must fail authentication"
                );
            }
        }
    }

    #[test]
    fn test_tampered_transport_text_never_decrypts() {
        let text = encrypt_with_params(b"hello123!", &pw("pw"), &fast()).unwrap();
        let mut chars: Vec<u8> = text.into_bytes();
        chars[40] = if chars[40] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(chars).unwrap();

        let result = decrypt_with_params(&tampered, &pw("pw"), &fast());
        assert!(matches!(
            result,
            Err(TransferError::AuthenticationFailed) | Err(TransferError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_invalid_base64_is_malformed() {
        let result = decrypt_with_params("not base64 at all!", &pw("pw"), &fast());
        assert!(matches!(result, Err(TransferError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_truncated_envelope_is_malformed() {
        let text = STANDARD.encode([0u8; MIN_ENVELOPE_SIZE - 1]);
        let result = decrypt_with_params(&text, &pw("pw"), &fast());
        assert!(matches!(result, Err(TransferError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_header_only_envelope_fails_authentication() {
        // 28 bytes parse as salt + nonce with an empty ciphertext; the tag check rejects it
        let text = STANDARD.encode([0u8; MIN_ENVELOPE_SIZE]);
        let result = decrypt_with_params(&text, &pw("pw"), &fast());
        assert!(matches!(result, Err(TransferError::AuthenticationFailed)));
    }

    #[test]
    fn test_envelope_bytes_roundtrip() {
        let envelope = seal(b"layout", &pw("pw"), &fast()).unwrap();
        let parsed = Envelope::from_bytes(&envelope.to_bytes()).unwrap();
        assert_eq!(parsed, envelope);
        assert_eq!(&envelope.to_bytes()[..SALT_SIZE], &envelope.salt);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn roundtrip_any_input(
            data in proptest::collection::vec(any::<u8>(), 1..=4096),
            password in "[ -~]{1,32}",
        ) {
            let params = KdfParams { iterations: 10 };
            let text = encrypt_with_params(&data, &pw(&password), &params).unwrap();
            let plain = decrypt_with_params(&text, &pw(&password), &params).unwrap();
            prop_assert_eq!(plain, data);
        }
    }
}
