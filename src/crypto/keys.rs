//! Key material held in memory.
//!
//! - [`SymmetricKey`] is the single 256-bit key size this crate supports.
//!   It is used for the master key and for passphrase-derived wrapping keys.
//! - [`SessionToken`] is a short-lived, high-entropy value that wraps the
//!   master key in the session cache.  It is used as key material as-is and
//!   never passes through the passphrase KDF.
//!
//! Both types zeroize their bytes on drop and never print them in `Debug`.

use std::fmt;

use aes_gcm::aead::{KeyInit, OsRng};
use aes_gcm::Aes256Gcm;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{Result, VaultError};

/// Length of every symmetric key in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// A 32-byte AES-256 key that is wiped from memory when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_LEN],
}

impl SymmetricKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Generate a uniformly random key from the OS RNG.
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(key.as_slice());
        Self { bytes }
    }

    /// Build a key from a byte slice, rejecting anything that is not
    /// exactly [`KEY_LEN`] bytes long.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_LEN] = raw.try_into().map_err(|_| {
            VaultError::InvalidKey(format!(
                "expected {KEY_LEN} bytes of key material, got {}",
                raw.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Parse a key from a hex string (64 hex digits).
    pub fn from_hex(text: &str) -> Result<Self> {
        let mut raw = hex::decode(text.trim())
            .map_err(|e| VaultError::InvalidKey(format!("invalid hex key: {e}")))?;
        let key = Self::from_slice(&raw);
        raw.zeroize();
        key
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Lowercase hex rendering, for display on explicit user request only.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for SymmetricKey {}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// The session token that wraps the cached master key.
///
/// Travels as standard base64 text (e.g. in `PMVAULT_SESSION_TOKEN`) and
/// decodes to exactly 32 bytes of key material.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionToken {
    bytes: [u8; KEY_LEN],
}

impl SessionToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Parse a token from its base64 transport form.
    pub fn from_encoded(text: &str) -> Result<Self> {
        let mut raw = BASE64
            .decode(text.trim())
            .map_err(|e| VaultError::InvalidKey(format!("session token is not base64: {e}")))?;
        let parsed: std::result::Result<[u8; KEY_LEN], _> = raw.as_slice().try_into();
        raw.zeroize();
        let bytes = parsed.map_err(|_| {
            VaultError::InvalidKey(format!("session token must decode to {KEY_LEN} bytes"))
        })?;
        Ok(Self { bytes })
    }

    /// The base64 transport form of this token.
    pub fn encoded(&self) -> String {
        BASE64.encode(self.bytes)
    }

    /// The token used directly as an AES-256 key.
    pub fn as_key(&self) -> SymmetricKey {
        SymmetricKey::new(self.bytes)
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_differ() {
        assert_ne!(SymmetricKey::generate(), SymmetricKey::generate());
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        assert!(SymmetricKey::from_slice(&[0u8; 31]).is_err());
        assert!(SymmetricKey::from_slice(&[0u8; 33]).is_err());
        assert!(SymmetricKey::from_slice(&[7u8; 32]).is_ok());
    }

    #[test]
    fn hex_roundtrip() {
        let key = SymmetricKey::new([0xA5; KEY_LEN]);
        let parsed = SymmetricKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(SymmetricKey::from_hex("not hex").is_err());
        assert!(SymmetricKey::from_hex("abcd").is_err());
    }

    #[test]
    fn debug_does_not_leak_bytes() {
        let key = SymmetricKey::new([0x41; KEY_LEN]);
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("65"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn session_token_encoding_roundtrip() {
        let token = SessionToken::generate();
        let parsed = SessionToken::from_encoded(&token.encoded()).unwrap();
        assert_eq!(token, parsed);
    }

    #[test]
    fn session_token_rejects_short_material() {
        let short = BASE64.encode([1u8; 16]);
        assert!(matches!(
            SessionToken::from_encoded(&short),
            Err(VaultError::InvalidKey(_))
        ));
        assert!(SessionToken::from_encoded("mxlplx!").is_err());
    }

    #[test]
    fn session_token_key_is_the_raw_token() {
        let token = SessionToken::from_encoded(&BASE64.encode([9u8; 32])).unwrap();
        assert_eq!(token.as_key(), SymmetricKey::new([9u8; 32]));
    }
}
