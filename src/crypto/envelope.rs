//! The envelope transport format.
//!
//! An envelope is the text form of one AES-256-GCM encryption:
//!
//! ```text
//! field    := base64( join(",", decimal_byte_value...) )
//! envelope := field(nonce) "&" field(ciphertext || tag)
//! ```
//!
//! Each byte sequence is first written as its comma-separated decimal
//! values and only then base64-encoded.  Stored records depend on this
//! exact double encoding, so it must not be "simplified" to plain base64.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::errors::{Result, VaultError};

/// Size of the AES-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Separator between the nonce field and the ciphertext field.
const FIELD_DELIMITER: char = '&';

/// Separator between decimal byte values inside a field.
const BYTE_DELIMITER: char = ',';

/// A nonce plus the authenticated ciphertext it protects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    nonce: [u8; NONCE_LEN],
    sealed: Vec<u8>,
}

impl Envelope {
    /// Assemble an envelope from a nonce and `ciphertext || tag`.
    pub fn new(nonce: [u8; NONCE_LEN], sealed: Vec<u8>) -> Self {
        Self { nonce, sealed }
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Ciphertext with the 16-byte tag at the tail.
    pub fn sealed(&self) -> &[u8] {
        &self.sealed
    }

    /// Render the envelope in its transport form.
    pub fn encode(&self) -> String {
        format!(
            "{}{FIELD_DELIMITER}{}",
            encode_field(&self.nonce),
            encode_field(&self.sealed)
        )
    }

    /// Parse an envelope from its transport form.
    pub fn decode(text: &str) -> Result<Self> {
        let mut parts = text.trim().split(FIELD_DELIMITER);
        let (nonce_field, sealed_field) = match (parts.next(), parts.next(), parts.next()) {
            (Some(nonce), Some(sealed), None) => (nonce, sealed),
            _ => {
                return Err(VaultError::Format(format!(
                    "expected exactly one '{FIELD_DELIMITER}' delimiter"
                )))
            }
        };

        let nonce_bytes = decode_field(nonce_field)?;
        let nonce: [u8; NONCE_LEN] = nonce_bytes.as_slice().try_into().map_err(|_| {
            VaultError::Format(format!(
                "nonce must be {NONCE_LEN} bytes, got {}",
                nonce_bytes.len()
            ))
        })?;

        let sealed = decode_field(sealed_field)?;
        if sealed.len() < TAG_LEN {
            return Err(VaultError::Format(format!(
                "ciphertext is shorter than the {TAG_LEN}-byte tag"
            )));
        }

        Ok(Self { nonce, sealed })
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Envelope {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

/// `bytes` -> "b0,b1,..." -> base64.
pub fn encode_field(bytes: &[u8]) -> String {
    let decimal = bytes
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(",");
    BASE64.encode(decimal)
}

/// base64 -> "b0,b1,..." -> `bytes`.
pub fn decode_field(field: &str) -> Result<Vec<u8>> {
    let raw = BASE64
        .decode(field.trim())
        .map_err(|e| VaultError::Format(format!("invalid base64: {e}")))?;
    let text = String::from_utf8(raw)
        .map_err(|_| VaultError::Format("field does not decode to text".into()))?;

    text.split(BYTE_DELIMITER)
        .map(|token| {
            let token = token.trim();
            let value: u32 = token
                .parse()
                .map_err(|_| VaultError::Format(format!("invalid byte token '{token}'")))?;
            u8::try_from(value)
                .map_err(|_| VaultError::Format(format!("byte value {value} is out of range")))
        })
        .collect()
}
