//! Cryptographic primitives for pmvault.
//!
//! This module provides:
//! - The `iv&ciphertext` envelope transport codec (`envelope`)
//! - PBKDF2 passphrase key derivation with the legacy parameters (`kdf`)
//! - AES-256-GCM authenticated encryption (`encryption`)
//! - Zeroizing key material types (`keys`)

pub mod encryption;
pub mod envelope;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, encrypt, generate_nonce, open, seal};
pub use envelope::{Envelope, NONCE_LEN, TAG_LEN};
pub use kdf::derive_key;
pub use keys::{SessionToken, SymmetricKey, KEY_LEN};

use zeroize::Zeroizing;

use crate::errors::Result;

/// Encrypt `plaintext` directly under a passphrase.
pub fn encrypt_with_passphrase(passphrase: &str, plaintext: &[u8]) -> Result<Envelope> {
    encrypt(&derive_key(passphrase), plaintext)
}

/// Decrypt an envelope that was produced with [`encrypt_with_passphrase`].
pub fn decrypt_with_passphrase(passphrase: &str, envelope: &Envelope) -> Result<Zeroizing<Vec<u8>>> {
    decrypt(&derive_key(passphrase), envelope)
}
