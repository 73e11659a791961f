//! AES-256-GCM authenticated encryption.
//!
//! `seal` / `open` are the raw primitive over an explicit 12-byte nonce;
//! the 16-byte tag is appended to the ciphertext.  `encrypt` / `decrypt`
//! wrap them with a fresh random nonce per call and the [`Envelope`] type.
//!
//! `open` fails closed: on a tag mismatch it returns [`VaultError::Auth`]
//! and no plaintext bytes at all.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use zeroize::Zeroizing;

use super::envelope::{Envelope, NONCE_LEN};
use super::keys::SymmetricKey;
use crate::errors::{Result, VaultError};

fn cipher(key: &SymmetricKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Generate a random 12-byte nonce.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut out = [0u8; NONCE_LEN];
    out.copy_from_slice(&nonce);
    out
}

/// Encrypt `plaintext` under `key` and `nonce`, returning `ciphertext || tag`.
///
/// The caller must never reuse a nonce with the same key.
pub fn seal(key: &SymmetricKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    cipher(key)
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| VaultError::Encryption(format!("AES-GCM seal failed: {e}")))
}

/// Verify and decrypt `ciphertext || tag`.
pub fn open(
    key: &SymmetricKey,
    nonce: &[u8; NONCE_LEN],
    sealed: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    cipher(key)
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map(Zeroizing::new)
        .map_err(|_| VaultError::Auth)
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<Envelope> {
    let nonce = generate_nonce();
    let sealed = seal(key, &nonce, plaintext)?;
    Ok(Envelope::new(nonce, sealed))
}

/// Decrypt an envelope produced by [`encrypt`].
pub fn decrypt(key: &SymmetricKey, envelope: &Envelope) -> Result<Zeroizing<Vec<u8>>> {
    open(key, envelope.nonce(), envelope.sealed())
}
