//! Passphrase-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! **Legacy parameters.**  The salt is a constant 32 zero bytes and the
//! iteration count is 100.  Existing master-key records can only be
//! re-opened with exactly these values, because nothing but the
//! passphrase is stored alongside them.  Both choices are weak against
//! offline guessing: a new format should use a random per-record salt and
//! a memory-hard KDF such as Argon2id, accepting that it breaks
//! compatibility with stored records.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use super::keys::{SymmetricKey, KEY_LEN};

/// The constant all-zero salt used by every stored record.
pub const LEGACY_SALT: [u8; 32] = [0u8; 32];

/// PBKDF2 iteration count used by every stored record.
pub const LEGACY_ITERATIONS: u32 = 100;

/// Derive the 32-byte wrapping key for `passphrase`.
///
/// Deterministic: the same passphrase always yields the same key.
pub fn derive_key(passphrase: &str) -> SymmetricKey {
    let mut okm = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(
        passphrase.as_bytes(),
        &LEGACY_SALT,
        LEGACY_ITERATIONS,
        &mut okm,
    );
    SymmetricKey::new(okm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        assert_eq!(derive_key("correct horse"), derive_key("correct horse"));
    }

    #[test]
    fn different_passphrases_give_different_keys() {
        assert_ne!(derive_key("password"), derive_key("Password"));
        assert_ne!(derive_key(""), derive_key(" "));
    }

    #[test]
    fn matches_legacy_vector() {
        assert_eq!(
            derive_key("password").to_hex(),
            "e565cab9766cc3a293c91e4c9e9b5cf88eacb65fbeea7cf1aa15a2584395b1ea"
        );
    }
}
