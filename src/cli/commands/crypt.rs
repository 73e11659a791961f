//! `pmvault encrypt` / `pmvault decrypt`: passphrase-direct encryption.
//!
//! These skip the master key entirely: the AES key is derived from the
//! passphrase on every call.

use crate::cli::output;
use crate::cli::{prompt_passphrase, read_secret_text};
use crate::crypto::{decrypt_with_passphrase, encrypt_with_passphrase, Envelope};
use crate::errors::Result;

/// Execute the `encrypt` command.
pub fn execute_encrypt(text: Option<&str>) -> Result<()> {
    let plaintext = read_secret_text(text)?;
    let passphrase = prompt_passphrase()?;
    let envelope = encrypt_with_passphrase(&passphrase, plaintext.as_bytes())?;
    println!("{envelope}");
    Ok(())
}

/// Execute the `decrypt` command.
pub fn execute_decrypt(envelope: &str) -> Result<()> {
    let envelope = Envelope::decode(envelope)?;
    let passphrase = prompt_passphrase()?;
    let plaintext = decrypt_with_passphrase(&passphrase, &envelope)?;
    print_plaintext(&plaintext);
    Ok(())
}

/// Print decrypted bytes as text, or as hex when they are not UTF-8.
pub(crate) fn print_plaintext(plaintext: &[u8]) {
    match std::str::from_utf8(plaintext) {
        Ok(text) => println!("{text}"),
        Err(_) => {
            output::info(&format!(
                "Decrypted {} bytes of binary data, shown as hex:",
                plaintext.len()
            ));
            println!("{}", hex::encode(plaintext));
        }
    }
}
