//! `pmvault seal` / `pmvault open`: encrypt and decrypt secrets under
//! the master key.

use crate::cli::commands::crypt::print_plaintext;
use crate::cli::{load_settings, read_record, read_secret_text, unlock_engine, Cli};
use crate::crypto::Envelope;
use crate::errors::Result;

/// Execute the `seal` command.
pub fn execute_seal(cli: &Cli, record: &str, text: Option<&str>) -> Result<()> {
    let settings = load_settings()?;
    let record = read_record(record)?;
    let plaintext = read_secret_text(text)?;

    let (engine, _) = unlock_engine(cli, &settings, record)?;
    let envelope = engine.encrypt_secret(plaintext.as_bytes())?;
    println!("{envelope}");
    Ok(())
}

/// Execute the `open` command.
pub fn execute_open(cli: &Cli, record: &str, envelope: &str) -> Result<()> {
    let settings = load_settings()?;
    let record = read_record(record)?;
    let envelope = Envelope::decode(envelope)?;

    let (engine, _) = unlock_engine(cli, &settings, record)?;
    let plaintext = engine.decrypt_secret(&envelope)?;
    print_plaintext(&plaintext);
    Ok(())
}
