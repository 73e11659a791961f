//! `pmvault rotate`: re-wrap the master key under a new passphrase.
//!
//! The master key itself does not change, so every secret encrypted under
//! it stays readable.  Only the printed record supersedes the old one.
//!
//! The current passphrase is always required.  The session cache is keyed
//! by token only, so a cached key may belong to a different record, and a
//! rotated record must wrap the key of the record it replaces.

use crate::cli::output;
use crate::cli::{
    load_settings, open_engine, prompt_new_passphrase, prompt_passphrase, read_record, Cli,
    NEW_PASSPHRASE_ENV,
};
use crate::errors::Result;

/// Execute the `rotate` command.
pub fn execute(cli: &Cli, record: &str) -> Result<()> {
    let settings = load_settings()?;
    let record = read_record(record)?;

    // 1. Unlock the record itself with the current passphrase.
    output::info("Enter your current passphrase.");
    let passphrase = prompt_passphrase()?;
    let mut engine = open_engine(cli, &settings)?;
    engine.unlock(record, &passphrase)?;

    // 2. Re-wrap under the new passphrase.
    output::info("Choose your new passphrase.");
    let new_passphrase = prompt_new_passphrase(NEW_PASSPHRASE_ENV, &settings)?;
    let rewrapped = engine.rotate_passphrase(&new_passphrase)?;

    output::success("Passphrase changed. Replace your stored record with:");
    println!("{rewrapped}");
    output::tip("The old record still opens with the old passphrase; discard it.");
    Ok(())
}
