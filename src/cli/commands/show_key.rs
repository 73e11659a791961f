//! `pmvault show-key`: decrypt a master key record and print the key.

use crate::cli::output;
use crate::cli::{load_settings, open_engine, prompt_passphrase, read_record, Cli};
use crate::errors::Result;

/// Execute the `show-key` command.
///
/// Always asks for the passphrase; the session cache is not consulted.
pub fn execute(cli: &Cli, record: &str, readable: bool) -> Result<()> {
    let settings = load_settings()?;
    let record = read_record(record)?;
    let passphrase = prompt_passphrase()?;

    let mut engine = open_engine(cli, &settings)?;
    engine.unlock(record, &passphrase)?;
    let master_key = engine.master_key()?;

    output::warning("The master key is about to be printed. Clear your terminal afterwards.");
    if readable {
        println!("{}", String::from_utf8_lossy(master_key.as_bytes()));
    } else {
        println!("{}", master_key.to_hex());
    }
    Ok(())
}
