//! `pmvault init`: create a master key and print its wrapped record.
//!
//! The record is the only durable copy of the master key: it must be
//! stored (e.g. in the first row of a ledger) by the user.

use tracing::debug;

use crate::cli::output;
use crate::cli::{load_settings, open_engine, prompt_new_passphrase, session_token, Cli, PASSPHRASE_ENV};
use crate::crypto::{SessionToken, SymmetricKey};
use crate::errors::Result;

/// Execute the `init` command.
pub fn execute(cli: &Cli, key: Option<&str>) -> Result<()> {
    let settings = load_settings()?;

    // 1. Parse an adopted key before prompting, so typos fail fast.
    let master_key = match key {
        Some(hex) => {
            output::warning("Master key provided on command line, it may appear in shell history.");
            Some(SymmetricKey::from_hex(hex)?)
        }
        None => None,
    };

    // 2. Reuse the caller's session token, or mint one for this session.
    let (token, generated) = match session_token(cli)? {
        Some(token) => (token, false),
        None => (SessionToken::generate(), true),
    };

    // 3. Wrap the key under a new passphrase and cache it for the session.
    let passphrase = prompt_new_passphrase(PASSPHRASE_ENV, &settings)?;
    let mut engine = open_engine(cli, &settings)?;
    let record = match master_key {
        Some(master_key) => engine.fresh_start_with_key(master_key, &passphrase, token.clone())?,
        None => engine.fresh_start(&passphrase, token.clone())?,
    };
    debug!(store = %engine.store().path().display(), "session cache written");

    output::success("Master key created.");
    output::info("Master key record (keep it safe, it cannot be regenerated):");
    println!("{record}");

    if generated {
        output::info("Session token:");
        println!("{}", token.encoded());
        output::tip("Export it as PMVAULT_SESSION_TOKEN to resume this session without the passphrase.");
    }

    Ok(())
}
