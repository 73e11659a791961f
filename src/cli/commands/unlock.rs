//! `pmvault unlock`: resume a session and refresh the session cache.

use crate::cli::output;
use crate::cli::{load_settings, read_record, session_token, unlock_engine, Cli};
use crate::engine::RecoveredFrom;
use crate::errors::{Result, VaultError};

/// Execute the `unlock` command.
pub fn execute(cli: &Cli, record: &str) -> Result<()> {
    if session_token(cli)?.is_none() {
        output::tip("Run `pmvault init` to get a token, or pass one with --session-token.");
        return Err(VaultError::CommandFailed(
            "unlock needs a session token (--session-token or PMVAULT_SESSION_TOKEN)".into(),
        ));
    }

    let settings = load_settings()?;
    let record = read_record(record)?;
    let (_engine, source) = unlock_engine(cli, &settings, record)?;

    match source {
        RecoveredFrom::SessionCache => output::success("Master key recovered from the session cache."),
        RecoveredFrom::Passphrase => {
            output::success("Master key unlocked with the passphrase.");
            output::info("Session cache refreshed for this token.");
        }
    }
    Ok(())
}
