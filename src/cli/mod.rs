//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::{Envelope, SessionToken};
use crate::engine::{PassphraseRejection, RecoveredFrom, Recovery, VaultEngine};
use crate::errors::{Result, VaultError};
use crate::storage::JsonFileStore;

/// Environment variable holding the passphrase (scripted/CI usage).
pub const PASSPHRASE_ENV: &str = "PMVAULT_PASSPHRASE";

/// Environment variable holding the new passphrase for `rotate`.
pub const NEW_PASSPHRASE_ENV: &str = "PMVAULT_NEW_PASSPHRASE";

/// pmvault CLI: personal password vault.
#[derive(Parser)]
#[command(
    name = "pmvault",
    about = "Personal password vault with a passphrase-wrapped master key",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Session cache file (default: pmvault_storage.json, see .pmvault.toml)
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Session token (base64, 32 bytes) that caches the unlocked master key
    #[arg(long, env = "PMVAULT_SESSION_TOKEN", hide_env_values = true, global = true)]
    pub session_token: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new master key and print its passphrase-wrapped record
    Init {
        /// Adopt an existing master key (64 hex digits) instead of generating one
        #[arg(long)]
        key: Option<String>,
    },

    /// Resume a session: unlock via the session cache, else the passphrase
    Unlock {
        /// Master key record (or @FILE to read it from a file)
        record: String,
    },

    /// Decrypt a master key record with its passphrase and print the key
    ShowKey {
        /// Master key record (or @FILE)
        record: String,
        /// Print the key as lossy text instead of hex
        #[arg(short, long)]
        readable: bool,
    },

    /// Re-wrap the master key under a new passphrase
    Rotate {
        /// Current master key record (or @FILE)
        record: String,
    },

    /// Encrypt text directly with a passphrase
    Encrypt {
        /// Text to encrypt (omit for stdin or an interactive prompt)
        text: Option<String>,
    },

    /// Decrypt an envelope directly with a passphrase
    Decrypt {
        /// Envelope to decrypt (iv&ciphertext)
        envelope: String,
    },

    /// Encrypt a secret under the master key
    Seal {
        /// Master key record (or @FILE)
        record: String,
        /// Secret to encrypt (omit for stdin or an interactive prompt)
        text: Option<String>,
    },

    /// Decrypt a secret with the master key
    Open {
        /// Master key record (or @FILE)
        record: String,
        /// Envelope to decrypt (iv&ciphertext)
        envelope: String,
    },

    /// Browse and search a CSV ledger of encrypted entries
    Browse {
        /// Path to the CSV ledger
        file: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load `.pmvault.toml` from the current directory.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// Path of the session cache store: `--store`, else the configured file.
pub fn store_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    match &cli.store {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(settings.store_path(&std::env::current_dir()?)),
    }
}

/// Build an engine over the JSON store.
pub fn open_engine(cli: &Cli, settings: &Settings) -> Result<VaultEngine<JsonFileStore>> {
    let store = JsonFileStore::new(store_path(cli, settings)?);
    Ok(VaultEngine::with_session_tag(store, settings.session_tag.clone()))
}

/// The session token from `--session-token` / `PMVAULT_SESSION_TOKEN`.
pub fn session_token(cli: &Cli) -> Result<Option<SessionToken>> {
    cli.session_token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(SessionToken::from_encoded)
        .transpose()
}

/// Parse a master key record argument.  `@path` reads it from a file.
pub fn read_record(arg: &str) -> Result<Envelope> {
    match arg.strip_prefix('@') {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Envelope::decode(&text)
        }
        None => Envelope::decode(arg),
    }
}

/// Passphrase from the environment, if set and non-empty.
fn passphrase_from_env(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Get an existing passphrase, trying in order:
/// 1. `PMVAULT_PASSPHRASE` env var (CI/CD)
/// 2. Interactive hidden prompt
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn prompt_passphrase() -> Result<Zeroizing<String>> {
    if let Some(pw) = passphrase_from_env(PASSPHRASE_ENV) {
        return Ok(pw);
    }
    ask_passphrase("Enter passphrase")
}

fn ask_passphrase(prompt: &str) -> Result<Zeroizing<String>> {
    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(false)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new passphrase with confirmation.
///
/// Also respects `env_var` for scripted usage.  Enforces the configured
/// minimum length.
pub fn prompt_new_passphrase(env_var: &str, settings: &Settings) -> Result<Zeroizing<String>> {
    let min_len = settings.min_passphrase_len;

    if let Some(pw) = passphrase_from_env(env_var) {
        if pw.chars().count() < min_len {
            return Err(VaultError::CommandFailed(format!(
                "passphrase must be at least {min_len} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let passphrase = dialoguer::Password::new()
            .with_prompt("Choose a passphrase")
            .with_confirmation("Confirm passphrase", "Passphrases do not match, try again")
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("passphrase prompt: {e}")))?;

        if passphrase.chars().count() < min_len {
            output::warning(&format!(
                "Passphrase must be at least {min_len} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(passphrase));
    }
}

/// Read secret text from the argument, piped stdin, or a hidden prompt.
pub fn read_secret_text(inline: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(text) = inline {
        output::warning("Secret provided on command line, it may appear in shell history.");
        return Ok(Zeroizing::new(text.to_string()));
    }

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = Zeroizing::new(buf.trim_end().to_string());
        return Ok(trimmed);
    }

    let text = dialoguer::Password::new()
        .with_prompt("Enter secret")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(text))
}

/// Unlock the master key in `record` for a command.
///
/// With a session token, resumes the session (cache first, passphrase as
/// fallback, re-prompting up to `max_passphrase_attempts` times).  Without
/// one, goes straight to the passphrase.  Returns where the key came from.
///
/// The session cache is keyed by token, not by record: with one token
/// shared across two records, a cache hit yields whichever key was cached
/// last.  Secrets sealed under the other record then fail to open with
/// `Auth`.  Commands that write a new record (`rotate`) must not use this.
pub fn unlock_engine(
    cli: &Cli,
    settings: &Settings,
    record: Envelope,
) -> Result<(VaultEngine<JsonFileStore>, RecoveredFrom)> {
    let mut engine = open_engine(cli, settings)?;

    let Some(token) = session_token(cli)? else {
        let passphrase = prompt_passphrase()?;
        engine.unlock(record, &passphrase)?;
        return Ok((engine, RecoveredFrom::Passphrase));
    };

    // A scripted passphrase gets exactly one try; there is nobody to re-prompt.
    if let Some(passphrase) = passphrase_from_env(PASSPHRASE_ENV) {
        return match engine.session_start(record, token, Some(passphrase.as_str())) {
            Recovery::Recovered(source) => Ok((engine, source)),
            Recovery::NeedsPassphrase(reason) => Err(reason
                .as_ref()
                .map(rejection_error)
                .unwrap_or(VaultError::Auth)),
        };
    }

    let mut recovery = engine.session_start_with_prompt(record, token, None, |reason| {
        if let Some(reason) = reason {
            output::warning(&reason.to_string());
        }
    });

    let mut attempts = 0;
    loop {
        if let Recovery::Recovered(source) = recovery {
            return Ok((engine, source));
        }
        if attempts >= settings.max_passphrase_attempts {
            return Err(recovery
                .rejection()
                .map(rejection_error)
                .unwrap_or(VaultError::UserCancelled));
        }
        attempts += 1;

        let passphrase = ask_passphrase("Enter passphrase")?;
        recovery = engine.recover_with_passphrase(&passphrase)?;
        if let Some(rejection) = recovery.rejection() {
            output::warning(&rejection.to_string());
        }
    }
}

fn rejection_error(rejection: &PassphraseRejection) -> VaultError {
    match rejection {
        PassphraseRejection::WrongPassphrase => VaultError::Auth,
        PassphraseRejection::MalformedRecord(reason) => VaultError::Format(reason.clone()),
    }
}
