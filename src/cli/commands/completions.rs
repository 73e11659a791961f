//! `pmvault completions`: generate shell completion scripts.
//!
//! Usage:
//!   pmvault completions bash > ~/.bash_completion.d/pmvault
//!   pmvault completions zsh
//!   pmvault completions pwsh

use std::io::{self, Write};

use clap::{CommandFactory, ValueEnum};
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::{Result, VaultError};

/// Name the scripts complete; must match the installed binary.
const BIN_NAME: &str = "pmvault";

/// Execute the `completions` command.
pub fn execute(shell: &str) -> Result<()> {
    write_completions(parse_shell(shell)?, &mut io::stdout())
}

fn write_completions(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, out);
    out.flush()?;
    Ok(())
}

/// Parse a shell name, accepting `ps` / `pwsh` for PowerShell.
fn parse_shell(name: &str) -> Result<Shell> {
    let lowered = name.trim().to_lowercase();
    let canonical = match lowered.as_str() {
        "ps" | "pwsh" => "powershell",
        other => other,
    };
    <Shell as ValueEnum>::from_str(canonical, true).map_err(|_| {
        VaultError::CommandFailed(format!(
            "unknown shell '{name}', supported: {}",
            supported_shells().join(", ")
        ))
    })
}

fn supported_shells() -> Vec<String> {
    Shell::value_variants()
        .iter()
        .filter_map(|shell| shell.to_possible_value())
        .map(|value| value.get_name().to_string())
        .collect()
}
