//! `pmvault browse`: interactive viewer for a CSV ledger.
//!
//! Lists entries by site, supports substring search, and decrypts a
//! chosen entry with the master key stored in the ledger's first row.

use std::path::Path;

use dialoguer::Input;

use crate::cli::output;
use crate::cli::{load_settings, unlock_engine, Cli};
use crate::errors::{Result, VaultError};
use crate::ledger::Ledger;

/// One line of user input at the browse prompt.
#[derive(Debug, PartialEq, Eq)]
enum BrowseCommand {
    Quit,
    /// Blank input: show every entry again.
    Reset,
    Search(String),
    /// `search` with nothing after it.
    MissingTerm,
    /// A 1-based entry number from the current listing.
    Show(usize),
    Invalid,
}

fn parse_browse_command(input: &str) -> BrowseCommand {
    let input = input.trim();
    let lowered = input.to_lowercase();

    if input.is_empty() {
        return BrowseCommand::Reset;
    }
    if matches!(lowered.as_str(), "q" | "quit" | "exit") {
        return BrowseCommand::Quit;
    }
    if lowered == "search" {
        return BrowseCommand::MissingTerm;
    }
    if let Some(term) = lowered.strip_prefix("search ") {
        let term = term.trim();
        if term.is_empty() {
            return BrowseCommand::MissingTerm;
        }
        return BrowseCommand::Search(term.to_string());
    }
    match input.parse::<usize>() {
        Ok(number) => BrowseCommand::Show(number),
        Err(_) => BrowseCommand::Invalid,
    }
}

/// Execute the `browse` command.
pub fn execute(cli: &Cli, file: &str) -> Result<()> {
    let settings = load_settings()?;
    let ledger = Ledger::from_path(Path::new(file), &settings.ledger_layout())?;
    output::info(&format!("Loaded {} entries from {file}", ledger.len()));

    let record = ledger.master_record()?;
    let (engine, _) = unlock_engine(cli, &settings, record)?;
    output::success("Master key unlocked.");

    let mut view = ledger.search("");
    loop {
        output::print_entries(&ledger, &view);

        let input: String = Input::new()
            .with_prompt("Entry number, 'search <term>', blank for all, or 'q' to quit")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| VaultError::CommandFailed(format!("input prompt: {e}")))?;

        match parse_browse_command(&input) {
            BrowseCommand::Quit => break,
            BrowseCommand::Reset => view = ledger.search(""),
            BrowseCommand::MissingTerm => output::warning("Please provide a search term."),
            BrowseCommand::Search(term) => {
                let hits = ledger.search(&term);
                if hits.is_empty() {
                    output::warning(&format!("No entries found matching '{term}'."));
                } else {
                    output::success(&format!("Found {} matching entries.", hits.len()));
                    view = hits;
                }
            }
            BrowseCommand::Show(number) => {
                match number.checked_sub(1).and_then(|i| view.get(i)) {
                    Some(&index) => {
                        let fields = ledger.reveal(&engine, index)?;
                        output::print_fields(ledger.site_label(index), &fields);
                    }
                    None => output::warning(&format!(
                        "Invalid entry number. Please enter 1-{}.",
                        view.len()
                    )),
                }
            }
            BrowseCommand::Invalid => {
                output::warning("Unrecognised input. Enter a number, 'search <term>', or 'q'.")
            }
        }
    }

    Ok(())
}
