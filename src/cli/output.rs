//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::ledger::{Field, Ledger};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print the current listing of ledger entries (#, Site).
///
/// Numbers are 1-based positions in `indices`, which is what the browse
/// prompt accepts.
pub fn print_entries(ledger: &Ledger, indices: &[usize]) {
    if indices.is_empty() {
        info("No entries in this ledger.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Site"]);

    for (position, &index) in indices.iter().enumerate() {
        table.add_row(vec![
            (position + 1).to_string(),
            ledger.site_label(index).to_string(),
        ]);
    }

    println!("{table}");
}

/// Print the revealed fields of one entry (Field, Value).
pub fn print_fields(title: &str, fields: &[Field]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);

    for field in fields {
        table.add_row(vec![field.header.clone(), field.value.to_string()]);
    }

    println!("{}", style(title).bold());
    println!("{table}");
}
