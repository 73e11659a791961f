//! CSV ledgers of encrypted entries.
//!
//! A ledger is a spreadsheet export laid out as:
//!
//! ```text
//! row 1:  <note>, <passphrase-wrapped master key record>
//! row 2:  Index, Site, Username, Password, Additional Info   (headers)
//! row 3+: one entry per row
//! ```
//!
//! Plaintext columns (by default `Index` and `Site`, matched
//! case-insensitively) are shown as-is; every other non-empty cell is an
//! envelope encrypted under the master key.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use zeroize::Zeroizing;

use crate::crypto::Envelope;
use crate::engine::VaultEngine;
use crate::errors::{Result, VaultError};
use crate::storage::KeyValueStore;

/// Shown for entries whose site cell is blank.
pub const NO_SITE_LABEL: &str = "[No site]";

/// Which columns are plaintext and which one names the site.
#[derive(Debug, Clone)]
pub struct LedgerLayout {
    pub site_column: String,
    pub plaintext_columns: Vec<String>,
}

impl Default for LedgerLayout {
    fn default() -> Self {
        Self {
            site_column: "site".to_string(),
            plaintext_columns: vec!["index".to_string(), "site".to_string()],
        }
    }
}

/// One revealed cell of an entry.
#[derive(Debug)]
pub struct Field {
    pub header: String,
    pub value: FieldValue,
}

/// The outcome of revealing a single cell.
#[derive(Debug)]
pub enum FieldValue {
    /// A plaintext column.
    Plain(String),
    /// A decrypted text secret.
    Secret(Zeroizing<String>),
    /// Decrypted fine but is not UTF-8; only the length is shown.
    Binary(usize),
    /// The cell is blank.
    Empty,
    /// The cell could not be decrypted.
    Failed(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(text) => f.write_str(text),
            Self::Secret(text) => f.write_str(text),
            Self::Binary(len) => write!(f, "[Binary data - {len} bytes]"),
            Self::Empty => f.write_str("[Empty]"),
            Self::Failed(reason) => write!(f, "[Decryption failed: {reason}]"),
        }
    }
}

/// A parsed ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    master_record: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    site_index: Option<usize>,
    plaintext: Vec<bool>,
}

impl Ledger {
    /// Load a ledger from a CSV file.
    pub fn from_path(path: &Path, layout: &LedgerLayout) -> Result<Self> {
        if !path.exists() {
            return Err(VaultError::Ledger(format!(
                "CSV file not found: {}",
                path.display()
            )));
        }
        let file = File::open(path)?;
        Self::from_reader(file, layout)
    }

    /// Parse a ledger from any CSV source.
    pub fn from_reader<R: Read>(reader: R, layout: &LedgerLayout) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record =
                record.map_err(|e| VaultError::Ledger(format!("invalid CSV: {e}")))?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        if rows.len() < 3 {
            return Err(VaultError::Ledger(
                "CSV file must have at least 3 rows: master key, headers, and at least one entry"
                    .into(),
            ));
        }

        let mut rows = rows.into_iter();
        let first = rows.next().unwrap_or_default();
        let master_record = first
            .get(1)
            .map(|cell| cell.trim().to_string())
            .filter(|cell| !cell.is_empty())
            .ok_or_else(|| {
                VaultError::Ledger("the first row must hold the master key record in its second column".into())
            })?;
        let headers: Vec<String> = rows.next().unwrap_or_default();
        let rows: Vec<Vec<String>> = rows.collect();

        let site_index = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(&layout.site_column));
        let plaintext = headers
            .iter()
            .map(|h| {
                layout
                    .plaintext_columns
                    .iter()
                    .any(|p| h.trim().eq_ignore_ascii_case(p))
            })
            .collect();

        Ok(Self {
            master_record,
            headers,
            rows,
            site_index,
            plaintext,
        })
    }

    /// The passphrase-wrapped master key stored in the first row.
    pub fn master_record(&self) -> Result<Envelope> {
        Envelope::decode(&self.master_record)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of entries (rows after the header row).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The site name of entry `index`, if the ledger has a site column and
    /// the cell is not blank.
    pub fn site(&self, index: usize) -> Option<&str> {
        let column = self.site_index?;
        self.rows
            .get(index)?
            .get(column)
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
    }

    /// The label to list entry `index` under.
    pub fn site_label(&self, index: usize) -> &str {
        self.site(index).unwrap_or(NO_SITE_LABEL)
    }

    /// Indices of entries whose site contains `term`, case-insensitively.
    /// A blank term matches every entry.
    pub fn search(&self, term: &str) -> Vec<usize> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return (0..self.rows.len()).collect();
        }
        (0..self.rows.len())
            .filter(|&i| {
                self.site(i)
                    .is_some_and(|site| site.to_lowercase().contains(&term))
            })
            .collect()
    }

    /// Decrypt every cell of entry `index` with the engine's master key.
    ///
    /// Individual cells that fail to decrypt are reported in place rather
    /// than failing the whole entry.
    pub fn reveal<S: KeyValueStore>(
        &self,
        engine: &VaultEngine<S>,
        index: usize,
    ) -> Result<Vec<Field>> {
        let row = self.rows.get(index).ok_or_else(|| {
            VaultError::Ledger(format!(
                "invalid entry number {}, expected 1-{}",
                index + 1,
                self.rows.len()
            ))
        })?;

        let fields = self
            .headers
            .iter()
            .enumerate()
            .map(|(column, header)| {
                let cell = row.get(column).map(|c| c.trim()).unwrap_or_default();
                let value = if cell.is_empty() {
                    FieldValue::Empty
                } else if self.plaintext.get(column).copied().unwrap_or(false) {
                    FieldValue::Plain(cell.to_string())
                } else {
                    reveal_cell(engine, cell)
                };
                Field {
                    header: header.clone(),
                    value,
                }
            })
            .collect();

        Ok(fields)
    }
}

fn reveal_cell<S: KeyValueStore>(engine: &VaultEngine<S>, cell: &str) -> FieldValue {
    let envelope = match Envelope::decode(cell) {
        Ok(envelope) => envelope,
        Err(e) => return FieldValue::Failed(e.to_string()),
    };
    match engine.decrypt_secret_text(&envelope) {
        Ok(text) => FieldValue::Secret(text),
        Err(VaultError::NotText) => match engine.decrypt_secret(&envelope) {
            Ok(bytes) => FieldValue::Binary(bytes.len()),
            Err(e) => FieldValue::Failed(e.to_string()),
        },
        Err(e) => FieldValue::Failed(e.to_string()),
    }
}
