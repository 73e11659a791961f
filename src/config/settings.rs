use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::DEFAULT_SESSION_TAG;
use crate::errors::{Result, VaultError};
use crate::ledger::LedgerLayout;

/// Project-level configuration, loaded from `.pmvault.toml`.
///
/// Every field has a sensible default so pmvault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// JSON file (relative to the project root) holding the session cache.
    #[serde(default = "default_store_file")]
    pub store_file: String,

    /// Key the session cache entry is stored under.
    #[serde(default = "default_session_tag")]
    pub session_tag: String,

    /// Minimum length enforced when choosing a new passphrase.
    #[serde(default = "default_min_passphrase_len")]
    pub min_passphrase_len: usize,

    /// How many times an interactive unlock re-prompts on a wrong passphrase.
    #[serde(default = "default_max_passphrase_attempts")]
    pub max_passphrase_attempts: u32,

    /// Ledger column that names each entry.
    #[serde(default = "default_site_column")]
    pub site_column: String,

    /// Ledger columns stored in plaintext.
    #[serde(default = "default_plaintext_columns")]
    pub plaintext_columns: Vec<String>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_store_file() -> String {
    "pmvault_storage.json".to_string()
}

fn default_session_tag() -> String {
    DEFAULT_SESSION_TAG.to_string()
}

fn default_min_passphrase_len() -> usize {
    8
}

fn default_max_passphrase_attempts() -> u32 {
    3
}

fn default_site_column() -> String {
    "site".to_string()
}

fn default_plaintext_columns() -> Vec<String> {
    vec!["index".to_string(), "site".to_string()]
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_file: default_store_file(),
            session_tag: default_session_tag(),
            min_passphrase_len: default_min_passphrase_len(),
            max_passphrase_attempts: default_max_passphrase_attempts(),
            site_column: default_site_column(),
            plaintext_columns: default_plaintext_columns(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".pmvault.toml";

    /// Load settings from `<project_dir>/.pmvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.max_passphrase_attempts == 0 {
            return Err(VaultError::Config(
                "max_passphrase_attempts must be at least 1".into(),
            ));
        }

        Ok(settings)
    }

    /// Full path of the session cache store.
    ///
    /// Example: `project_dir/pmvault_storage.json`
    pub fn store_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.store_file)
    }

    /// Ledger column layout for the CSV browser.
    pub fn ledger_layout(&self) -> LedgerLayout {
        LedgerLayout {
            site_column: self.site_column.clone(),
            plaintext_columns: self.plaintext_columns.clone(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
