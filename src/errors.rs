use thiserror::Error;

/// All errors that can occur in pmvault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Envelope / crypto errors ---
    #[error("Malformed envelope: {0}")]
    Format(String),

    #[error("Decryption failed: wrong key or passphrase, or the data was tampered with")]
    Auth,

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decrypted secret is not valid UTF-8 text")]
    NotText,

    // --- Lifecycle errors ---
    #[error("Invalid vault state: {0}")]
    State(&'static str),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(String),

    // --- Ledger errors ---
    #[error("Ledger error: {0}")]
    Ledger(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

/// Convenience type alias for pmvault results.
pub type Result<T> = std::result::Result<T, VaultError>;
