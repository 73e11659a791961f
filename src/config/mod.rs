//! Project-level configuration (`.pmvault.toml`).

pub mod settings;

pub use settings::Settings;
