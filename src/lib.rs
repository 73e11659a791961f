pub mod cli;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod storage;
