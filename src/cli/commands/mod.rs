//! One module per subcommand, each exposing an `execute` entry point.

pub mod browse;
pub mod completions;
pub mod crypt;
pub mod init;
pub mod rotate;
pub mod seal;
pub mod show_key;
pub mod unlock;
