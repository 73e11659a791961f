use clap::Parser;
use pmvault::cli::commands;
use pmvault::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to stderr.  `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "pmvault=warn",
        1 => "pmvault=info",
        _ => "pmvault=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init { ref key } => commands::init::execute(&cli, key.as_deref()),
        Commands::Unlock { ref record } => commands::unlock::execute(&cli, record),
        Commands::ShowKey {
            ref record,
            readable,
        } => commands::show_key::execute(&cli, record, readable),
        Commands::Rotate { ref record } => commands::rotate::execute(&cli, record),
        Commands::Encrypt { ref text } => commands::crypt::execute_encrypt(text.as_deref()),
        Commands::Decrypt { ref envelope } => commands::crypt::execute_decrypt(envelope),
        Commands::Seal {
            ref record,
            ref text,
        } => commands::seal::execute_seal(&cli, record, text.as_deref()),
        Commands::Open {
            ref record,
            ref envelope,
        } => commands::seal::execute_open(&cli, record, envelope),
        Commands::Browse { ref file } => commands::browse::execute(&cli, file),
        Commands::Completions { ref shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        pmvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
