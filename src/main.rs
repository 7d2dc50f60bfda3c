use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use secrets_vault::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // SECRETS_LOG overrides the default level; --verbose turns on debug.
    let filter = EnvFilter::try_from_env("SECRETS_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("secrets_vault=debug")
        } else {
            EnvFilter::new("secrets_vault=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let result = match cli.command {
        Commands::Setup => secrets_vault::cli::commands::setup::execute(&cli),
        Commands::Show => secrets_vault::cli::commands::show::execute(&cli),
        Commands::Edit => secrets_vault::cli::commands::edit::execute(&cli),
        Commands::Completions { shell } => {
            secrets_vault::cli::commands::completions::execute(shell)
        }
    };

    if let Err(e) = result {
        secrets_vault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
