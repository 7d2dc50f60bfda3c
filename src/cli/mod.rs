//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;
use crate::errors::Result;
use crate::vault::SecretsStore;

/// Secrets: keep a secrets file encrypted on disk and edit it in place.
#[derive(Parser)]
#[command(
    name = "secrets",
    about = "Encrypted secrets file manager",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base secrets file name (overrides `file` in .secrets.toml)
    #[arg(long, global = true)]
    pub file: Option<String>,

    /// Environment variable holding the key (overrides `env_key`)
    #[arg(long, global = true)]
    pub env_key: Option<String>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create the key file and the encrypted secrets file
    #[command(alias = "init")]
    Setup,

    /// Print the decrypted secrets
    Show,

    /// Open secrets in $EDITOR (decrypts to a temp file, re-encrypts on exit)
    Edit,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load `.secrets.toml` from the current directory and apply CLI overrides.
pub fn load_settings(cli: &Cli) -> Result<(PathBuf, Settings)> {
    let cwd = std::env::current_dir()?;
    let mut settings = Settings::load(&cwd)?;

    if let Some(file) = &cli.file {
        settings.file = file.clone();
    }
    if let Some(env_key) = &cli.env_key {
        settings.env_key = env_key.clone();
    }

    Ok((cwd, settings))
}

/// Build the store for the current directory.
pub fn open_store(cli: &Cli) -> Result<(Settings, SecretsStore)> {
    let (cwd, settings) = load_settings(cli)?;
    let store = SecretsStore::new(&cwd, &settings);
    Ok((settings, store))
}
