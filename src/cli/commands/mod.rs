//! CLI command definitions and dispatch.
//!
//! This module provides the command-line interface for artist-sync.
//! Each subcommand is implemented in its own submodule:
//! - `sync`: Authorized catalog sync and token hashing
//! - `catalog`: One-off catalog lookups
//! - `artists`: Managing local artist records
//! - `init`: Writing a starter config file

mod artists;
mod catalog;
mod init;
mod sync;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::error::Error;

pub use artists::{cmd_add, cmd_list};
pub use catalog::cmd_match;
pub use init::cmd_init_config;
pub use sync::{cmd_hash_token, cmd_sync};

/// Artist catalog sync
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to the OS config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path (overrides config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Spotify client ID (overrides config)
    #[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true, global = true)]
    pub client_id: Option<String>,

    /// Spotify client secret (overrides config)
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true, global = true)]
    pub client_secret: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Match every unsynced artist against the catalog and store the results
    Sync {
        /// Bearer token of an admin principal
        #[arg(short, long, env = "ARTIST_SYNC_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Pretty-print the JSON response
        #[arg(long)]
        pretty: bool,
    },
    /// Look up one name in the catalog without writing anything
    Match {
        /// Artist name to search for
        name: String,
    },
    /// Add artists to the database
    Add {
        /// Artist names
        names: Vec<String>,
        /// Read names from a file, one per line (# starts a comment)
        #[arg(long)]
        from_file: Option<PathBuf>,
    },
    /// List artists and their sync state
    List {
        /// Only show artists without a catalog ID
        #[arg(long)]
        unsynced: bool,
    },
    /// Print the SHA-256 hash of a token for the [[auth.tokens]] config
    HashToken {
        /// Plaintext token
        token: String,
    },
    /// Write a config file with default settings
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the specified CLI command.
///
/// Returns a failure exit code when a sync response reports `success: false`.
pub fn run_command(cli: &Cli) -> anyhow::Result<ExitCode> {
    // Hashing needs neither config nor runtime
    match &cli.command {
        Commands::HashToken { token } => {
            cmd_hash_token(token);
            return Ok(ExitCode::SUCCESS);
        }
        Commands::InitConfig { force } => {
            let mut config = Config::default();
            apply_overrides(&mut config, cli);
            cmd_init_config(&config, cli.config.as_deref(), *force)?;
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let config = resolve_config(cli)?;
    let rt = Runtime::new()?;

    match &cli.command {
        Commands::Sync { token, pretty } => {
            let success = cmd_sync(&rt, &config, token.as_deref(), *pretty)?;
            Ok(if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Match { name } => {
            cmd_match(&rt, &config, name)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Add { names, from_file } => {
            cmd_add(&rt, &config, names, from_file.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::List { unsynced } => {
            cmd_list(&rt, &config, *unsynced)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::HashToken { .. } | Commands::InitConfig { .. } => Ok(ExitCode::SUCCESS),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Load the config file, apply command-line overrides and validate.
fn resolve_config(cli: &Cli) -> crate::error::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => config::load_from(path)?,
        None => config::load(),
    };
    apply_overrides(&mut config, cli);

    config
        .matching
        .thresholds()
        .validate()
        .map_err(|e| Error::config(e.to_string()))?;

    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref path) = cli.db {
        config.database.path = path.clone();
    }
    if let Some(ref id) = cli.client_id {
        config.catalog.client_id = Some(id.clone());
    }
    if let Some(ref secret) = cli.client_secret {
        config.catalog.client_secret = Some(secret.clone());
    }
}

/// Open the configured artist database, creating it if needed.
pub(crate) async fn open_db(config: &Config) -> crate::error::Result<sqlx::SqlitePool> {
    use crate::error::ResultExt;

    let url = crate::db::db_url(Some(&config.database.path));
    crate::db::init_db(&url)
        .await
        .with_context(format!("opening {}", config.database.path.display()))
}
