//! Hardlinker CLI
//!
//! Mirrors a Syncthing folder into a second tree using hardlinks.
//!
//! # Commands
//!
//! - `watch` - Follow the event log and link every finished item (default)
//! - `reconcile` - Walk the source tree once and link everything missing
//! - `check` - Verify the connection and clear reported errors

mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::{AppConfig, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Hardlink mirror driven by Syncthing events.
#[derive(Parser)]
#[command(name = "hardlinker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(global = true, short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the event log until interrupted
    Watch {
        /// Resume after this event id
        #[arg(short, long, default_value = "0")]
        since: u64,
    },

    /// Link every qualifying file of the source tree that is not mirrored yet
    Reconcile,

    /// Check the connection to Syncthing and clear its error list
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(&cli.config)?;

    match cli.command.unwrap_or(Commands::Watch { since: 0 }) {
        Commands::Watch { since } => commands::watch::run(&config, since).await?,
        Commands::Reconcile => commands::reconcile::run(&config)?,
        Commands::Check => commands::check::run(&config).await?,
    }

    Ok(())
}
