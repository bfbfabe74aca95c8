//! Turing Chat - terminal client
//!
//! Pairs you with an anonymous partner, then asks you to guess whether it
//! was a person or an AI.

#![warn(missing_docs)]

mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;
use turing_chat::{ClientConfig, run_terminal};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with the transcript.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play { config, server_url } => play(config, server_url).await,
        Command::ShowConfig { config } => show_config(config),
    }
}

/// Run the interactive terminal client
#[instrument]
async fn play(config: Option<PathBuf>, server_url: Option<String>) -> Result<()> {
    let mut config = ClientConfig::load(config.as_deref())?;
    if let Some(url) = server_url {
        config = config.with_server_url(url);
    }

    info!(server_url = %config.server_url(), "Starting Turing Chat client");
    run_terminal(config).await
}

/// Print the effective configuration
#[instrument]
fn show_config(config: Option<PathBuf>) -> Result<()> {
    let config = ClientConfig::load(config.as_deref())?;
    print!("{}", config.to_toml()?);
    Ok(())
}
