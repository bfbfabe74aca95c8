//! Command-line interface for turing_chat.

use clap::{Parser, Subcommand};

/// Turing Chat - chat with a stranger, then guess: human or AI?
#[derive(Parser, Debug)]
#[command(name = "turing_chat")]
#[command(about = "Terminal client for the human-or-AI guessing chat", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a game server and play
    Play {
        /// Path to a TOML client config
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Game server WebSocket URL (overrides config and environment)
        #[arg(long)]
        server_url: Option<String>,
    },

    /// Print the effective configuration as TOML
    ShowConfig {
        /// Path to a TOML client config
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,
    },
}
