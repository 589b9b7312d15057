//! CLI argument parsing for the marz daemon.
//!
//! CLI flags override all other config sources.

use clap::{Parser, Subcommand};

/// Marz task host
///
/// Drives the panel's periodic background jobs.
#[derive(Parser, Debug)]
#[command(name = "marz-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/marz/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Daemon commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the task host until SIGINT/SIGTERM
    Start {
        /// Worker identity token (overrides WORKER_ID)
        #[arg(short, long)]
        worker_id: Option<String>,
    },

    /// Print the periodic jobs this configuration registers
    Jobs,
}
