//! Marz task host daemon.
//!
//! Runs the panel's periodic jobs for the lifetime of the process.
//!
//! # Usage
//!
//! ```bash
//! marz-daemon start [--worker-id ID]
//! marz-daemon jobs
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/marz/config.toml)
//! 3. Environment variables (MARZ__*, plus WORKER_ID)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use marz_daemon::{show_jobs, start_daemon, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { worker_id } => {
            start_daemon(
                cli.config.as_deref(),
                worker_id.as_deref(),
                cli.log_level.as_deref(),
            )
            .await?;
        }
        Commands::Jobs => {
            show_jobs(cli.config.as_deref())?;
        }
    }

    Ok(())
}
