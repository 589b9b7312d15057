//! Marz daemon library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (start, jobs)
//! - `tasks`: Task backend used when no panel backend is linked in

pub mod cli;
pub mod commands;
pub mod tasks;

pub use cli::{Cli, Commands};
pub use commands::{build_coordinator, run_host, show_jobs, start_daemon};
pub use tasks::IdleTasks;
