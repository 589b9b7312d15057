//! # marz-types
//!
//! Shared configuration types for the marz task host.
//!
//! - `Settings`: layered application configuration
//! - `TaskIntervals`: cadence of the periodic panel jobs
//! - `DeploymentConfig`: worker identity used for scheduler election

pub mod config;
pub mod error;

pub use config::{DeploymentConfig, Settings, TaskIntervals, WORKER_ID_ENV};
pub use error::ConfigError;
