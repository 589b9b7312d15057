//! Error types for the scheduler crate.
//!
//! Covers registry validation, scheduler lifecycle misuse, and bootstrap
//! failures surfaced to the host service.

use thiserror::Error;

/// Errors that can occur during scheduler operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A job with this name is already registered
    #[error("Duplicate job name: {0}")]
    DuplicateJob(String),

    /// Job interval is zero or too large to schedule
    #[error("Invalid interval for job {0}: must be > 0 and at most 30 years")]
    InvalidInterval(String),

    /// Job descriptor is malformed (e.g. empty name)
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// `start` was called on a scheduler that already left `Uninitialized`
    #[error("Scheduler has already been started")]
    AlreadyStarted,

    /// One-shot startup work failed; periodic jobs were not started
    #[error("Bootstrap failed: {0}")]
    Bootstrap(String),
}
