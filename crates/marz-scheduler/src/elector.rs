//! Single-worker election.
//!
//! When the host runs as several identical workers under one supervisor, only
//! the primary worker drives periodic jobs. Every other worker still serves
//! requests but schedules nothing.

use tracing::warn;

use marz_types::DeploymentConfig;

/// Worker identity token that owns scheduling.
pub const PRIMARY_WORKER_ID: &str = "0";

/// Decides whether this process owns the shared scheduler.
#[derive(Debug, Clone, Default)]
pub struct WorkerElector {
    worker_id: Option<String>,
}

impl WorkerElector {
    pub fn new(deployment: &DeploymentConfig) -> Self {
        Self {
            worker_id: deployment.worker_id.clone(),
        }
    }

    /// `true` when the token is absent, empty, or exactly `"0"`.
    ///
    /// The token is compared verbatim: `"00"`, `" 0"` or `" "` do not own.
    /// Tokens that are not worker indices are treated as "not the owner".
    pub fn should_own_scheduling(&self) -> bool {
        match self.worker_id.as_deref() {
            None | Some("") | Some(PRIMARY_WORKER_ID) => true,
            Some(token) => {
                if token.parse::<u32>().is_err() {
                    warn!(worker_id = %token, "Unparseable worker id, not owning scheduling");
                }
                false
            }
        }
    }

    pub fn worker_id(&self) -> Option<&str> {
        self.worker_id.as_deref()
    }
}
