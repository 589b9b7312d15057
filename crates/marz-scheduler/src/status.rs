//! Per-job execution status.
//!
//! The `JobStatusTable` records what each job did: how often it ran, failed
//! and was skipped, and how the last attempt ended. It is observational only;
//! the overlap decision is made by [`JobGate`](crate::JobGate).

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a job firing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobResult {
    /// Action returned `Ok`
    Success,
    /// Action returned an error or panicked
    Failed(String),
    /// Firing was dropped because a previous run was still active
    Skipped(String),
}

/// Status of a scheduled job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    /// Name of the job
    pub job_name: String,
    /// Seconds between firings
    pub interval_secs: u64,
    /// Whether missed ticks are coalesced
    pub coalesce: bool,
    /// When the last run started
    pub last_run: Option<DateTime<Utc>>,
    /// Duration of the last completed run in milliseconds
    pub last_duration_ms: Option<u64>,
    /// Outcome of the last firing
    pub last_result: Option<JobResult>,
    /// Completed runs, successful or not
    pub run_count: u64,
    /// Failed runs
    pub error_count: u64,
    /// Firings dropped by the overlap policy
    pub skip_count: u64,
    /// Whether a run is in flight
    pub is_running: bool,
}

impl JobStatus {
    pub fn new(job_name: String, interval: Duration, coalesce: bool) -> Self {
        Self {
            job_name,
            interval_secs: interval.as_secs(),
            coalesce,
            last_run: None,
            last_duration_ms: None,
            last_result: None,
            run_count: 0,
            error_count: 0,
            skip_count: 0,
            is_running: false,
        }
    }
}

/// Thread-safe table of job statuses, in registration order.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use marz_scheduler::{JobResult, JobStatusTable};
///
/// let table = JobStatusTable::new();
/// table.register("review_users", Duration::from_secs(30), true);
///
/// table.record_start("review_users");
/// assert!(table.is_running("review_users"));
///
/// table.record_complete("review_users", JobResult::Success, 120);
/// assert!(!table.is_running("review_users"));
/// assert_eq!(table.get("review_users").unwrap().run_count, 1);
/// ```
#[derive(Debug, Default)]
pub struct JobStatusTable {
    jobs: RwLock<Vec<JobStatus>>,
}

impl JobStatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job. Re-registering a name resets its status.
    pub fn register(&self, job_name: &str, interval: Duration, coalesce: bool) {
        let status = JobStatus::new(job_name.to_string(), interval, coalesce);
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        match jobs.iter_mut().find(|s| s.job_name == job_name) {
            Some(existing) => *existing = status,
            None => jobs.push(status),
        }
    }

    pub fn record_start(&self, job_name: &str) {
        self.update(job_name, |status| {
            status.is_running = true;
            status.last_run = Some(Utc::now());
        });
    }

    /// Record the end of a run. A `Skipped` result is counted as a skip.
    pub fn record_complete(&self, job_name: &str, result: JobResult, duration_ms: u64) {
        if let JobResult::Skipped(reason) = result {
            self.record_skip(job_name, reason);
            return;
        }
        self.update(job_name, |status| {
            status.is_running = false;
            status.last_duration_ms = Some(duration_ms);
            status.run_count += 1;
            if matches!(result, JobResult::Failed(_)) {
                status.error_count += 1;
            }
            status.last_result = Some(result);
        });
    }

    /// Record a firing dropped by the overlap policy. The running flag is left alone.
    pub fn record_skip(&self, job_name: &str, reason: impl Into<String>) {
        let reason = reason.into();
        self.update(job_name, |status| {
            status.skip_count += 1;
            status.last_result = Some(JobResult::Skipped(reason));
        });
    }

    pub fn get(&self, job_name: &str) -> Option<JobStatus> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.job_name == job_name)
            .cloned()
    }

    pub fn all(&self) -> Vec<JobStatus> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns `false` for unknown jobs.
    pub fn is_running(&self, job_name: &str) -> bool {
        self.get(job_name).map(|s| s.is_running).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update(&self, job_name: &str, apply: impl FnOnce(&mut JobStatus)) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(status) = jobs.iter_mut().find(|s| s.job_name == job_name) {
            apply(status);
        }
    }
}
