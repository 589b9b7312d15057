//! Interval-driven periodic scheduler.
//!
//! Every registered job gets its own timer task on the tokio runtime. A
//! firing never runs the action on the timer task: it enters the job's
//! [`JobGate`] and spawns the run, so a slow job never delays another job's
//! timer. `stop()` cancels the timers and leaves in-flight runs alone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    JobDescriptor, JobGate, JobRegistry, JobResult, JobStatus, JobStatusTable, SchedulerError,
};

/// Lifecycle of a scheduler instance. It only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerStatus {
    Uninitialized,
    Running,
    ShuttingDown,
    Stopped,
}

/// An armed timer for one job.
#[derive(Debug)]
struct TimerHandle {
    job_name: String,
    id: Uuid,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
struct SchedulerState {
    status: SchedulerStatus,
    timers: Vec<TimerHandle>,
    active_jobs: HashMap<String, Arc<JobGate>>,
}

/// Process-wide periodic scheduler.
///
/// Constructed explicitly and shared behind `Arc`. Whether this process owns
/// scheduling is decided once, either at construction with [`new`](Self::new)
/// or later through [`elect`](Self::elect). An unelected scheduler behaves as
/// a non-owner.
///
/// # Example
///
/// ```ignore
/// let scheduler = PeriodicScheduler::new(true);
/// let armed = scheduler.start(&registry)?;
/// // ... serve requests ...
/// scheduler.stop().await;
/// ```
#[derive(Debug)]
pub struct PeriodicScheduler {
    owns_scheduling: OnceLock<bool>,
    state: Mutex<SchedulerState>,
    statuses: Arc<JobStatusTable>,
    shutdown_token: CancellationToken,
}

impl PeriodicScheduler {
    /// A scheduler whose election is already decided.
    pub fn new(owns_scheduling: bool) -> Self {
        let scheduler = Self::unelected();
        scheduler.elect(owns_scheduling);
        scheduler
    }

    /// A scheduler waiting for [`elect`](Self::elect).
    pub fn unelected() -> Self {
        Self {
            owns_scheduling: OnceLock::new(),
            state: Mutex::new(SchedulerState {
                status: SchedulerStatus::Uninitialized,
                timers: Vec::new(),
                active_jobs: HashMap::new(),
            }),
            statuses: Arc::new(JobStatusTable::new()),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Arm one timer per registry entry and return how many were armed.
    ///
    /// Does nothing and returns 0 when this process does not own scheduling
    /// or has not been elected yet.
    /// The first firing of each job happens one interval after this call.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::AlreadyStarted` unless the scheduler is still
    ///   `Uninitialized`.
    /// - `SchedulerError::InvalidInterval` if a first firing time cannot be
    ///   represented; nothing is armed in that case.
    pub fn start(&self, registry: &JobRegistry) -> Result<usize, SchedulerError> {
        if !self.owns_scheduling() {
            info!("Worker does not own scheduling, no periodic jobs started");
            return Ok(0);
        }

        let mut state = self.lock_state();
        if state.status != SchedulerStatus::Uninitialized {
            return Err(SchedulerError::AlreadyStarted);
        }

        // Resolve every first firing before arming anything.
        let now = Instant::now();
        let first_fires = registry
            .iter()
            .map(|job| {
                now.checked_add(job.interval())
                    .ok_or_else(|| SchedulerError::InvalidInterval(job.name().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (job, first_fire) in registry.iter().zip(first_fires) {
            let gate = Arc::new(JobGate::new(job.overlap_policy()));
            self.statuses.register(job.name(), job.interval(), job.coalesce());

            let id = Uuid::new_v4();
            let handle = tokio::spawn(run_timer(
                job.clone(),
                first_fire,
                gate.clone(),
                self.statuses.clone(),
                self.shutdown_token.child_token(),
            ));

            info!(
                job = %job.name(),
                timer = %id,
                interval_secs = job.interval().as_secs(),
                coalesce = job.coalesce(),
                "Job registered"
            );

            state.active_jobs.insert(job.name().to_string(), gate);
            state.timers.push(TimerHandle {
                job_name: job.name().to_string(),
                id,
                handle,
            });
        }

        state.status = SchedulerStatus::Running;
        info!(jobs = state.timers.len(), "Scheduler started");
        Ok(state.timers.len())
    }

    /// Cancel every armed timer and wait for the timer tasks to exit.
    ///
    /// Runs already in flight keep going; no new firings are dispatched.
    /// Calling this before `start` or more than once is a no-op.
    pub async fn stop(&self) {
        let timers = {
            let mut state = self.lock_state();
            if state.status != SchedulerStatus::Running {
                debug!(status = ?state.status, "Scheduler stop ignored");
                return;
            }
            state.status = SchedulerStatus::ShuttingDown;
            // Cancel under the lock: a concurrent stop must never see
            // ShuttingDown while timers are still live.
            self.shutdown_token.cancel();
            std::mem::take(&mut state.timers)
        };

        info!(timers = timers.len(), "Initiating scheduler shutdown");

        for timer in timers {
            if let Err(e) = timer.handle.await {
                warn!(
                    job = %timer.job_name,
                    timer = %timer.id,
                    "Timer task ended abnormally: {}",
                    e
                );
            }
        }

        let mut state = self.lock_state();
        state.status = SchedulerStatus::Stopped;
        let in_flight = state.active_jobs.values().filter(|g| g.is_running()).count();
        info!(in_flight, "Scheduler shutdown complete");
    }

    /// Record the election result. Only the first call takes effect; the
    /// decision in force is returned.
    pub fn elect(&self, owns_scheduling: bool) -> bool {
        *self.owns_scheduling.get_or_init(|| owns_scheduling)
    }

    pub fn is_elected(&self) -> bool {
        self.owns_scheduling.get().is_some()
    }

    pub fn owns_scheduling(&self) -> bool {
        self.owns_scheduling.get().copied().unwrap_or(false)
    }

    pub fn status(&self) -> SchedulerStatus {
        self.lock_state().status
    }

    /// Number of timers currently armed.
    pub fn armed_timers(&self) -> usize {
        self.lock_state().timers.len()
    }

    /// Names of jobs with an armed timer, in arming order.
    pub fn armed_jobs(&self) -> Vec<String> {
        self.lock_state()
            .timers
            .iter()
            .map(|timer| timer.job_name.clone())
            .collect()
    }

    /// Whether a run of `job_name` is in flight. `false` for unknown jobs.
    pub fn is_job_running(&self, job_name: &str) -> bool {
        self.lock_state()
            .active_jobs
            .get(job_name)
            .map(|gate| gate.is_running())
            .unwrap_or(false)
    }

    pub fn job_status(&self, job_name: &str) -> Option<JobStatus> {
        self.statuses.get(job_name)
    }

    /// Status of every started job, in registration order.
    pub fn job_statuses(&self) -> Vec<JobStatus> {
        self.statuses.all()
    }

    /// Token cancelled when shutdown begins. Long-running actions may watch it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Timer loop for one job. Exits when `token` is cancelled.
async fn run_timer(
    job: JobDescriptor,
    first_fire: Instant,
    gate: Arc<JobGate>,
    statuses: Arc<JobStatusTable>,
    token: CancellationToken,
) {
    let mut ticker = interval_at(first_fire, job.interval());
    // Delay: after a stall fire once, then restart the cadence from that firing.
    ticker.set_missed_tick_behavior(if job.coalesce() {
        MissedTickBehavior::Delay
    } else {
        MissedTickBehavior::Burst
    });

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(job = %job.name(), "Timer cancelled");
                break;
            }
            _ = ticker.tick() => fire(&job, &gate, &statuses),
        }
    }
}

/// Handle one firing: skip it or spawn a run.
fn fire(job: &JobDescriptor, gate: &Arc<JobGate>, statuses: &Arc<JobStatusTable>) {
    let Some(permit) = gate.try_enter() else {
        debug!(job = %job.name(), "Previous run still active, skipping firing");
        statuses.record_skip(job.name(), "previous run still active");
        return;
    };

    statuses.record_start(job.name());
    let job = job.clone();
    let statuses = statuses.clone();

    tokio::spawn(async move {
        let _permit = permit;
        let name = job.name().to_string();
        info!(job = %name, "Job started");
        let start = Instant::now();

        // A separate task so a panicking action surfaces as a JoinError here.
        let result = match tokio::spawn(job.invoke()).await {
            Ok(Ok(())) => JobResult::Success,
            Ok(Err(e)) => {
                error!(job = %name, error = %e, "Job failed");
                JobResult::Failed(e)
            }
            Err(e) => {
                error!(job = %name, error = %e, "Job panicked");
                JobResult::Failed(format!("panicked: {}", e))
            }
        };

        let elapsed = start.elapsed();
        if result == JobResult::Success {
            info!(job = %name, duration_ms = elapsed.as_millis() as u64, "Job completed");
        }
        statuses.record_complete(&name, result, elapsed.as_millis() as u64);
    });
}
