//! Job descriptors and the ordered registry handed to the scheduler.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::{OverlapPolicy, SchedulerError};

/// Boxed future produced by one invocation of a job action.
pub type JobFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;

/// Shared, type-erased job action.
pub type JobAction = Arc<dyn Fn() -> JobFuture + Send + Sync>;

/// Longest accepted interval (30 years).
pub const MAX_INTERVAL: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// A named periodic job.
///
/// Defaults match the panel jobs: coalesce missed ticks and never run two
/// instances at once.
#[derive(Clone)]
pub struct JobDescriptor {
    name: String,
    interval: Duration,
    coalesce: bool,
    overlap: OverlapPolicy,
    action: JobAction,
}

impl JobDescriptor {
    /// Create a descriptor that runs `action` every `interval`.
    pub fn new<F, Fut>(name: impl Into<String>, interval: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            interval,
            coalesce: true,
            overlap: OverlapPolicy::Skip,
            action: Arc::new(move || Box::pin(action()) as JobFuture),
        }
    }

    /// Collapse missed ticks into one catch-up run (`true`) or replay each
    /// missed tick (`false`).
    pub fn with_coalesce(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }

    pub fn with_overlap_policy(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn coalesce(&self) -> bool {
        self.coalesce
    }

    pub fn overlap_policy(&self) -> OverlapPolicy {
        self.overlap
    }

    /// Start one invocation of the action.
    pub(crate) fn invoke(&self) -> JobFuture {
        (self.action)()
    }

    fn validate(&self) -> Result<(), SchedulerError> {
        if self.name.trim().is_empty() {
            return Err(SchedulerError::InvalidJob("job name is empty".to_string()));
        }
        if self.interval.is_zero() || self.interval > MAX_INTERVAL {
            return Err(SchedulerError::InvalidInterval(self.name.clone()));
        }
        Ok(())
    }
}

impl fmt::Debug for JobDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDescriptor")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("coalesce", &self.coalesce)
            .field("overlap", &self.overlap)
            .finish_non_exhaustive()
    }
}

/// Ordered set of job descriptors.
///
/// Registration order is preserved and is the order timers get armed in.
/// Invalid descriptors are rejected at registration so a bad registry never
/// reaches the scheduler.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use marz_scheduler::{JobDescriptor, JobRegistry};
///
/// let mut registry = JobRegistry::new();
/// registry
///     .register(JobDescriptor::new("review_users", Duration::from_secs(30), || async { Ok(()) }))
///     .unwrap();
///
/// let dup = JobDescriptor::new("review_users", Duration::from_secs(60), || async { Ok(()) });
/// assert!(registry.register(dup).is_err());
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Vec<JobDescriptor>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job to the end of the registry.
    ///
    /// # Errors
    ///
    /// - `DuplicateJob` if the name is already taken
    /// - `InvalidInterval` if the interval is zero or above [`MAX_INTERVAL`]
    /// - `InvalidJob` if the name is empty
    pub fn register(&mut self, job: JobDescriptor) -> Result<(), SchedulerError> {
        job.validate()?;
        if self.contains(job.name()) {
            return Err(SchedulerError::DuplicateJob(job.name().to_string()));
        }
        self.jobs.push(job);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_job(mut self, job: JobDescriptor) -> Result<Self, SchedulerError> {
        self.register(job)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&JobDescriptor> {
        self.jobs.iter().find(|job| job.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobDescriptor> {
        self.jobs.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.jobs.iter().map(JobDescriptor::name).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Append without validation, to exercise the scheduler's own checks.
    #[cfg(test)]
    pub(crate) fn push_unchecked(&mut self, job: JobDescriptor) {
        self.jobs.push(job);
    }
}
