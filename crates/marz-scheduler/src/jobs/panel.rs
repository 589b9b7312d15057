//! Panel task registry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use marz_types::TaskIntervals;

use crate::{JobDescriptor, JobRegistry, OverlapPolicy, SchedulerError};

pub const RECORD_USER_USAGES: &str = "record_user_usages";
pub const REVIEW_USERS: &str = "review_users";
pub const EXPIRE_DAYS_REACHED: &str = "expire_days_reached";
pub const RESET_USER_DATA_USAGE: &str = "reset_user_data_usage";

/// Job bodies supplied by the host service.
///
/// Each periodic method may be skipped when its previous run overlaps, so
/// implementations must tolerate missed invocations.
#[async_trait]
pub trait PanelTasks: Send + Sync {
    /// Bring managed nodes online. Runs once, before any periodic job.
    async fn nodes_startup(&self) -> Result<(), String>;

    async fn record_user_usages(&self) -> Result<(), String>;

    async fn review_users(&self) -> Result<(), String>;

    async fn expire_days_reached(&self) -> Result<(), String>;

    async fn reset_user_data_usage(&self) -> Result<(), String>;
}

/// Build the registry of the four periodic panel jobs.
///
/// All jobs coalesce missed ticks and never overlap with themselves.
///
/// # Errors
///
/// Returns `SchedulerError::InvalidInterval` if any interval is zero.
pub fn panel_registry(
    tasks: Arc<dyn PanelTasks>,
    intervals: &TaskIntervals,
) -> Result<JobRegistry, SchedulerError> {
    let mut registry = JobRegistry::new();

    registry.register(panel_job(
        RECORD_USER_USAGES,
        intervals.record_user_usages(),
        tasks.clone(),
        |tasks| async move { tasks.record_user_usages().await },
    ))?;
    registry.register(panel_job(
        REVIEW_USERS,
        intervals.review_users(),
        tasks.clone(),
        |tasks| async move { tasks.review_users().await },
    ))?;
    registry.register(panel_job(
        EXPIRE_DAYS_REACHED,
        intervals.expire_days_reached(),
        tasks.clone(),
        |tasks| async move { tasks.expire_days_reached().await },
    ))?;
    registry.register(panel_job(
        RESET_USER_DATA_USAGE,
        intervals.reset_user_data_usage(),
        tasks,
        |tasks| async move { tasks.reset_user_data_usage().await },
    ))?;

    info!(jobs = registry.len(), "Built panel job registry");
    Ok(registry)
}

fn panel_job<F, Fut>(
    name: &str,
    interval: Duration,
    tasks: Arc<dyn PanelTasks>,
    body: F,
) -> JobDescriptor
where
    F: Fn(Arc<dyn PanelTasks>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<(), String>> + Send + 'static,
{
    JobDescriptor::new(name, interval, move || body(tasks.clone()))
        .with_coalesce(true)
        .with_overlap_policy(OverlapPolicy::Skip)
}
