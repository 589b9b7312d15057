//! Binding between host service lifecycle events and the scheduler.

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info};

use marz_types::DeploymentConfig;

use crate::{JobRegistry, PeriodicScheduler, SchedulerError, WorkerElector};

/// What `on_service_start` did once bootstrap succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// This worker drives the scheduler; `jobs` timers were armed.
    Scheduling { jobs: usize },
    /// Another worker owns scheduling; no timers were armed.
    ElectedOut,
}

/// Starts the scheduler after bootstrap work and stops it on shutdown.
///
/// The host calls [`on_service_start`](Self::on_service_start) once before it
/// accepts requests and [`on_service_stop`](Self::on_service_stop) once while
/// shutting down.
#[derive(Debug)]
pub struct LifecycleCoordinator {
    elector: WorkerElector,
    scheduler: Arc<PeriodicScheduler>,
    registry: JobRegistry,
}

impl LifecycleCoordinator {
    /// Build a coordinator for this process.
    ///
    /// The worker election is made from `deployment` once bootstrap succeeds.
    pub fn new(deployment: &DeploymentConfig, registry: JobRegistry) -> Self {
        Self::with_scheduler(
            WorkerElector::new(deployment),
            Arc::new(PeriodicScheduler::unelected()),
            registry,
        )
    }

    /// Build around an existing scheduler. A scheduler that is already
    /// elected keeps its decision.
    pub fn with_scheduler(
        elector: WorkerElector,
        scheduler: Arc<PeriodicScheduler>,
        registry: JobRegistry,
    ) -> Self {
        Self {
            elector,
            scheduler,
            registry,
        }
    }

    /// Run `bootstrap` to completion, then hold the worker election and start
    /// periodic jobs if this worker wins it.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::Bootstrap` if `bootstrap` fails. The scheduler is
    ///   not started and the caller decides whether to abort startup.
    /// - `SchedulerError::AlreadyStarted` if called a second time.
    pub async fn on_service_start<B, Fut>(
        &self,
        bootstrap: B,
    ) -> Result<StartOutcome, SchedulerError>
    where
        B: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        info!("Running startup bootstrap");
        if let Err(e) = bootstrap().await {
            error!(error = %e, "Startup bootstrap failed, periodic jobs not started");
            return Err(SchedulerError::Bootstrap(e));
        }

        let owns = self.scheduler.elect(self.elector.should_own_scheduling());
        info!(
            worker_id = self.elector.worker_id().unwrap_or("<unset>"),
            owns_scheduling = owns,
            "Worker election complete"
        );

        if !owns {
            info!("Periodic jobs are driven by another worker");
            return Ok(StartOutcome::ElectedOut);
        }

        let jobs = self.scheduler.start(&self.registry)?;
        Ok(StartOutcome::Scheduling { jobs })
    }

    /// Stop the scheduler. Safe to call whether or not it was started.
    pub async fn on_service_stop(&self) {
        info!("Service stopping, cancelling periodic jobs");
        self.scheduler.stop().await;
    }

    /// Handle to the scheduler for status queries.
    pub fn scheduler(&self) -> Arc<PeriodicScheduler> {
        self.scheduler.clone()
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }
}
