//! Command implementations for the marz daemon.
//!
//! Handles:
//! - start: Load config, bootstrap, run periodic jobs until a shutdown signal
//! - jobs: Print the job table the current configuration would register

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

use marz_scheduler::{panel_registry, LifecycleCoordinator, PanelTasks, StartOutcome};
use marz_types::Settings;

use crate::tasks::IdleTasks;

/// Build the lifecycle coordinator for `settings` around `tasks`.
pub fn build_coordinator(
    settings: &Settings,
    tasks: Arc<dyn PanelTasks>,
) -> Result<LifecycleCoordinator> {
    let registry =
        panel_registry(tasks, &settings.tasks).context("Invalid periodic job configuration")?;
    Ok(LifecycleCoordinator::new(&settings.deployment, registry))
}

/// Run the host lifecycle: bootstrap and start jobs, wait for `shutdown`,
/// then stop the jobs.
///
/// A bootstrap failure aborts before anything is scheduled.
pub async fn run_host<F>(
    coordinator: &LifecycleCoordinator,
    tasks: Arc<dyn PanelTasks>,
    shutdown: F,
) -> Result<StartOutcome>
where
    F: Future<Output = ()>,
{
    let outcome = coordinator
        .on_service_start(|| async move { tasks.nodes_startup().await })
        .await
        .context("Startup bootstrap failed")?;

    match outcome {
        StartOutcome::Scheduling { jobs } => info!(jobs, "Task host ready"),
        StartOutcome::ElectedOut => info!("Task host ready (periodic jobs owned by another worker)"),
    }

    shutdown.await;

    coordinator.on_service_stop().await;
    Ok(outcome)
}

/// Start the task host.
///
/// 1. Load configuration (defaults -> file -> env -> CLI)
/// 2. Initialize logging
/// 3. Bootstrap and start periodic jobs
/// 4. Stop jobs on SIGINT/SIGTERM
pub async fn start_daemon(
    config_path: Option<&str>,
    worker_id_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<()> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(worker_id) = worker_id_override {
        settings.deployment.worker_id = Some(worker_id.to_string());
    }
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Marz task host starting...");
    info!("Configuration:");
    info!(
        "  Worker id: {}",
        settings.deployment.worker_id.as_deref().unwrap_or("<unset>")
    );
    info!("  Log level: {}", settings.log_level);

    let tasks: Arc<dyn PanelTasks> = Arc::new(IdleTasks);
    let coordinator = build_coordinator(&settings, tasks.clone())?;

    run_host(&coordinator, tasks, shutdown_signal()).await?;
    info!("Marz task host stopped");
    Ok(())
}

/// Print the periodic jobs resolved from configuration.
pub fn show_jobs(config_path: Option<&str>) -> Result<()> {
    let settings = Settings::load(config_path).context("Failed to load configuration")?;
    let registry = panel_registry(Arc::new(IdleTasks), &settings.tasks)
        .context("Invalid periodic job configuration")?;

    println!("{:<24} {:>10}  {}", "JOB", "INTERVAL", "COALESCE");
    for job in registry.iter() {
        println!(
            "{:<24} {:>9}s  {}",
            job.name(),
            job.interval().as_secs(),
            job.coalesce()
        );
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
