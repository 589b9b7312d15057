//! Periodic job scheduler for the marz task host.
//!
//! Brings a fixed set of recurring background jobs online once per process,
//! lets only one worker of a multi-worker deployment drive them, never runs
//! two instances of the same job at once, and tears the timers down when the
//! host stops serving.
//!
//! # Features
//!
//! - Interval timers on the tokio runtime, first firing one interval after start
//! - Coalescing of missed ticks into a single catch-up run
//! - Overlap policy (skip/concurrent) enforced with an atomic per-job gate
//! - Single-worker election from the worker identity token
//! - Lifecycle binding: bootstrap, then start; stop on shutdown
//! - Job status observability via `JobStatusTable`
//!
//! # Example
//!
//! ```ignore
//! use marz_scheduler::{panel_registry, LifecycleCoordinator};
//!
//! let registry = panel_registry(tasks.clone(), &settings.tasks)?;
//! let coordinator = LifecycleCoordinator::new(&settings.deployment, registry);
//!
//! coordinator.on_service_start(|| tasks.nodes_startup()).await?;
//! // ... serve requests ...
//! coordinator.on_service_stop().await;
//! ```

mod elector;
mod error;
mod lifecycle;
mod overlap;
mod registry;
mod scheduler;
mod status;

pub mod jobs;

pub use elector::{WorkerElector, PRIMARY_WORKER_ID};
pub use error::SchedulerError;
pub use jobs::{panel_registry, PanelTasks};
pub use lifecycle::{LifecycleCoordinator, StartOutcome};
pub use overlap::{JobGate, OverlapPolicy, RunPermit};
pub use registry::{JobAction, JobDescriptor, JobFuture, JobRegistry, MAX_INTERVAL};
pub use scheduler::{PeriodicScheduler, SchedulerStatus};
pub use status::{JobResult, JobStatus, JobStatusTable};
