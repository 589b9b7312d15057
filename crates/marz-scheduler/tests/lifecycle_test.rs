//! Host lifecycle: bootstrap, election, panel jobs, shutdown.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use marz_scheduler::jobs::{EXPIRE_DAYS_REACHED, RECORD_USER_USAGES, REVIEW_USERS};
use marz_scheduler::{
    panel_registry, LifecycleCoordinator, PanelTasks, SchedulerError, SchedulerStatus,
    StartOutcome, WorkerElector,
};
use marz_types::{DeploymentConfig, TaskIntervals};

#[derive(Default)]
struct FakePanel {
    fail_startup: bool,
    nodes_online: AtomicBool,
    usages: AtomicU32,
    reviews: AtomicU32,
    expiries: AtomicU32,
    resets: AtomicU32,
    periodic_before_startup: AtomicBool,
}

impl FakePanel {
    fn tick(&self, counter: &AtomicU32) -> Result<(), String> {
        if !self.nodes_online.load(Ordering::SeqCst) {
            self.periodic_before_startup.store(true, Ordering::SeqCst);
        }
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl PanelTasks for FakePanel {
    async fn nodes_startup(&self) -> Result<(), String> {
        tokio::time::sleep(Duration::from_secs(3)).await;
        if self.fail_startup {
            return Err("failed to connect to node 1".to_string());
        }
        self.nodes_online.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn record_user_usages(&self) -> Result<(), String> {
        self.tick(&self.usages)
    }

    async fn review_users(&self) -> Result<(), String> {
        self.tick(&self.reviews)?;
        Err("user table locked".to_string())
    }

    async fn expire_days_reached(&self) -> Result<(), String> {
        self.tick(&self.expiries)
    }

    async fn reset_user_data_usage(&self) -> Result<(), String> {
        self.tick(&self.resets)
    }
}

fn intervals() -> TaskIntervals {
    TaskIntervals {
        record_user_usages_interval: 2,
        review_users_interval: 3,
        expire_days_reached_interval: 5,
        reset_user_data_usage_interval: 60,
    }
}

fn coordinator(panel: Arc<FakePanel>, worker_id: Option<&str>) -> LifecycleCoordinator {
    let registry = panel_registry(panel, &intervals()).unwrap();
    LifecycleCoordinator::new(
        &DeploymentConfig::new(worker_id.map(str::to_string)),
        registry,
    )
}

#[tokio::test(start_paused = true)]
async fn primary_worker_runs_panel_jobs_after_bootstrap() {
    let panel = Arc::new(FakePanel::default());
    let coordinator = coordinator(panel.clone(), None);

    let tasks = panel.clone();
    let outcome = coordinator
        .on_service_start(|| async move { tasks.nodes_startup().await })
        .await
        .unwrap();
    assert_eq!(outcome, StartOutcome::Scheduling { jobs: 4 });
    assert!(panel.nodes_online.load(Ordering::SeqCst));

    tokio::time::sleep(Duration::from_millis(10_500)).await;

    assert!(!panel.periodic_before_startup.load(Ordering::SeqCst));
    assert_eq!(panel.usages.load(Ordering::SeqCst), 5);
    assert_eq!(panel.reviews.load(Ordering::SeqCst), 3);
    assert_eq!(panel.expiries.load(Ordering::SeqCst), 2);
    assert_eq!(panel.resets.load(Ordering::SeqCst), 0);

    // Failing job keeps its cadence.
    let scheduler = coordinator.scheduler();
    let review = scheduler.job_status(REVIEW_USERS).unwrap();
    assert_eq!(review.run_count, 3);
    assert_eq!(review.error_count, 3);
    assert_eq!(scheduler.job_status(RECORD_USER_USAGES).unwrap().error_count, 0);

    let names: Vec<_> = scheduler
        .job_statuses()
        .into_iter()
        .map(|s| s.job_name)
        .collect();
    assert_eq!(names.len(), 4);
    assert_eq!(names[2], EXPIRE_DAYS_REACHED);

    coordinator.on_service_stop().await;
    assert_eq!(scheduler.status(), SchedulerStatus::Stopped);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(panel.usages.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn bootstrap_failure_arms_no_timers() {
    let panel = Arc::new(FakePanel {
        fail_startup: true,
        ..Default::default()
    });
    let coordinator = coordinator(panel.clone(), Some("0"));

    let tasks = panel.clone();
    let result = coordinator
        .on_service_start(|| async move { tasks.nodes_startup().await })
        .await;

    match result {
        Err(SchedulerError::Bootstrap(msg)) => assert!(msg.contains("node 1")),
        other => panic!("Expected Bootstrap error, got {:?}", other),
    }
    assert_eq!(coordinator.scheduler().armed_timers(), 0);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(panel.usages.load(Ordering::SeqCst), 0);
    assert_eq!(panel.reviews.load(Ordering::SeqCst), 0);

    coordinator.on_service_stop().await;
}

#[tokio::test(start_paused = true)]
async fn secondary_worker_schedules_nothing() {
    let panel = Arc::new(FakePanel::default());
    let coordinator = coordinator(panel.clone(), Some("1"));

    let tasks = panel.clone();
    let outcome = coordinator
        .on_service_start(|| async move { tasks.nodes_startup().await })
        .await
        .unwrap();

    assert_eq!(outcome, StartOutcome::ElectedOut);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(panel.usages.load(Ordering::SeqCst), 0);

    coordinator.on_service_stop().await;
    coordinator.on_service_stop().await;
}

#[test]
fn elector_truth_table() {
    let elect = |id: Option<&str>| {
        WorkerElector::new(&DeploymentConfig::new(id.map(str::to_string))).should_own_scheduling()
    };
    assert!(elect(None));
    assert!(elect(Some("0")));
    assert!(elect(Some("")));
    assert!(!elect(Some("1")));
    assert!(!elect(Some("00")));
    assert!(!elect(Some(" 0")));
}
