//! Idle task backend.
//!
//! Stands in for the panel's real job bodies: every task just logs that it
//! ran. Lets the host be started and its schedule observed on its own.

use async_trait::async_trait;
use tracing::info;

use marz_scheduler::PanelTasks;

#[derive(Debug, Default, Clone, Copy)]
pub struct IdleTasks;

#[async_trait]
impl PanelTasks for IdleTasks {
    async fn nodes_startup(&self) -> Result<(), String> {
        info!("No nodes configured, startup is a no-op");
        Ok(())
    }

    async fn record_user_usages(&self) -> Result<(), String> {
        info!(task = "record_user_usages", "Idle task ran");
        Ok(())
    }

    async fn review_users(&self) -> Result<(), String> {
        info!(task = "review_users", "Idle task ran");
        Ok(())
    }

    async fn expire_days_reached(&self) -> Result<(), String> {
        info!(task = "expire_days_reached", "Idle task ran");
        Ok(())
    }

    async fn reset_user_data_usage(&self) -> Result<(), String> {
        info!(task = "reset_user_data_usage", "Idle task ran");
        Ok(())
    }
}
