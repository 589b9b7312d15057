//! Job wiring for the panel's periodic tasks.
//!
//! The job bodies live behind the [`PanelTasks`] trait; this module only
//! decides names, order, cadence and concurrency policy.
//!
//! # Available Jobs
//!
//! - **record_user_usages**: pull traffic counters from nodes
//! - **review_users**: enforce limits and expiry on user accounts
//! - **expire_days_reached**: sweep users whose validity period ended
//! - **reset_user_data_usage**: reset usage for users on periodic plans
//!
//! `nodes_startup` is not periodic; it is the bootstrap run before any of the
//! above are armed.

pub mod panel;

pub use panel::{
    panel_registry, PanelTasks, EXPIRE_DAYS_REACHED, RECORD_USER_USAGES, RESET_USER_DATA_USAGE,
    REVIEW_USERS,
};
