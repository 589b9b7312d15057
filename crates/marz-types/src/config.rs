//! Configuration loading for the marz task host.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `<config dir>/marz/config.toml`.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable the process supervisor sets to identify a worker.
pub const WORKER_ID_ENV: &str = "WORKER_ID";

/// Cadence of the periodic panel jobs, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskIntervals {
    /// Seconds between usage recording runs.
    #[serde(default = "default_record_user_usages_interval")]
    pub record_user_usages_interval: u64,

    /// Seconds between user review runs.
    #[serde(default = "default_review_users_interval")]
    pub review_users_interval: u64,

    /// Seconds between expiry sweeps.
    #[serde(default = "default_expire_days_reached_interval")]
    pub expire_days_reached_interval: u64,

    /// Seconds between data-usage reset runs.
    #[serde(default = "default_reset_user_data_usage_interval")]
    pub reset_user_data_usage_interval: u64,
}

fn default_record_user_usages_interval() -> u64 {
    30
}

fn default_review_users_interval() -> u64 {
    30
}

fn default_expire_days_reached_interval() -> u64 {
    1800
}

fn default_reset_user_data_usage_interval() -> u64 {
    3600
}

impl Default for TaskIntervals {
    fn default() -> Self {
        Self {
            record_user_usages_interval: default_record_user_usages_interval(),
            review_users_interval: default_review_users_interval(),
            expire_days_reached_interval: default_expire_days_reached_interval(),
            reset_user_data_usage_interval: default_reset_user_data_usage_interval(),
        }
    }
}

impl TaskIntervals {
    /// Reject zero intervals.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let entries = [
            ("tasks.record_user_usages_interval", self.record_user_usages_interval),
            ("tasks.review_users_interval", self.review_users_interval),
            ("tasks.expire_days_reached_interval", self.expire_days_reached_interval),
            (
                "tasks.reset_user_data_usage_interval",
                self.reset_user_data_usage_interval,
            ),
        ];
        for (key, secs) in entries {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    reason: "interval must be > 0 seconds".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn record_user_usages(&self) -> Duration {
        Duration::from_secs(self.record_user_usages_interval)
    }

    pub fn review_users(&self) -> Duration {
        Duration::from_secs(self.review_users_interval)
    }

    pub fn expire_days_reached(&self) -> Duration {
        Duration::from_secs(self.expire_days_reached_interval)
    }

    pub fn reset_user_data_usage(&self) -> Duration {
        Duration::from_secs(self.reset_user_data_usage_interval)
    }
}

/// Identity of this process within a multi-worker deployment.
///
/// Built once at startup and handed to the worker elector; nothing reads the
/// environment after that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Worker identity token assigned by the process supervisor.
    #[serde(default)]
    pub worker_id: Option<String>,
}

impl DeploymentConfig {
    pub fn new(worker_id: Option<String>) -> Self {
        Self { worker_id }
    }

    /// Read the token from `WORKER_ID`.
    pub fn from_env() -> Self {
        Self::new(std::env::var(WORKER_ID_ENV).ok())
    }

    /// Keep an explicit token, otherwise fall back to `WORKER_ID`.
    pub fn or_env(self) -> Self {
        if self.worker_id.is_some() {
            self
        } else {
            Self::from_env()
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Periodic job cadence
    #[serde(default)]
    pub tasks: TaskIntervals,

    /// Worker identity
    #[serde(default)]
    pub deployment: DeploymentConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            tasks: TaskIntervals::default(),
            deployment: DeploymentConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Default config file (`<config dir>/marz/config.toml`)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (`MARZ__*`, e.g. `MARZ__TASKS__REVIEW_USERS_INTERVAL`)
    ///
    /// A worker id left unset by every layer falls back to `WORKER_ID`.
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from("", "", "marz")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let default_config_path = config_dir.join("config");

        let defaults = TaskIntervals::default();
        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())?
            .set_default(
                "tasks.record_user_usages_interval",
                defaults.record_user_usages_interval as i64,
            )?
            .set_default(
                "tasks.review_users_interval",
                defaults.review_users_interval as i64,
            )?
            .set_default(
                "tasks.expire_days_reached_interval",
                defaults.expire_days_reached_interval as i64,
            )?
            .set_default(
                "tasks.reset_user_data_usage_interval",
                defaults.reset_user_data_usage_interval as i64,
            )?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("MARZ")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.tasks.validate()?;
        settings.deployment = settings.deployment.or_env();
        Ok(settings)
    }
}
