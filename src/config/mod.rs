//! # Sellerbot Configuration
//!
//! Typed configuration for the orchestration core. Every section has
//! defaults, so a missing file or a partial file is valid; `validate`
//! rejects values the runner cannot work with.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sellerbot_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let attempts = manager.config().execution.max_attempts;
//! let timeout = manager.config().execution.unit_timeout();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::JobType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/sellerbot.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SellerbotConfig {
    /// Unit execution limits
    pub execution: ExecutionConfig,

    /// Retry backoff for transient collaborator failures
    pub backoff: BackoffConfig,

    /// Alert retention
    pub alerts: AlertsConfig,

    /// Durable store selection
    pub persistence: PersistenceConfig,

    /// Per-job-type policies
    pub jobs: JobPoliciesConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Bounded wait for one collaborator call
    pub unit_timeout_ms: u64,
    /// Attempts per unit before a transient failure becomes a per-item failure
    pub max_attempts: u32,
    /// Capacity of the orchestrator's command inbox
    pub command_buffer: usize,
}

impl ExecutionConfig {
    pub fn unit_timeout(&self) -> Duration {
        Duration::from_millis(self.unit_timeout_ms)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            unit_timeout_ms: 30_000,
            max_attempts: 3,
            command_buffer: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 500,
            max_backoff_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub max_retained: usize,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self { max_retained: 200 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub backend: PersistenceBackend,
    /// Location of the file backend's JSON document
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobPolicy {
    /// Resume a job that was running when the process was suspended
    pub auto_resume_on_restart: bool,
}

impl Default for JobPolicy {
    fn default() -> Self {
        Self {
            auto_resume_on_restart: false,
        }
    }
}

impl JobPolicy {
    pub fn auto_resume() -> Self {
        Self {
            auto_resume_on_restart: true,
        }
    }
}

/// Monitoring jobs only read listings and auto-resume; jobs that mutate
/// seller data wait for the operator after a restart.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobPoliciesConfig {
    pub monitor: JobPolicy,
    pub tracker: JobPolicy,
    pub sku_backfill: JobPolicy,
    pub csv_import: JobPolicy,
    pub boost_scheduler: JobPolicy,
    pub auto_order: JobPolicy,
}

impl Default for JobPoliciesConfig {
    fn default() -> Self {
        Self {
            monitor: JobPolicy::auto_resume(),
            tracker: JobPolicy::auto_resume(),
            sku_backfill: JobPolicy::default(),
            csv_import: JobPolicy::default(),
            boost_scheduler: JobPolicy::default(),
            auto_order: JobPolicy::default(),
        }
    }
}

impl JobPoliciesConfig {
    pub fn policy(&self, job_type: JobType) -> JobPolicy {
        match job_type {
            JobType::Monitor => self.monitor,
            JobType::Tracker => self.tracker,
            JobType::SkuBackfill => self.sku_backfill,
            JobType::CsvImport => self.csv_import,
            JobType::BoostScheduler => self.boost_scheduler,
            JobType::AutoOrder => self.auto_order,
        }
    }

    pub fn policy_mut(&mut self, job_type: JobType) -> &mut JobPolicy {
        match job_type {
            JobType::Monitor => &mut self.monitor,
            JobType::Tracker => &mut self.tracker,
            JobType::SkuBackfill => &mut self.sku_backfill,
            JobType::CsvImport => &mut self.csv_import,
            JobType::BoostScheduler => &mut self.boost_scheduler,
            JobType::AutoOrder => &mut self.auto_order,
        }
    }
}

impl SellerbotConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.execution.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "execution.max_attempts",
                0,
                "at least one attempt per unit is required",
            ));
        }

        if self.execution.unit_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "execution.unit_timeout_ms",
                0,
                "unit timeout must be greater than 0",
            ));
        }

        if self.execution.command_buffer == 0 {
            return Err(ConfigurationError::invalid_value(
                "execution.command_buffer",
                0,
                "command buffer must be greater than 0",
            ));
        }

        if !(self.backoff.backoff_multiplier >= 1.0) {
            return Err(ConfigurationError::invalid_value(
                "backoff.backoff_multiplier",
                self.backoff.backoff_multiplier,
                "multiplier must be at least 1.0",
            ));
        }

        if self.backoff.max_backoff_ms < self.backoff.initial_backoff_ms {
            return Err(ConfigurationError::invalid_value(
                "backoff.max_backoff_ms",
                self.backoff.max_backoff_ms,
                "max backoff must not be smaller than the initial backoff",
            ));
        }

        if self.persistence.backend == PersistenceBackend::File && self.persistence.path.is_none() {
            return Err(ConfigurationError::missing_required_field(
                "persistence.path",
                "file persistence backend",
            ));
        }

        Ok(())
    }
}
