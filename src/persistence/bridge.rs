//! # Persistence Bridge
//!
//! The orchestrator's only write path for job state. Each job type has one
//! durable snapshot (last write wins, no history), plus the settings and
//! alerts namespaces the UI reads through `GET_*` messages.
//!
//! Keys are `job:<job_type>`, `settings:<job_type>` and `alerts:<job_type>`.

use super::errors::{PersistenceError, PersistenceResult};
use super::store::KeyValueStore;
use crate::constants::{storage, JobType};
use crate::models::{Alert, Job, JobSettings};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn KeyValueStore>,
    max_alerts: usize,
}

impl std::fmt::Debug for PersistenceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceBridge")
            .field("max_alerts", &self.max_alerts)
            .finish_non_exhaustive()
    }
}

pub fn job_key(job_type: JobType) -> String {
    format!("{}{}", storage::JOB_PREFIX, job_type.as_str())
}

pub fn settings_key(job_type: JobType) -> String {
    format!("{}{}", storage::SETTINGS_PREFIX, job_type.as_str())
}

pub fn alerts_key(job_type: JobType) -> String {
    format!("{}{}", storage::ALERTS_PREFIX, job_type.as_str())
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn KeyValueStore>, max_alerts: usize) -> Self {
        Self { store, max_alerts }
    }

    /// Write a full job snapshot, replacing the previous one
    pub async fn save(&self, job: &Job) -> PersistenceResult<()> {
        let value = serde_json::to_value(job)?;
        self.store.set(&job_key(job.job_type), value).await
    }

    pub async fn load(&self, job_type: JobType) -> PersistenceResult<Option<Job>> {
        self.read(&job_key(job_type)).await
    }

    pub async fn clear(&self, job_type: JobType) -> PersistenceResult<()> {
        self.store.remove(&job_key(job_type)).await
    }

    /// Every readable job snapshot
    ///
    /// A corrupt or mislabelled snapshot is logged and skipped so one bad
    /// entry cannot keep the other job types from rehydrating.
    pub async fn load_all(&self) -> PersistenceResult<Vec<Job>> {
        let entries = self.store.get_all(storage::JOB_PREFIX).await?;
        let mut jobs = Vec::with_capacity(entries.len());

        for (key, value) in entries {
            match serde_json::from_value::<Job>(value) {
                Ok(job) if job_key(job.job_type) == key => jobs.push(job),
                Ok(job) => warn!(
                    key = %key,
                    job_type = %job.job_type,
                    "Ignoring job snapshot stored under the wrong key"
                ),
                Err(e) => error!(key = %key, error = %e, "Skipping corrupt job snapshot"),
            }
        }

        Ok(jobs)
    }

    pub async fn save_settings(&self, job_type: JobType, settings: &JobSettings) -> PersistenceResult<()> {
        let value = serde_json::to_value(settings)?;
        self.store.set(&settings_key(job_type), value).await
    }

    pub async fn load_settings(&self, job_type: JobType) -> PersistenceResult<Option<JobSettings>> {
        self.read(&settings_key(job_type)).await
    }

    /// Append an alert, dropping the oldest beyond the retention limit
    pub async fn append_alert(&self, alert: &Alert) -> PersistenceResult<()> {
        let mut alerts = self.load_alerts(alert.job_type).await?;
        alerts.push(alert.clone());
        if alerts.len() > self.max_alerts {
            let excess = alerts.len() - self.max_alerts;
            alerts.drain(..excess);
        }

        let value = serde_json::to_value(&alerts)?;
        self.store.set(&alerts_key(alert.job_type), value).await
    }

    pub async fn load_alerts(&self, job_type: JobType) -> PersistenceResult<Vec<Alert>> {
        Ok(self.read(&alerts_key(job_type)).await?.unwrap_or_default())
    }

    pub async fn clear_alerts(&self, job_type: JobType) -> PersistenceResult<()> {
        self.store.remove(&alerts_key(job_type)).await
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> PersistenceResult<Option<T>> {
        match self.store.get(key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| PersistenceError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }
}
