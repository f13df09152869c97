//! # Job Model
//!
//! One long-running automation task: a monitor pass, a tracker sweep, a SKU
//! backfill, a CSV import, a boost schedule or an auto-order run.
//!
//! ## Ownership
//!
//! The orchestrator exclusively owns the in-memory `Job` for each job type.
//! The persistence bridge holds the durable mirror, written as a full
//! snapshot after every accepted transition and every committed unit.
//! UI contexts only ever see copies carried in event payloads.
//!
//! ## Resumption
//!
//! `cursor` is the collaborator's marker for the last committed work unit.
//! Handing it back to the collaborator must yield the first *uncommitted*
//! unit, so a job resumed after a pause or a process restart never
//! reprocesses work whose commit was already observed.

use crate::constants::JobType;
use crate::state_machine::states::{JobState, PauseOrigin};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Opaque resumption marker produced by the scraping collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub Value);

impl Cursor {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

/// Job-type-specific configuration snapshot, opaque to the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobSettings(pub Value);

impl JobSettings {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Look up a top-level setting
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl Default for JobSettings {
    fn default() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }
}

/// A work unit that exhausted its retry budget or was rejected by the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedItem {
    pub unit_id: String,
    pub reason: String,
    pub attempts: u32,
}

/// Processed/total counts for a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    /// Units whose processing finished, successfully or as a per-item failure
    pub processed: u64,
    /// Size of the work set, when the collaborator knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default)]
    pub failed_items: Vec<FailedItem>,
    pub updated_at: DateTime<Utc>,
}

impl JobProgress {
    pub fn new() -> Self {
        Self {
            processed: 0,
            total: None,
            failed_items: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

impl Default for JobProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: Uuid,
    pub job_type: JobType,
    pub state: JobState,
    #[serde(default)]
    pub cursor: Option<Cursor>,
    pub progress: JobProgress,
    #[serde(default)]
    pub settings: JobSettings,
    /// Why the job is paused; `None` unless `state` is `Paused`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_origin: Option<PauseOrigin>,
    /// Human-readable reason for the last fatal condition or forced pause
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A fresh job in the `Idle` state, ready for its `Start` transition
    pub fn new(job_type: JobType, settings: JobSettings, cursor: Option<Cursor>) -> Self {
        let now = Utc::now();
        Self {
            job_id: Uuid::new_v4(),
            job_type,
            state: JobState::Idle,
            cursor,
            progress: JobProgress::new(),
            settings,
            pause_origin: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a finished work unit and advance the cursor past it
    pub fn commit_unit(&mut self, cursor: Cursor, total: Option<u64>) {
        self.cursor = Some(cursor);
        self.progress.processed += 1;
        if total.is_some() {
            self.progress.total = total;
        }
        self.touch();
    }

    pub fn record_failed_item(&mut self, item: FailedItem) {
        self.progress.failed_items.push(item);
    }

    pub fn touch(&mut self) {
        let now = Utc::now();
        self.progress.updated_at = now;
        self.updated_at = now;
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_job_is_idle_with_empty_progress() {
        let job = Job::new(JobType::Monitor, JobSettings::default(), None);

        assert_eq!(job.state, JobState::Idle);
        assert_eq!(job.progress.processed, 0);
        assert!(job.cursor.is_none());
        assert_eq!(job.settings.value(), &json!({}));
    }

    #[test]
    fn test_commit_unit_advances_cursor_and_counts() {
        let mut job = Job::new(JobType::SkuBackfill, JobSettings::default(), None);

        job.commit_unit(Cursor::new(0), Some(10));
        job.commit_unit(Cursor::new(1), None);

        assert_eq!(job.progress.processed, 2);
        assert_eq!(job.progress.total, Some(10));
        assert_eq!(job.cursor, Some(Cursor::new(1)));
    }

    #[test]
    fn test_job_serializes_camel_case() {
        let mut job = Job::new(
            JobType::CsvImport,
            JobSettings::new(json!({"file": "listings.csv"})),
            Some(Cursor::new("row-4")),
        );
        job.record_failed_item(FailedItem {
            unit_id: "row-2".to_string(),
            reason: "missing price".to_string(),
            attempts: 1,
        });

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["jobType"], "csv_import");
        assert_eq!(value["cursor"], "row-4");
        assert_eq!(value["progress"]["failedItems"][0]["unitId"], "row-2");

        let parsed: Job = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, job);
    }
}
