//! Typed payloads for the control messages that carry data, and the common
//! shape of every job event.
//!
//! | Message | Payload |
//! |---|---|
//! | `START_*` / `SCHEDULE_BOOST` | `{"settings"?: object, "resume"?: bool}` |
//! | `SAVE_*_SETTINGS` | `{"settings": object}` |
//! | other control messages | ignored |
//! | `*_STARTED` ... `*_CANCELLED` | [`EventPayload`] |

use crate::constants::JobType;
use crate::models::{Cursor, FailedItem, Job, JobSettings};
use crate::state_machine::JobState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartPayload {
    /// Settings for this run; the saved settings are used when absent
    pub settings: Option<JobSettings>,
    /// Continue from the cursor retained by the previous terminal job
    pub resume: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSettingsPayload {
    pub settings: JobSettings,
}

/// Payload of every job event
///
/// `failedItems` is carried by lifecycle events only. Per-unit events
/// (`*_PROGRESS`, `*_ALERT`, `*_LOG`) carry `failedCount` alone so their size
/// does not grow with the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub job_id: Uuid,
    pub job_type: JobType,
    pub state: JobState,
    pub processed: u64,
    pub total: Option<u64>,
    pub failed_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_items: Option<Vec<FailedItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EventPayload {
    /// Lifecycle event payload, with the full failed-item list
    pub fn from_job(job: &Job) -> Self {
        Self {
            failed_items: Some(job.progress.failed_items.clone()),
            ..Self::unit(job)
        }
    }

    /// Per-unit event payload
    pub fn unit(job: &Job) -> Self {
        Self {
            job_id: job.job_id,
            job_type: job.job_type,
            state: job.state,
            processed: job.progress.processed,
            total: job.progress.total,
            failed_count: job.progress.failed_items.len(),
            failed_items: None,
            cursor: job.cursor.clone(),
            reason: None,
            unit_id: None,
            message: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_unit(mut self, unit_id: impl Into<String>, message: impl Into<String>) -> Self {
        self.unit_id = Some(unit_id.into());
        self.message = Some(message.into());
        self
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_payload_uses_camel_case_keys() {
        let mut job = Job::new(JobType::CsvImport, JobSettings::default(), None);
        job.commit_unit(Cursor::new(json!({"row": 4})), Some(12));

        let value = EventPayload::from_job(&job)
            .with_unit("row-4", "price below floor")
            .to_value();

        assert_eq!(value["jobType"], "csv_import");
        assert_eq!(value["processed"], 1);
        assert_eq!(value["total"], 12);
        assert_eq!(value["failedCount"], 0);
        assert_eq!(value["failedItems"], json!([]));
        assert_eq!(value["cursor"], json!({"row": 4}));
        assert_eq!(value["unitId"], "row-4");
        assert!(value.get("reason").is_none());
    }

    #[test]
    fn test_unit_payload_carries_only_the_failed_count() {
        let mut job = Job::new(JobType::CsvImport, JobSettings::default(), None);
        for row in 0..3 {
            job.commit_unit(Cursor::new(row), None);
            job.record_failed_item(FailedItem {
                unit_id: format!("row-{row}"),
                reason: "missing price".to_string(),
                attempts: 1,
            });
        }

        let value = EventPayload::unit(&job).to_value();
        assert_eq!(value["failedCount"], 3);
        assert!(value.get("failedItems").is_none());

        let value = EventPayload::from_job(&job).to_value();
        assert_eq!(value["failedCount"], 3);
        assert_eq!(value["failedItems"][2]["unitId"], "row-2");
    }

    #[test]
    fn test_start_payload_accepts_settings() {
        let payload: StartPayload =
            serde_json::from_value(json!({"settings": {"interval": 30}})).unwrap();
        assert_eq!(
            payload.settings.unwrap().get("interval"),
            Some(&json!(30))
        );
        assert!(!payload.resume);
    }
}
