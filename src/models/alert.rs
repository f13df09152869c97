use crate::constants::JobType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A flagged or anomalous item reported by a job without halting it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub job_id: Uuid,
    pub job_type: JobType,
    pub unit_id: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        job_id: Uuid,
        job_type: JobType,
        unit_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            job_type,
            unit_id: unit_id.into(),
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}
