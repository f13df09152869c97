//! Responses to control messages.
//!
//! [`ControlResponse`] is the typed result of an accepted control message;
//! [`Reply`] is what goes back to the sending context on the wire.

use crate::constants::JobType;
use crate::models::{Alert, JobSettings, JobStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlResponse {
    /// A lifecycle transition was persisted and applied
    Accepted(JobStatus),
    /// `GET_*_STATUS`
    Status(JobStatus),
    Settings {
        job_type: JobType,
        settings: JobSettings,
    },
    Alerts {
        job_type: JobType,
        alerts: Vec<Alert>,
    },
    AlertsCleared {
        job_type: JobType,
    },
}

impl ControlResponse {
    pub fn status(&self) -> Option<&JobStatus> {
        match self {
            Self::Accepted(status) | Self::Status(status) => Some(status),
            _ => None,
        }
    }
}

/// Wire response; `error` is always a human-readable reason when `ok` is false
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub ok: bool,
    /// The request was a `START_*` for a job that is already live
    #[serde(default)]
    pub duplicate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Reply {
    pub fn ok(status: Option<JobStatus>) -> Self {
        Self {
            ok: true,
            duplicate: false,
            status,
            error: None,
            data: None,
        }
    }

    pub fn duplicate(status: JobStatus) -> Self {
        Self {
            duplicate: true,
            ..Self::ok(Some(status))
        }
    }

    pub fn failure(error: impl Into<String>, status: Option<JobStatus>) -> Self {
        Self {
            ok: false,
            duplicate: false,
            status,
            error: Some(error.into()),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<ControlResponse> for Reply {
    fn from(response: ControlResponse) -> Self {
        match response {
            ControlResponse::Accepted(status) | ControlResponse::Status(status) => {
                Reply::ok(Some(status))
            }
            ControlResponse::Settings { settings, .. } => Reply::ok(None).with_data(settings.0),
            ControlResponse::Alerts { alerts, .. } => {
                Reply::ok(None).with_data(serde_json::to_value(alerts).unwrap_or(Value::Null))
            }
            ControlResponse::AlertsCleared { .. } => Reply::ok(None),
        }
    }
}
