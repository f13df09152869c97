use super::job::Job;
use crate::constants::JobType;
use crate::state_machine::states::JobState;
use serde::{Deserialize, Serialize};

/// Answer to a `GET_*_STATUS` pull: the current job of a type, or `Idle`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub job_type: JobType,
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<Job>,
}

impl JobStatus {
    pub fn idle(job_type: JobType) -> Self {
        Self {
            job_type,
            state: JobState::Idle,
            job: None,
        }
    }

    pub fn of(job: &Job) -> Self {
        Self {
            job_type: job.job_type,
            state: job.state,
            job: Some(job.clone()),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.job.is_none()
    }
}
