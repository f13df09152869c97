use serde::{Deserialize, Serialize};
use std::fmt;

/// Job lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// No job exists for the type
    #[default]
    Idle,
    /// Units are being dispatched
    Running,
    /// Waiting for a resume; no unit is dispatched
    Paused,
    /// Work set exhausted
    Completed,
    /// Stopped, terminated or reset by the operator
    Cancelled,
    /// The automation target became unusable
    Failed,
}

impl JobState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Check if the scheduler may dispatch units for a job in this state
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Running or paused: the job still occupies its job-type slot
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "running" => Ok(Self::Running),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid job state: {s}")),
        }
    }
}

/// Who or what put a job into `Paused`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseOrigin {
    /// A `PAUSE_*` control message
    Operator,
    /// The background process was suspended while the job was running
    Suspension,
    /// The snapshot of a committed unit could not be persisted
    PersistenceFailure,
    /// The collaborator kept failing transiently before a unit could be fetched
    CollaboratorUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_terminal_check() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Idle.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(!JobState::Paused.is_terminal());
    }

    #[test]
    fn test_live_states() {
        assert!(JobState::Running.is_live());
        assert!(JobState::Paused.is_live());
        assert!(!JobState::Idle.is_live());
        assert!(!JobState::Failed.is_live());
        assert!(JobState::Running.is_active());
        assert!(!JobState::Paused.is_active());
    }

    #[test]
    fn test_state_string_conversion() {
        assert_eq!(JobState::Running.to_string(), "running");
        assert_eq!("paused".parse::<JobState>().unwrap(), JobState::Paused);
        assert!("resolved_manually".parse::<JobState>().is_err());
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&JobState::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");

        let parsed: JobState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, JobState::Cancelled);

        let origin = serde_json::to_string(&PauseOrigin::PersistenceFailure).unwrap();
        assert_eq!(origin, "\"persistence_failure\"");
    }
}
