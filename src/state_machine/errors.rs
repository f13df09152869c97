use crate::constants::JobType;
use super::states::JobState;
use thiserror::Error;

/// Error types for state machine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateMachineError {
    #[error("Guard condition failed: {0}")]
    GuardFailed(#[from] GuardError),

    #[error("Invalid {job_type} transition: cannot {event} from {from}")]
    InvalidTransition {
        job_type: JobType,
        from: JobState,
        event: &'static str,
    },
}

/// Specific error type for guard condition failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardError {
    #[error("A {job_type} job is already {state}")]
    AlreadyActive { job_type: JobType, state: JobState },

    #[error("Failure transitions require a human-readable reason")]
    MissingReason,
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
pub type GuardResult<T> = Result<T, GuardError>;

/// Helper function to create invalid transition errors
pub fn invalid_transition(job_type: JobType, from: JobState, event: &'static str) -> StateMachineError {
    StateMachineError::InvalidTransition {
        job_type,
        from,
        event,
    }
}
