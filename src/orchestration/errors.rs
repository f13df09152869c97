//! # Orchestration Errors
//!
//! Everything `Orchestrator::handle` can reject a control message with.

use crate::config::ConfigurationError;
use crate::constants::JobType;
use crate::messaging::ProtocolError;
use crate::models::JobStatus;
use crate::persistence::PersistenceError;
use crate::state_machine::StateMachineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    StateMachine(#[from] StateMachineError),

    /// The durable write failed, so the transition was not applied
    #[error("Persistence failure, transition not applied: {0}")]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// `START_*` for a job type that already has a live job
    #[error("{job_type} job is already {}", .status.state)]
    DuplicateStart {
        job_type: JobType,
        status: Box<JobStatus>,
    },

    #[error("No collaborator registered for {job_type} jobs")]
    NoCollaborator { job_type: JobType },

    #[error("Orchestrator service is not running")]
    ServiceUnavailable,
}

impl OrchestrationError {
    pub fn duplicate_start(status: JobStatus) -> Self {
        Self::DuplicateStart {
            job_type: status.job_type,
            status: Box::new(status),
        }
    }

    pub fn is_duplicate_start(&self) -> bool {
        matches!(self, Self::DuplicateStart { .. })
    }
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
