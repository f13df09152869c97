//! Crate-wide error taxonomy.
//!
//! Each subsystem reports its own error type; `SellerbotError` unifies them
//! for callers that embed the whole core.

use crate::config::ConfigurationError;
use crate::execution::CollaboratorError;
use crate::messaging::ProtocolError;
use crate::orchestration::OrchestrationError;
use crate::persistence::PersistenceError;
use crate::state_machine::StateMachineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SellerbotError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("State transition error: {0}")]
    StateMachine(#[from] StateMachineError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),
}

impl SellerbotError {
    /// Errors that are reported back to the sender without affecting any job
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::Protocol(_) | Self::StateMachine(_) => true,
            Self::Orchestration(inner) => matches!(
                inner,
                OrchestrationError::Protocol(_)
                    | OrchestrationError::StateMachine(_)
                    | OrchestrationError::DuplicateStart { .. }
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SellerbotError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::JobType;
    use crate::models::JobStatus;

    #[test]
    fn test_conversions_preserve_messages() {
        let err: SellerbotError = ProtocolError::unknown_message_type("START_NOTHING").into();
        assert_eq!(
            err.to_string(),
            "Protocol error: Unknown message type: START_NOTHING"
        );

        let err: SellerbotError = CollaboratorError::structural("login page").into();
        assert!(err.to_string().contains("login page"));
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_duplicate_start_is_a_rejection() {
        let err: SellerbotError =
            OrchestrationError::duplicate_start(JobStatus::idle(JobType::Monitor)).into();
        assert!(err.is_rejection());
    }
}
