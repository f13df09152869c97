//! # Messaging Error Types
//!
//! Protocol violations are rejected at the orchestrator boundary and never
//! reach a job.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unknown message type: {message_type}")]
    UnknownMessageType { message_type: String },

    #[error("Malformed message: {reason}")]
    MalformedMessage { reason: String },

    #[error("Malformed payload for {message_type}: {reason}")]
    MalformedPayload {
        message_type: String,
        reason: String,
    },

    #[error("{message_type} is an event and cannot be sent to the orchestrator")]
    NotAControlMessage { message_type: String },
}

impl ProtocolError {
    pub fn unknown_message_type(message_type: impl Into<String>) -> Self {
        Self::UnknownMessageType {
            message_type: message_type.into(),
        }
    }

    pub fn malformed_payload(message_type: impl ToString, reason: impl ToString) -> Self {
        Self::MalformedPayload {
            message_type: message_type.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
