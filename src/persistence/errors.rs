use thiserror::Error;

/// Specific error type for persistence operations
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to write {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("Failed to read {key}: {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("Corrupt snapshot under {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Helper function to create write failures
pub fn write_failed(key: impl Into<String>, reason: impl Into<String>) -> PersistenceError {
    PersistenceError::WriteFailed {
        key: key.into(),
        reason: reason.into(),
    }
}
