use super::states::PauseOrigin;

/// Events that can trigger job state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// `START_*`: begin dispatching units
    Start,
    /// Stop dispatching at the next unit boundary
    Pause(PauseOrigin),
    /// `RESUME_*` or auto-resume after rehydration
    Resume,
    /// `STOP_*`: cancel, keep the cursor for a later continuation
    Stop,
    /// `TERMINATE_*`: cancel and discard the cursor
    Terminate,
    /// `RESET_*`: cancel, discard the cursor and the durable snapshot
    Reset,
    /// The runner exhausted the work set
    Complete,
    /// The runner hit a structural error
    Fail(String),
}

impl JobEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause(_) => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::Terminate => "terminate",
            Self::Reset => "reset",
            Self::Complete => "complete",
            Self::Fail(_) => "fail",
        }
    }

    /// The failure reason carried by `Fail`
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => Some(msg),
            _ => None,
        }
    }

    /// Cancelling events that throw the resumption cursor away
    pub fn discards_cursor(&self) -> bool {
        matches!(self, Self::Terminate | Self::Reset)
    }

    /// Create a failure event with the given error message
    pub fn fail_with_error(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }
}
