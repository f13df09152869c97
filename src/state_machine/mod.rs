// State machine module for job lifecycle management
//
// One generic lifecycle (idle -> running <-> paused -> completed/cancelled/failed)
// instantiated once per job, whatever the job type.

pub mod errors;
pub mod events;
pub mod guards;
pub mod job_state_machine;
pub mod states;

// Re-export main types for convenient access
pub use errors::{GuardError, StateMachineError, StateMachineResult};
pub use events::JobEvent;
pub use job_state_machine::JobStateMachine;
pub use states::{JobState, PauseOrigin};

// Common traits and utilities
pub use guards::{SingleActiveJobGuard, StateGuard, TransitionGuard};
