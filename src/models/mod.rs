pub mod alert;
pub mod job;
pub mod status;

// Re-export core models for easy access
pub use crate::constants::JobType;
pub use alert::Alert;
pub use job::{Cursor, FailedItem, Job, JobProgress, JobSettings};
pub use status::JobStatus;
