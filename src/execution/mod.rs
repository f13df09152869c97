//! # Execution
//!
//! Everything that touches the scraping collaborator: the collaborator
//! interface, the per-job run token, retry backoff and the unit runner.

pub mod backoff;
pub mod collaborator;
pub mod runner;
pub mod token;

pub use backoff::BackoffPolicy;
pub use collaborator::{
    ActionOutcome, CollaboratorError, FetchOutcome, ScrapingCollaborator, WorkUnit,
};
pub use runner::{CommittedUnit, JobRunner, UnitOutcome, UnitReport};
pub use token::{RunSignal, RunToken};
