//! # Orchestration
//!
//! The orchestrator, its collaborator registry and the service loop that
//! runs it.

pub mod errors;
pub mod orchestrator;
pub mod registry;
pub mod service;

pub use errors::{OrchestrationError, OrchestrationResult};
pub use orchestrator::Orchestrator;
pub use registry::CollaboratorRegistry;
pub use service::{Command, OrchestratorHandle};
