#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Sellerbot Core
//!
//! Background job orchestration for seller-automation workflows.
//!
//! ## Overview
//!
//! A seller-automation extension runs several long-lived jobs side by side
//! inside one background process: a listing monitor, a price/stock tracker,
//! a SKU backfill, a CSV import, a boost scheduler and an auto-order run.
//! Each job is pausable and resumable, reports progress to any number of UI
//! pages, and must survive the host suspending and restarting the process
//! at any moment. This crate is that coordination core. It never scrapes a
//! page itself; site-specific work is delegated to a
//! [`ScrapingCollaborator`](execution::ScrapingCollaborator).
//!
//! ## Architecture
//!
//! Control messages from the closed [message catalog](constants) reach the
//! [`Orchestrator`](orchestration::Orchestrator), which owns at most one job
//! per job type. Every job has a [state machine](state_machine) and a
//! [runner](execution::JobRunner); the orchestrator's cooperative scheduler
//! runs one unit of work at a time, round-robin across running jobs.
//! Snapshots go through the [persistence bridge](persistence) before any
//! transition is acknowledged, and job events fan out through the
//! [event publisher](events).
//!
//! ## Module Organization
//!
//! - [`constants`] - Message catalog and job types
//! - [`messaging`] - Message envelope, payloads and replies
//! - [`models`] - Job, progress, settings and alert models
//! - [`state_machine`] - Job lifecycle states and transitions
//! - [`execution`] - Collaborator interface and unit runner
//! - [`events`] - Subscriptions and event fan-out
//! - [`persistence`] - Key/value stores and the persistence bridge
//! - [`orchestration`] - Orchestrator, scheduler and service loop
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sellerbot_core::config::ConfigManager;
//! use sellerbot_core::orchestration::{CollaboratorRegistry, Orchestrator};
//!
//! # async fn example(registry: CollaboratorRegistry) -> Result<(), Box<dyn std::error::Error>> {
//! sellerbot_core::logging::init_structured_logging();
//!
//! let manager = ConfigManager::load()?;
//! let mut orchestrator = Orchestrator::from_config(manager.shared_config(), registry).await?;
//!
//! let reply = orchestrator
//!     .handle_raw(r#"{"type":"START_MONITOR","payload":{"settings":{"interval":60}}}"#)
//!     .await;
//! assert!(reply.ok);
//!
//! orchestrator.run_until_idle().await;
//! orchestrator.flush().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod execution;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod orchestration;
pub mod persistence;
pub mod state_machine;

pub use config::{ConfigManager, SellerbotConfig};
pub use constants::{messages, JobType, MessageKind, MessageType};
pub use error::{Result, SellerbotError};
pub use events::{EventPublisher, ListenerId, Topic};
pub use execution::{
    ActionOutcome, CollaboratorError, FetchOutcome, ScrapingCollaborator, WorkUnit,
};
pub use messaging::{Message, Reply};
pub use models::{Alert, Cursor, Job, JobSettings, JobStatus};
pub use orchestration::{CollaboratorRegistry, Orchestrator, OrchestratorHandle};
pub use persistence::{FileStore, InMemoryStore, KeyValueStore, PersistenceBridge};
pub use state_machine::{JobState, PauseOrigin};
