//! # Scraping Collaborator Interface
//!
//! The boundary to the site-specific code that actually reads and writes
//! marketplace or supplier pages. The core never scrapes anything itself;
//! it only drives a collaborator one work unit at a time.
//!
//! Failures are classified by the collaborator:
//!
//! - [`ActionOutcome::ItemFailure`]: this unit cannot be processed, move on
//! - [`CollaboratorError::Transient`]: network or DOM-not-ready, worth retrying
//! - [`CollaboratorError::Structural`]: the target itself is unusable
//!   (navigation lost, session expired, page structure changed)

use crate::models::{Cursor, JobSettings};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// The smallest resumable increment of a job's processing
#[derive(Debug, Clone, PartialEq)]
pub struct WorkUnit {
    /// Stable identifier used in alerts and failed-item records
    pub unit_id: String,
    /// Cursor that marks this unit as committed once processed
    pub cursor: Cursor,
    /// Size of the work set, if the collaborator knows it
    pub total: Option<u64>,
    /// Collaborator-private data carried from `fetch_next` to `apply_action`
    pub payload: Value,
}

impl WorkUnit {
    pub fn new(unit_id: impl Into<String>, cursor: Cursor) -> Self {
        Self {
            unit_id: unit_id.into(),
            cursor,
            total: None,
            payload: Value::Null,
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Unit(WorkUnit),
    /// The work set is exhausted
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    /// Processed, but the item is anomalous and the operator should see it
    Flagged { message: String },
    /// This item cannot be processed; the run continues with the next one
    ItemFailure { reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("structural failure: {0}")]
    Structural(String),

    #[error("collaborator call timed out after {0:?}")]
    Timeout(Duration),
}

impl CollaboratorError {
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient(reason.into())
    }

    pub fn structural(reason: impl Into<String>) -> Self {
        Self::Structural(reason.into())
    }

    /// Timeouts count as transient failures of the unit
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Timeout(_))
    }
}

/// Site-specific automation driven by a [`JobRunner`](super::JobRunner)
#[async_trait]
pub trait ScrapingCollaborator: Send + Sync {
    /// The first unit after `cursor` (`None` means the start of the work set)
    async fn fetch_next(
        &self,
        cursor: Option<&Cursor>,
        settings: &JobSettings,
    ) -> Result<FetchOutcome, CollaboratorError>;

    /// Perform the job's action on one unit
    async fn apply_action(
        &self,
        unit: &WorkUnit,
        settings: &JobSettings,
    ) -> Result<ActionOutcome, CollaboratorError>;
}
