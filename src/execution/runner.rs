//! # Job Runner
//!
//! Executes one job's unit-of-work loop against its scraping collaborator.
//! The runner does not own the loop itself: the orchestrator's scheduler
//! asks it for exactly one unit at a time, which keeps every suspension
//! point at a unit boundary.
//!
//! ## One unit
//!
//! 1. Poll the [`RunToken`]; a pause or cancel stops here, before any
//!    collaborator call.
//! 2. `fetch_next(cursor)` for the next unit, or exhaustion.
//! 3. `apply_action(unit)`.
//!
//! Both calls are bounded by the unit timeout. Transient failures and
//! timeouts are retried with backoff up to `max_attempts`; a unit whose
//! action still fails becomes a per-item failure and the cursor moves past
//! it. A fetch that still fails has no item to skip; the runner reports the
//! collaborator as unavailable and the cursor stays where it was.

use super::backoff::BackoffPolicy;
use super::collaborator::{ActionOutcome, CollaboratorError, FetchOutcome, ScrapingCollaborator};
use super::token::{RunSignal, RunToken};
use crate::config::SellerbotConfig;
use crate::constants::JobType;
use crate::models::{Cursor, JobSettings};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How a committed unit ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Succeeded,
    Flagged { message: String },
    Failed { reason: String },
}

/// A unit whose processing finished; its cursor is ready to be committed
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedUnit {
    pub unit_id: String,
    pub cursor: Cursor,
    pub total: Option<u64>,
    pub outcome: UnitOutcome,
    /// Attempts spent on the action call
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitReport {
    /// The token asked for a pause; no unit was started
    Suspended,
    /// The token was cancelled; no unit was started
    Halted,
    Committed(CommittedUnit),
    /// The work set is exhausted
    Exhausted,
    /// The automation target is unusable
    Structural { reason: String },
    /// Fetching kept failing transiently; nothing was processed
    Unavailable { reason: String },
}

#[derive(Clone)]
pub struct JobRunner {
    job_type: JobType,
    collaborator: Arc<dyn ScrapingCollaborator>,
    token: RunToken,
    backoff: BackoffPolicy,
    unit_timeout: Duration,
    max_attempts: u32,
}

impl std::fmt::Debug for JobRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRunner")
            .field("job_type", &self.job_type)
            .field("signal", &self.token.signal())
            .field("unit_timeout", &self.unit_timeout)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl JobRunner {
    pub fn new(
        job_type: JobType,
        collaborator: Arc<dyn ScrapingCollaborator>,
        token: RunToken,
        config: &SellerbotConfig,
    ) -> Self {
        Self {
            job_type,
            collaborator,
            token,
            backoff: BackoffPolicy::from(&config.backoff),
            unit_timeout: config.execution.unit_timeout(),
            max_attempts: config.execution.max_attempts.max(1),
        }
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn token(&self) -> &RunToken {
        &self.token
    }

    /// Process the unit after `cursor`
    pub async fn run_unit(&self, cursor: Option<&Cursor>, settings: &JobSettings) -> UnitReport {
        match self.token.signal() {
            RunSignal::Pause => return UnitReport::Suspended,
            RunSignal::Cancel => return UnitReport::Halted,
            RunSignal::Run => {}
        }

        let collaborator = self.collaborator.as_ref();

        let unit = match self
            .with_retry("fetch_next", move || collaborator.fetch_next(cursor, settings))
            .await
        {
            Ok((FetchOutcome::Unit(unit), _)) => unit,
            Ok((FetchOutcome::Exhausted, _)) => return UnitReport::Exhausted,
            Err((CollaboratorError::Structural(reason), _)) => {
                return UnitReport::Structural { reason }
            }
            Err((error, attempts)) => {
                return UnitReport::Unavailable {
                    reason: format!("could not fetch the next unit after {attempts} attempts: {error}"),
                }
            }
        };

        let unit_ref = &unit;
        let (outcome, attempts) = match self
            .with_retry("apply_action", move || collaborator.apply_action(unit_ref, settings))
            .await
        {
            Ok((ActionOutcome::Success, attempts)) => (UnitOutcome::Succeeded, attempts),
            Ok((ActionOutcome::Flagged { message }, attempts)) => {
                (UnitOutcome::Flagged { message }, attempts)
            }
            Ok((ActionOutcome::ItemFailure { reason }, attempts)) => {
                (UnitOutcome::Failed { reason }, attempts)
            }
            Err((CollaboratorError::Structural(reason), _)) => {
                return UnitReport::Structural { reason }
            }
            Err((error, attempts)) => (
                UnitOutcome::Failed {
                    reason: error.to_string(),
                },
                attempts,
            ),
        };

        debug!(
            job_type = %self.job_type,
            unit_id = %unit.unit_id,
            attempts = attempts,
            outcome = ?outcome,
            "Unit processed"
        );

        UnitReport::Committed(CommittedUnit {
            unit_id: unit.unit_id,
            cursor: unit.cursor,
            total: unit.total,
            outcome,
            attempts,
        })
    }

    /// Call `operation` until it succeeds, fails structurally, or the retry
    /// budget runs out; returns the result with the attempts spent
    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut call: F,
    ) -> Result<(T, u32), (CollaboratorError, u32)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        let mut attempt = 1;
        loop {
            let result = match tokio::time::timeout(self.unit_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(CollaboratorError::Timeout(self.unit_timeout)),
            };

            match result {
                Ok(value) => return Ok((value, attempt)),
                Err(error) if error.is_transient() && attempt < self.max_attempts => {
                    let delay = self.backoff.delay_for(attempt);
                    warn!(
                        job_type = %self.job_type,
                        operation = operation,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Transient collaborator failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err((error, attempt)),
            }
        }
    }
}
