//! # Orchestrator
//!
//! The single addressable entry point for control messages. The orchestrator
//! owns every in-memory [`Job`] (at most one per job type), routes control
//! messages to the owning job's state machine, drives the job runners one
//! unit at a time, persists a snapshot before acknowledging any transition,
//! and fans job events out to subscribed listener contexts.
//!
//! ## Scheduling
//!
//! Execution is cooperative and single-tasked. [`Orchestrator::step`] runs
//! exactly one unit of the next runnable job, round-robin across job types,
//! so several jobs can be `Running` at once and interleave at unit
//! boundaries. Control messages are handled between units, never inside
//! one, which is what makes a pause take effect at the next boundary.
//!
//! ## Persistence
//!
//! A control transition is applied to a copy of the state machine, the copy
//! is saved, and only then does it replace the live one. If the save fails
//! the caller gets a persistence error and the job is unchanged. A failed
//! save after a committed unit pauses the job instead, since there is no
//! caller to reject. A collaborator that stays unreachable while fetching
//! also pauses the job, with its cursor intact, rather than failing it.

use super::errors::{OrchestrationError, OrchestrationResult};
use super::registry::CollaboratorRegistry;
use crate::config::{ConfigurationError, PersistenceBackend, SellerbotConfig};
use crate::constants::{JobType, MessageKind, MessageType};
use crate::events::{EventPublisher, ListenerId, Topic};
use crate::execution::{CommittedUnit, JobRunner, RunSignal, RunToken, UnitOutcome, UnitReport};
use crate::logging::{log_error, log_job_operation};
use crate::messaging::{
    ControlResponse, EventPayload, Message, ProtocolError, Reply, SaveSettingsPayload,
    StartPayload,
};
use crate::models::{Alert, FailedItem, Job, JobSettings, JobStatus};
use crate::persistence::{FileStore, InMemoryStore, KeyValueStore, PersistenceBridge};
use crate::state_machine::errors::invalid_transition;
use crate::state_machine::{
    JobEvent, JobState, JobStateMachine, PauseOrigin, SingleActiveJobGuard, StateGuard,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// One live or last-known job with its runner
struct ManagedJob {
    machine: JobStateMachine,
    token: RunToken,
    /// `None` when no collaborator is registered for the job type
    runner: Option<JobRunner>,
}

impl ManagedJob {
    fn is_runnable(&self) -> bool {
        self.machine.current_state() == JobState::Running
            && self.runner.is_some()
            && self.token.signal() == RunSignal::Run
    }
}

pub struct Orchestrator {
    config: Arc<SellerbotConfig>,
    bridge: PersistenceBridge,
    registry: CollaboratorRegistry,
    publisher: EventPublisher,
    jobs: BTreeMap<JobType, ManagedJob>,
    /// Round-robin position in `JobType::ALL`
    next_slot: usize,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("jobs", &self.jobs.keys().collect::<Vec<_>>())
            .field("listeners", &self.publisher.listener_count())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Construct the orchestrator and rehydrate every persisted job
    ///
    /// A snapshot that was `Running` when the process went away is treated
    /// as suspended: it becomes `Paused`, and is resumed straight away when
    /// its job type's policy asks for it. Terminal snapshots are kept as the
    /// last-known job for status requests.
    pub async fn bootstrap(
        config: Arc<SellerbotConfig>,
        bridge: PersistenceBridge,
        registry: CollaboratorRegistry,
    ) -> OrchestrationResult<Self> {
        let mut orchestrator = Self {
            config,
            bridge,
            registry,
            publisher: EventPublisher::new(),
            jobs: BTreeMap::new(),
            next_slot: 0,
        };
        orchestrator.rehydrate().await?;
        Ok(orchestrator)
    }

    /// Open the configured store and bootstrap on top of it
    pub async fn from_config(
        config: Arc<SellerbotConfig>,
        registry: CollaboratorRegistry,
    ) -> OrchestrationResult<Self> {
        config.validate()?;

        let store: Arc<dyn KeyValueStore> = match config.persistence.backend {
            PersistenceBackend::Memory => Arc::new(InMemoryStore::new()),
            PersistenceBackend::File => {
                let path = config.persistence.path.clone().ok_or_else(|| {
                    ConfigurationError::missing_required_field(
                        "persistence.path",
                        "file persistence backend",
                    )
                })?;
                Arc::new(FileStore::open(path).await?)
            }
        };

        let bridge = PersistenceBridge::new(store, config.alerts.max_retained);
        Self::bootstrap(config, bridge, registry).await
    }

    async fn rehydrate(&mut self) -> OrchestrationResult<()> {
        let snapshots = self.bridge.load_all().await?;

        for snapshot in snapshots {
            let job_type = snapshot.job_type;
            let persisted_state = snapshot.state;
            let token = RunToken::new();
            let runner = self.build_runner(job_type, &token);
            let mut machine = JobStateMachine::new(snapshot.clone());

            if persisted_state == JobState::Running {
                machine.transition(JobEvent::Pause(PauseOrigin::Suspension))?;
            }

            if machine.is_suspended() && self.config.jobs.policy(job_type).auto_resume_on_restart {
                if runner.is_some() {
                    machine.transition(JobEvent::Resume)?;
                } else {
                    warn!(
                        job_type = %job_type,
                        "Cannot auto-resume without a registered collaborator, job stays paused"
                    );
                }
            }

            match machine.current_state() {
                JobState::Paused => token.pause(),
                state if state.is_terminal() => token.cancel(),
                _ => {}
            }

            if machine.job() != &snapshot {
                self.bridge.save(machine.job()).await?;
            }

            log_job_operation(
                "rehydrate",
                Some(machine.job().job_id),
                job_type,
                &machine.current_state().to_string(),
                Some(&format!("persisted as {persisted_state}")),
            );

            self.jobs.insert(
                job_type,
                ManagedJob {
                    machine,
                    token,
                    runner,
                },
            );
        }

        info!(jobs = self.jobs.len(), "Rehydration complete");
        Ok(())
    }

    fn build_runner(&self, job_type: JobType, token: &RunToken) -> Option<JobRunner> {
        self.registry
            .get(job_type)
            .map(|collaborator| JobRunner::new(job_type, collaborator, token.clone(), &self.config))
    }

    /// Route one control message
    ///
    /// Lifecycle messages are acknowledged only after the resulting snapshot
    /// is durable. A `START_*` for a job type with a live job fails with
    /// [`OrchestrationError::DuplicateStart`] carrying the current status.
    pub async fn handle(&mut self, message: Message) -> OrchestrationResult<ControlResponse> {
        let message_type = message.message_type();
        let job_type = message_type.job_type;

        debug!(
            message_type = %message_type,
            origin = message.origin(),
            "Handling control message"
        );

        match message_type.kind {
            MessageKind::Start => {
                let payload: StartPayload = message.parse_payload()?;
                self.start(job_type, payload).await
            }
            MessageKind::Pause => self.pause(job_type).await,
            MessageKind::Resume => self.resume(job_type).await,
            MessageKind::Stop => self.cancel(job_type, JobEvent::Stop).await,
            MessageKind::Terminate => self.cancel(job_type, JobEvent::Terminate).await,
            MessageKind::Reset => self.reset(job_type).await,
            MessageKind::GetStatus => Ok(ControlResponse::Status(self.snapshot(job_type))),
            MessageKind::GetSettings => Ok(ControlResponse::Settings {
                job_type,
                settings: self.settings(job_type).await?,
            }),
            MessageKind::SaveSettings => {
                let payload: SaveSettingsPayload = message.parse_payload()?;
                self.save_settings(job_type, payload.settings).await
            }
            MessageKind::GetAlerts => Ok(ControlResponse::Alerts {
                job_type,
                alerts: self.bridge.load_alerts(job_type).await?,
            }),
            MessageKind::ClearAlerts => {
                self.bridge.clear_alerts(job_type).await?;
                Ok(ControlResponse::AlertsCleared { job_type })
            }
            MessageKind::Started
            | MessageKind::Progress
            | MessageKind::Alert
            | MessageKind::Log
            | MessageKind::Paused
            | MessageKind::Resumed
            | MessageKind::Complete
            | MessageKind::Failed
            | MessageKind::Cancelled => Err(ProtocolError::NotAControlMessage {
                message_type: message_type.to_string(),
            }
            .into()),
        }
    }

    /// [`handle`](Self::handle) with the result shaped as a wire reply
    pub async fn handle_message(&mut self, message: Message) -> Reply {
        let job_type = message.message_type().job_type;

        match self.handle(message).await {
            Ok(response) => response.into(),
            Err(OrchestrationError::DuplicateStart { status, .. }) => Reply::duplicate(*status),
            Err(e) => {
                log_error("orchestrator", "handle", &e.to_string(), Some(job_type.as_str()));
                Reply::failure(e.to_string(), Some(self.snapshot(job_type)))
            }
        }
    }

    /// Parse and handle a wire message; protocol errors never reach a job
    pub async fn handle_raw(&mut self, json: &str) -> Reply {
        match Message::from_json(json) {
            Ok(message) => self.handle_message(message).await,
            Err(e) => {
                warn!(error = %e, "Rejected message at the protocol boundary");
                Reply::failure(e.to_string(), None)
            }
        }
    }

    async fn start(
        &mut self,
        job_type: JobType,
        payload: StartPayload,
    ) -> OrchestrationResult<ControlResponse> {
        if let Some(existing) = self.jobs.get(&job_type) {
            if let Err(guard) = SingleActiveJobGuard.check(existing.machine.job()) {
                info!(job_type = %job_type, reason = %guard, "Duplicate start ignored");
                return Err(OrchestrationError::duplicate_start(JobStatus::of(
                    existing.machine.job(),
                )));
            }
        }

        if !self.registry.contains(job_type) {
            return Err(OrchestrationError::NoCollaborator { job_type });
        }

        let settings = match payload.settings {
            Some(settings) => settings,
            None => self.settings(job_type).await?,
        };

        let cursor = if payload.resume {
            self.jobs
                .get(&job_type)
                .and_then(|previous| previous.machine.job().cursor.clone())
        } else {
            None
        };

        let mut machine = JobStateMachine::new(Job::new(job_type, settings, cursor));
        machine.transition(JobEvent::Start)?;
        self.bridge.save(machine.job()).await?;

        let token = RunToken::new();
        let runner = self.build_runner(job_type, &token);
        let job = machine.job().clone();

        log_job_operation(
            "start",
            Some(job.job_id),
            job_type,
            "running",
            payload.resume.then_some("continuing from retained cursor"),
        );

        self.jobs.insert(
            job_type,
            ManagedJob {
                machine,
                token,
                runner,
            },
        );
        self.emit(MessageKind::Started, EventPayload::from_job(&job));

        Ok(ControlResponse::Accepted(JobStatus::of(&job)))
    }

    async fn pause(&mut self, job_type: JobType) -> OrchestrationResult<ControlResponse> {
        let job = self
            .apply_transition(job_type, JobEvent::Pause(PauseOrigin::Operator))
            .await?;
        if let Some(managed) = self.jobs.get(&job_type) {
            managed.token.pause();
        }

        log_job_operation("pause", Some(job.job_id), job_type, "paused", None);
        self.emit(
            MessageKind::Paused,
            EventPayload::from_job(&job).with_reason("paused by operator"),
        );
        Ok(ControlResponse::Accepted(JobStatus::of(&job)))
    }

    async fn resume(&mut self, job_type: JobType) -> OrchestrationResult<ControlResponse> {
        if self
            .jobs
            .get(&job_type)
            .is_some_and(|managed| managed.runner.is_none())
        {
            return Err(OrchestrationError::NoCollaborator { job_type });
        }

        let job = self.apply_transition(job_type, JobEvent::Resume).await?;
        if let Some(managed) = self.jobs.get(&job_type) {
            managed.token.resume();
        }

        log_job_operation("resume", Some(job.job_id), job_type, "running", None);
        self.emit(MessageKind::Resumed, EventPayload::from_job(&job));
        Ok(ControlResponse::Accepted(JobStatus::of(&job)))
    }

    /// `STOP_*` keeps the cursor, `TERMINATE_*` discards it
    async fn cancel(
        &mut self,
        job_type: JobType,
        event: JobEvent,
    ) -> OrchestrationResult<ControlResponse> {
        let reason = match event {
            JobEvent::Stop => "stopped by operator",
            _ => "terminated by operator",
        };

        let job = self.apply_transition(job_type, event).await?;
        if let Some(managed) = self.jobs.get(&job_type) {
            managed.token.cancel();
        }

        log_job_operation("cancel", Some(job.job_id), job_type, "cancelled", Some(reason));
        self.emit(
            MessageKind::Cancelled,
            EventPayload::from_job(&job).with_reason(reason),
        );
        Ok(ControlResponse::Accepted(JobStatus::of(&job)))
    }

    /// Cancel a live job and forget it entirely; a terminal job is simply
    /// cleared. Either way the job type reads as `Idle` afterwards.
    async fn reset(&mut self, job_type: JobType) -> OrchestrationResult<ControlResponse> {
        let Some(managed) = self.jobs.get(&job_type) else {
            return Ok(ControlResponse::Accepted(JobStatus::idle(job_type)));
        };

        let mut machine = managed.machine.clone();
        let was_live = !machine.current_state().is_terminal();
        if was_live {
            machine.transition(JobEvent::Reset)?;
        }

        self.bridge.clear(job_type).await?;
        if let Some(removed) = self.jobs.remove(&job_type) {
            removed.token.cancel();
        }

        log_job_operation(
            "reset",
            Some(machine.job().job_id),
            job_type,
            "idle",
            Some("durable snapshot cleared"),
        );
        if was_live {
            self.emit(
                MessageKind::Cancelled,
                EventPayload::from_job(machine.job()).with_reason("reset by operator"),
            );
        }
        Ok(ControlResponse::Accepted(JobStatus::idle(job_type)))
    }

    /// Transition a copy, persist it, then swap it in
    async fn apply_transition(
        &mut self,
        job_type: JobType,
        event: JobEvent,
    ) -> OrchestrationResult<Job> {
        let mut next = match self.jobs.get(&job_type) {
            Some(managed) => managed.machine.clone(),
            None => {
                return Err(invalid_transition(job_type, JobState::Idle, event.event_type()).into())
            }
        };

        next.transition(event)?;
        self.bridge.save(next.job()).await?;

        let job = next.job().clone();
        if let Some(managed) = self.jobs.get_mut(&job_type) {
            managed.machine = next;
        }
        Ok(job)
    }

    async fn settings(&self, job_type: JobType) -> OrchestrationResult<JobSettings> {
        Ok(self
            .bridge
            .load_settings(job_type)
            .await?
            .unwrap_or_default())
    }

    async fn save_settings(
        &mut self,
        job_type: JobType,
        settings: JobSettings,
    ) -> OrchestrationResult<ControlResponse> {
        self.bridge.save_settings(job_type, &settings).await?;
        debug!(job_type = %job_type, "Settings saved");
        Ok(ControlResponse::Settings { job_type, settings })
    }

    /// Current job of a type, or `Idle` when there is none
    pub fn snapshot(&self, job_type: JobType) -> JobStatus {
        self.jobs
            .get(&job_type)
            .map_or_else(|| JobStatus::idle(job_type), |managed| JobStatus::of(managed.machine.job()))
    }

    pub fn job(&self, job_type: JobType) -> Option<&Job> {
        self.jobs.get(&job_type).map(|managed| managed.machine.job())
    }

    pub fn connect(
        &mut self,
        name: impl Into<String>,
    ) -> (ListenerId, mpsc::UnboundedReceiver<Message>) {
        self.publisher.connect(name)
    }

    pub fn subscribe(&mut self, listener: ListenerId, topic: Topic) -> bool {
        self.publisher.subscribe(listener, topic)
    }

    pub fn unsubscribe(&mut self, listener: ListenerId, topic: Topic) -> bool {
        self.publisher.unsubscribe(listener, topic)
    }

    pub fn disconnect(&mut self, listener: ListenerId) -> bool {
        self.publisher.disconnect(listener)
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    pub fn config(&self) -> &SellerbotConfig {
        &self.config
    }

    pub fn has_runnable(&self) -> bool {
        self.jobs.values().any(ManagedJob::is_runnable)
    }

    /// Run one unit of the next runnable job; `None` when nothing is runnable
    pub async fn step(&mut self) -> Option<JobType> {
        let job_type = self.next_runnable()?;
        let (runner, cursor, settings) = {
            let managed = self.jobs.get(&job_type)?;
            let job = managed.machine.job();
            (managed.runner.clone()?, job.cursor.clone(), job.settings.clone())
        };

        match runner.run_unit(cursor.as_ref(), &settings).await {
            UnitReport::Committed(unit) => self.commit_unit(job_type, unit).await,
            UnitReport::Exhausted => self.finish(job_type, JobEvent::Complete).await,
            UnitReport::Structural { reason } => {
                let reason = if reason.trim().is_empty() {
                    "structural failure reported without a reason".to_string()
                } else {
                    reason
                };
                self.finish(job_type, JobEvent::Fail(reason)).await
            }
            UnitReport::Unavailable { reason } => {
                self.force_pause(job_type, PauseOrigin::CollaboratorUnavailable, reason)
                    .await
            }
            report @ (UnitReport::Suspended | UnitReport::Halted) => {
                debug!(job_type = %job_type, report = ?report, "Runner declined the unit");
            }
        }

        Some(job_type)
    }

    /// Step until no job is runnable; returns the number of units run
    pub async fn run_until_idle(&mut self) -> usize {
        let mut units = 0;
        while self.step().await.is_some() {
            units += 1;
        }
        units
    }

    fn next_runnable(&mut self) -> Option<JobType> {
        let slots = JobType::ALL.len();
        for offset in 0..slots {
            let slot = (self.next_slot + offset) % slots;
            let job_type = JobType::ALL[slot];
            if self.jobs.get(&job_type).is_some_and(ManagedJob::is_runnable) {
                self.next_slot = (slot + 1) % slots;
                return Some(job_type);
            }
        }
        None
    }

    async fn commit_unit(&mut self, job_type: JobType, unit: CommittedUnit) {
        let Some(managed) = self.jobs.get(&job_type) else {
            return;
        };

        let mut next = managed.machine.clone();
        {
            let job = next.job_mut();
            job.commit_unit(unit.cursor.clone(), unit.total);
            if let UnitOutcome::Failed { reason } = &unit.outcome {
                job.record_failed_item(FailedItem {
                    unit_id: unit.unit_id.clone(),
                    reason: reason.clone(),
                    attempts: unit.attempts,
                });
            }
        }

        if let Err(e) = self.bridge.save(next.job()).await {
            self.force_pause(
                job_type,
                PauseOrigin::PersistenceFailure,
                format!("could not persist unit {}: {e}", unit.unit_id),
            )
            .await;
            return;
        }

        let job = next.job().clone();
        if let Some(managed) = self.jobs.get_mut(&job_type) {
            managed.machine = next;
        }

        debug!(
            job_type = %job_type,
            job_id = %job.job_id,
            processed = job.progress.processed,
            cursor = ?job.cursor,
            "Unit committed"
        );
        self.emit(MessageKind::Progress, EventPayload::unit(&job));

        match unit.outcome {
            UnitOutcome::Succeeded => {}
            UnitOutcome::Flagged { message } => {
                let alert = Alert::new(job.job_id, job_type, unit.unit_id.clone(), message.clone());
                if let Err(e) = self.bridge.append_alert(&alert).await {
                    log_error(
                        "orchestrator",
                        "append_alert",
                        &e.to_string(),
                        Some(job_type.as_str()),
                    );
                }
                self.emit(
                    MessageKind::Alert,
                    EventPayload::unit(&job).with_unit(unit.unit_id, message),
                );
            }
            UnitOutcome::Failed { reason } => {
                warn!(
                    job_type = %job_type,
                    unit_id = %unit.unit_id,
                    attempts = unit.attempts,
                    reason = %reason,
                    "Unit recorded as failed item"
                );
                self.emit(
                    MessageKind::Log,
                    EventPayload::unit(&job).with_unit(unit.unit_id, reason),
                );
            }
        }
    }

    /// Runner-driven `Complete` or `Fail`
    async fn finish(&mut self, job_type: JobType, event: JobEvent) {
        let Some(managed) = self.jobs.get(&job_type) else {
            return;
        };

        let kind = match event {
            JobEvent::Complete => MessageKind::Complete,
            _ => MessageKind::Failed,
        };

        let failure = event.error_message().map(str::to_owned);
        let mut next = managed.machine.clone();
        if let Err(e) = next.transition(event) {
            error!(job_type = %job_type, error = %e, "Runner transition rejected");
            return;
        }

        if let Err(e) = self.bridge.save(next.job()).await {
            let reason = match &failure {
                Some(failure) => format!("could not persist failed job ({failure}): {e}"),
                None => format!("could not persist {} job: {e}", next.current_state()),
            };
            self.force_pause(job_type, PauseOrigin::PersistenceFailure, reason)
                .await;
            return;
        }

        let job = next.job().clone();
        if let Some(managed) = self.jobs.get_mut(&job_type) {
            managed.token.cancel();
            managed.machine = next;
        }

        log_job_operation(
            "finish",
            Some(job.job_id),
            job_type,
            &job.state.to_string(),
            job.last_error.as_deref(),
        );

        let mut payload = EventPayload::from_job(&job);
        if let Some(reason) = failure {
            payload = payload.with_reason(reason);
        }
        self.emit(kind, payload);
    }

    /// Runner-driven pause; nothing from the interrupted unit is applied and
    /// the job waits for the operator
    async fn force_pause(&mut self, job_type: JobType, origin: PauseOrigin, reason: String) {
        log_error("orchestrator", "force_pause", &reason, Some(job_type.as_str()));

        let job = {
            let Some(managed) = self.jobs.get_mut(&job_type) else {
                return;
            };
            if let Err(e) = managed.machine.transition(JobEvent::Pause(origin)) {
                error!(job_type = %job_type, error = %e, "Could not force a pause");
                return;
            }
            managed.machine.job_mut().last_error = Some(reason.clone());
            managed.token.pause();
            managed.machine.job().clone()
        };

        if let Err(e) = self.bridge.save(&job).await {
            warn!(job_type = %job_type, origin = ?origin, error = %e, "Forced pause could not be persisted");
        }

        self.emit(
            MessageKind::Paused,
            EventPayload::from_job(&job).with_reason(reason),
        );
    }

    /// Persist every job snapshot, e.g. before the process is suspended
    pub async fn flush(&self) -> OrchestrationResult<()> {
        let mut first_error = None;

        for managed in self.jobs.values() {
            if let Err(e) = self.bridge.save(managed.machine.job()).await {
                log_error(
                    "orchestrator",
                    "flush",
                    &e.to_string(),
                    Some(managed.machine.job_type().as_str()),
                );
                first_error.get_or_insert(e);
            }
        }

        info!(jobs = self.jobs.len(), "Flushed job snapshots");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn emit(&mut self, kind: MessageKind, payload: EventPayload) {
        let message_type = MessageType::new(kind, payload.job_type);
        let delivered = self
            .publisher
            .publish(&Message::event(message_type, payload.to_value()));
        debug!(message_type = %message_type, delivered = delivered, "Event published");
    }
}
