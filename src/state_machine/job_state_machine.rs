use super::{
    errors::{invalid_transition, StateMachineResult},
    events::JobEvent,
    guards::TransitionGuard,
    states::{JobState, PauseOrigin},
};
use crate::constants::JobType;
use crate::models::Job;

/// Lifecycle state machine, instantiated once per job
///
/// The machine owns the `Job` it governs so that a transition and its side
/// effects on the job (cursor disposal, pause origin, failure reason) are
/// applied together. The orchestrator transitions a clone, persists it, and
/// only then swaps it in, so a failed write leaves the previous state intact.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStateMachine {
    job: Job,
}

impl JobStateMachine {
    /// Wrap a job, new (`Idle`) or rehydrated from a snapshot
    pub fn new(job: Job) -> Self {
        Self { job }
    }

    pub fn current_state(&self) -> JobState {
        self.job.state
    }

    pub fn job_type(&self) -> JobType {
        self.job.job_type
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Mutable access for unit commits; state changes go through `transition`
    pub fn job_mut(&mut self) -> &mut Job {
        &mut self.job
    }

    /// Attempt to transition the job state
    pub fn transition(&mut self, event: JobEvent) -> StateMachineResult<JobState> {
        let current_state = self.job.state;
        let target_state = self.determine_target_state(current_state, &event)?;

        TransitionGuard::can_transition(current_state, target_state, &event)?;

        tracing::debug!(
            job_type = %self.job.job_type,
            job_id = %self.job.job_id,
            from = %current_state,
            to = %target_state,
            event = event.event_type(),
            "Job state transition"
        );

        self.apply(target_state, event);
        Ok(target_state)
    }

    /// Determine the target state based on current state and event
    pub fn determine_target_state(
        &self,
        current_state: JobState,
        event: &JobEvent,
    ) -> StateMachineResult<JobState> {
        use JobEvent::*;
        use JobState::*;

        let target = match (current_state, event) {
            (Idle, Start) => Running,

            (Running, Pause(_)) => Paused,
            (Paused, Resume) => Running,

            (Running | Paused, Stop | Terminate | Reset) => Cancelled,

            (Running, Complete) => Completed,
            (Running, Fail(_)) => Failed,

            (from_state, event) => {
                return Err(invalid_transition(
                    self.job.job_type,
                    from_state,
                    event.event_type(),
                ))
            }
        };

        Ok(target)
    }

    fn apply(&mut self, target_state: JobState, event: JobEvent) {
        if event.discards_cursor() {
            self.job.cursor = None;
        }

        self.job.pause_origin = match event {
            JobEvent::Pause(origin) => Some(origin),
            _ => None,
        };

        match event {
            JobEvent::Fail(reason) => self.job.last_error = Some(reason),
            JobEvent::Start | JobEvent::Resume => self.job.last_error = None,
            _ => {}
        }

        self.job.state = target_state;
        self.job.touch();
    }

    /// Paused jobs that were suspended with the process rather than by the operator
    pub fn is_suspended(&self) -> bool {
        self.job.state == JobState::Paused && self.job.pause_origin == Some(PauseOrigin::Suspension)
    }
}
