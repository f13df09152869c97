use super::errors::{GuardError, GuardResult};
use super::events::JobEvent;
use super::states::JobState;
use crate::models::Job;

/// Trait for implementing state transition guards
pub trait StateGuard<T> {
    /// Check if a transition is allowed
    fn check(&self, entity: &T) -> GuardResult<()>;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;
}

/// Guard enforcing at most one non-terminal job per job type
pub struct SingleActiveJobGuard;

impl StateGuard<Job> for SingleActiveJobGuard {
    fn check(&self, existing: &Job) -> GuardResult<()> {
        if existing.state.is_terminal() || existing.state == JobState::Idle {
            return Ok(());
        }
        Err(GuardError::AlreadyActive {
            job_type: existing.job_type,
            state: existing.state,
        })
    }

    fn description(&self) -> &'static str {
        "At most one running or paused job per job type"
    }
}

/// Guard to check the transition-specific invariants of an event
pub struct TransitionGuard;

impl TransitionGuard {
    pub fn can_transition(_from: JobState, _to: JobState, event: &JobEvent) -> GuardResult<()> {
        if let JobEvent::Fail(reason) = event {
            if reason.trim().is_empty() {
                return Err(GuardError::MissingReason);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::JobType;
    use crate::models::JobSettings;

    #[test]
    fn test_guard_descriptions() {
        assert_eq!(
            SingleActiveJobGuard.description(),
            "At most one running or paused job per job type"
        );
    }

    #[test]
    fn test_single_active_job_guard() {
        let mut job = Job::new(JobType::Tracker, JobSettings::default(), None);

        job.state = JobState::Running;
        assert!(matches!(
            SingleActiveJobGuard.check(&job),
            Err(GuardError::AlreadyActive { state: JobState::Running, .. })
        ));

        job.state = JobState::Paused;
        assert!(SingleActiveJobGuard.check(&job).is_err());

        for terminal in [JobState::Completed, JobState::Cancelled, JobState::Failed] {
            job.state = terminal;
            assert!(SingleActiveJobGuard.check(&job).is_ok());
        }
    }

    #[test]
    fn test_failure_requires_reason() {
        let blank = JobEvent::fail_with_error("  ");
        assert_eq!(
            TransitionGuard::can_transition(JobState::Running, JobState::Failed, &blank),
            Err(GuardError::MissingReason)
        );

        let reason = JobEvent::fail_with_error("session expired");
        assert!(TransitionGuard::can_transition(JobState::Running, JobState::Failed, &reason).is_ok());
    }
}
