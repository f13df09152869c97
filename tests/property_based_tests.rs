use proptest::prelude::*;
use sellerbot_core::constants::{JobType, MessageKind, MessageType, CATALOG};
use sellerbot_core::messaging::{Message, ProtocolError};
use sellerbot_core::models::{Cursor, Job, JobSettings};
use sellerbot_core::state_machine::{JobEvent, JobState, JobStateMachine, PauseOrigin};

fn job_type_strategy() -> impl Strategy<Value = JobType> {
    prop::sample::select(JobType::ALL.to_vec())
}

fn pause_origin_strategy() -> impl Strategy<Value = PauseOrigin> {
    prop_oneof![
        Just(PauseOrigin::Operator),
        Just(PauseOrigin::Suspension),
        Just(PauseOrigin::PersistenceFailure),
        Just(PauseOrigin::CollaboratorUnavailable),
    ]
}

fn event_strategy() -> impl Strategy<Value = JobEvent> {
    prop_oneof![
        Just(JobEvent::Start),
        pause_origin_strategy().prop_map(JobEvent::Pause),
        Just(JobEvent::Resume),
        Just(JobEvent::Stop),
        Just(JobEvent::Terminate),
        Just(JobEvent::Reset),
        Just(JobEvent::Complete),
        "[a-z ]{0,12}".prop_map(JobEvent::Fail),
    ]
}

fn running_job(job_type: JobType, cursor: u64) -> JobStateMachine {
    let mut machine = JobStateMachine::new(Job::new(
        job_type,
        JobSettings::default(),
        Some(Cursor::new(cursor)),
    ));
    machine.transition(JobEvent::Start).unwrap();
    machine
}

proptest! {
    /// Property: once a job is terminal, every further event is rejected
    #[test]
    fn terminal_states_are_absorbing(
        job_type in job_type_strategy(),
        events in prop::collection::vec(event_strategy(), 1..40),
    ) {
        let mut machine = JobStateMachine::new(Job::new(job_type, JobSettings::default(), None));
        let mut terminal: Option<Job> = None;

        for event in events {
            let result = machine.transition(event);
            if let Some(frozen) = &terminal {
                prop_assert!(result.is_err());
                prop_assert_eq!(machine.job(), frozen);
            } else if machine.current_state().is_terminal() {
                terminal = Some(machine.job().clone());
            }
        }
    }

    /// Property: a rejected event leaves the job untouched
    #[test]
    fn rejected_events_do_not_mutate(
        job_type in job_type_strategy(),
        events in prop::collection::vec(event_strategy(), 1..40),
    ) {
        let mut machine = JobStateMachine::new(Job::new(job_type, JobSettings::default(), None));

        for event in events {
            let before = machine.job().clone();
            if machine.transition(event).is_err() {
                prop_assert_eq!(machine.job(), &before);
            }
        }
    }

    /// Property: a pause origin is recorded exactly while the job is paused
    #[test]
    fn pause_origin_tracks_paused_state(
        job_type in job_type_strategy(),
        events in prop::collection::vec(event_strategy(), 1..40),
    ) {
        let mut machine = JobStateMachine::new(Job::new(job_type, JobSettings::default(), None));

        for event in events {
            let _ = machine.transition(event);
            let job = machine.job();
            prop_assert_eq!(job.pause_origin.is_some(), job.state == JobState::Paused);
        }
    }

    /// Property: only terminate and reset throw the cursor away
    #[test]
    fn cursor_survives_everything_but_terminate_and_reset(
        job_type in job_type_strategy(),
        cursor in 0u64..10_000,
        pause_first in any::<bool>(),
        event in event_strategy(),
    ) {
        let mut machine = running_job(job_type, cursor);
        if pause_first {
            machine.transition(JobEvent::Pause(PauseOrigin::Operator)).unwrap();
        }

        let discards = event.discards_cursor();
        if machine.transition(event).is_ok() && discards {
            prop_assert!(machine.job().cursor.is_none());
        } else {
            prop_assert_eq!(machine.job().cursor.clone(), Some(Cursor::new(cursor)));
        }
    }

    /// Property: a failure is accepted only with a non-blank reason
    #[test]
    fn failures_require_a_reason(job_type in job_type_strategy(), reason in "[a-z ]{0,12}") {
        let mut machine = running_job(job_type, 0);
        let result = machine.transition(JobEvent::Fail(reason.clone()));

        if reason.trim().is_empty() {
            prop_assert!(result.is_err());
            prop_assert_eq!(machine.current_state(), JobState::Running);
        } else {
            prop_assert_eq!(result.unwrap(), JobState::Failed);
            prop_assert_eq!(machine.job().last_error.clone(), Some(reason));
        }
    }

    /// Property: names outside the catalog never resolve
    #[test]
    fn unknown_wire_names_are_rejected(name in "[A-Z_]{1,24}") {
        let known = CATALOG.iter().any(|(_, wire)| *wire == name);
        prop_assert_eq!(MessageType::from_wire(&name).is_some(), known);

        if !known {
            let json = serde_json::json!({ "type": name }).to_string();
            let is_unknown = matches!(
                Message::from_json(&json),
                Err(ProtocolError::UnknownMessageType { .. })
            );
            prop_assert!(is_unknown);
        }
    }

    /// Property: each (kind, job type) pair has a wire name under its own prefix
    #[test]
    fn wire_names_carry_the_job_prefix(
        job_type in job_type_strategy(),
        kind_index in 0usize..CATALOG.len(),
    ) {
        let kind: MessageKind = CATALOG[kind_index].0.kind;
        let message_type = MessageType::new(kind, job_type);
        let wire = message_type.wire_name();

        prop_assert!(wire.contains(job_type.wire_prefix()));
        prop_assert_eq!(MessageType::from_wire(wire), Some(message_type));
    }
}
