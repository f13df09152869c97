//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use sellerbot_core::config::SellerbotConfig;
use sellerbot_core::constants::{JobType, MessageKind, MessageType};
use sellerbot_core::execution::{
    ActionOutcome, CollaboratorError, FetchOutcome, ScrapingCollaborator, WorkUnit,
};
use sellerbot_core::messaging::Message;
use sellerbot_core::models::{Cursor, JobSettings};
use sellerbot_core::orchestration::{CollaboratorRegistry, Orchestrator};
use sellerbot_core::persistence::errors::write_failed;
use sellerbot_core::persistence::{
    InMemoryStore, KeyValueStore, PersistenceBridge, PersistenceResult,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Serves units `item-0 .. item-{len-1}` with cursor = index
///
/// Action results can be scripted per index; unscripted calls succeed.
#[derive(Default)]
pub struct ScriptedCollaborator {
    len: u64,
    actions: Mutex<HashMap<u64, VecDeque<Result<ActionOutcome, CollaboratorError>>>>,
    fetch_failures: Mutex<HashMap<u64, CollaboratorError>>,
    attempts: Mutex<HashMap<u64, u32>>,
    completed: Mutex<Vec<String>>,
}

impl ScriptedCollaborator {
    pub fn new(len: u64) -> Self {
        Self {
            len,
            ..Self::default()
        }
    }

    /// Results returned, in order, by `apply_action` for unit `index`
    pub fn script(self, index: u64, results: Vec<Result<ActionOutcome, CollaboratorError>>) -> Self {
        self.actions.lock().insert(index, results.into());
        self
    }

    /// Every fetch of unit `index` fails with `error`
    pub fn fail_fetch(self, index: u64, error: CollaboratorError) -> Self {
        self.fetch_failures.lock().insert(index, error);
        self
    }

    /// Let fetches of unit `index` succeed again
    pub fn restore_fetch(&self, index: u64) {
        self.fetch_failures.lock().remove(&index);
    }

    /// Units whose action finished without an error, in order
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().clone()
    }

    pub fn attempts(&self, index: u64) -> u32 {
        self.attempts.lock().get(&index).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ScrapingCollaborator for ScriptedCollaborator {
    async fn fetch_next(
        &self,
        cursor: Option<&Cursor>,
        _settings: &JobSettings,
    ) -> Result<FetchOutcome, CollaboratorError> {
        let next = cursor
            .and_then(|cursor| cursor.value().as_u64())
            .map_or(0, |index| index + 1);
        if next >= self.len {
            return Ok(FetchOutcome::Exhausted);
        }
        if let Some(error) = self.fetch_failures.lock().get(&next) {
            return Err(error.clone());
        }
        Ok(FetchOutcome::Unit(
            WorkUnit::new(format!("item-{next}"), Cursor::new(next)).with_total(self.len),
        ))
    }

    async fn apply_action(
        &self,
        unit: &WorkUnit,
        _settings: &JobSettings,
    ) -> Result<ActionOutcome, CollaboratorError> {
        let index = unit.cursor.value().as_u64().unwrap_or_default();
        *self.attempts.lock().entry(index).or_default() += 1;

        let result = self
            .actions
            .lock()
            .get_mut(&index)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(ActionOutcome::Success));

        if result.is_ok() {
            self.completed.lock().push(unit.unit_id.clone());
        }
        result
    }
}

/// In-memory store whose writes can be switched off
#[derive(Default)]
pub struct FailingStore {
    inner: InMemoryStore,
    fail_writes: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    fn check(&self, key: &str) -> PersistenceResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failed(key, "storage quota exceeded"));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, key: &str) -> PersistenceResult<Option<Value>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> PersistenceResult<()> {
        self.check(key)?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> PersistenceResult<()> {
        self.check(key)?;
        self.inner.remove(key).await
    }

    async fn get_all(&self, prefix: &str) -> PersistenceResult<BTreeMap<String, Value>> {
        self.inner.get_all(prefix).await
    }
}

/// Defaults with millisecond backoff so retry tests stay fast
pub fn test_config() -> SellerbotConfig {
    let mut config = SellerbotConfig::default();
    config.backoff.initial_backoff_ms = 1;
    config.backoff.max_backoff_ms = 4;
    config.execution.unit_timeout_ms = 1_000;
    config
}

pub fn registry(job_type: JobType, collaborator: Arc<ScriptedCollaborator>) -> CollaboratorRegistry {
    CollaboratorRegistry::new().with(job_type, collaborator)
}

pub async fn orchestrator(
    store: Arc<dyn KeyValueStore>,
    registry: CollaboratorRegistry,
) -> Orchestrator {
    orchestrator_with_config(test_config(), store, registry).await
}

pub async fn orchestrator_with_config(
    config: SellerbotConfig,
    store: Arc<dyn KeyValueStore>,
    registry: CollaboratorRegistry,
) -> Orchestrator {
    let bridge = PersistenceBridge::new(store, config.alerts.max_retained);
    Orchestrator::bootstrap(Arc::new(config), bridge, registry)
        .await
        .expect("bootstrap")
}

pub fn control(kind: MessageKind, job_type: JobType, payload: Value) -> Message {
    Message::new(MessageType::new(kind, job_type), payload).with_origin("test-ui")
}

/// Everything currently queued for a listener
pub fn drain(receiver: &mut mpsc::UnboundedReceiver<Message>) -> Vec<Message> {
    std::iter::from_fn(|| receiver.try_recv().ok()).collect()
}

pub fn wire_names(events: &[Message]) -> Vec<&'static str> {
    events
        .iter()
        .map(|event| event.message_type().wire_name())
        .collect()
}

pub fn processed(event: &Message) -> u64 {
    event.payload()["processed"].as_u64().unwrap_or_default()
}

/// `processed` of every `*_PROGRESS` event, in order
pub fn progress_counts(events: &[Message]) -> Vec<u64> {
    events
        .iter()
        .filter(|event| event.message_type().kind == MessageKind::Progress)
        .map(processed)
        .collect()
}
