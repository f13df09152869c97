use super::errors::PersistenceResult;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;

/// Durable key/value collaborator (the host's extension storage)
///
/// Every `set` replaces the whole value under its key; readers never observe
/// a partially written value.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PersistenceResult<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> PersistenceResult<()>;

    async fn remove(&self, key: &str) -> PersistenceResult<()>;

    /// Every entry whose key starts with `prefix`
    async fn get_all(&self, prefix: &str) -> PersistenceResult<BTreeMap<String, Value>>;
}

/// Process-local store; contents survive as long as the value is shared
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> PersistenceResult<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> PersistenceResult<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> PersistenceResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn get_all(&self, prefix: &str) -> PersistenceResult<BTreeMap<String, Value>> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = InMemoryStore::new();

        store.set("job:monitor", json!({"processed": 1})).await.unwrap();
        assert_eq!(
            store.get("job:monitor").await.unwrap(),
            Some(json!({"processed": 1}))
        );

        store.set("job:monitor", json!({"processed": 2})).await.unwrap();
        assert_eq!(
            store.get("job:monitor").await.unwrap(),
            Some(json!({"processed": 2}))
        );

        store.remove("job:monitor").await.unwrap();
        assert_eq!(store.get("job:monitor").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_get_all_filters_by_prefix() {
        let store = InMemoryStore::new();
        store.set("job:monitor", json!(1)).await.unwrap();
        store.set("job:tracker", json!(2)).await.unwrap();
        store.set("settings:monitor", json!(3)).await.unwrap();

        let jobs = store.get_all("job:").await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs.contains_key("job:monitor"));
        assert!(jobs.contains_key("job:tracker"));
    }
}
