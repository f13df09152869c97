use super::errors::{write_failed, PersistenceError, PersistenceResult};
use super::store::KeyValueStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// JSON-file store that replaces the file atomically on every write
///
/// The full map is written to a sibling temp file and renamed over the
/// target, so a crash mid-write leaves the previous snapshot readable.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl FileStore {
    /// Open the store at `path`, loading existing contents if the file exists
    pub async fn open(path: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| PersistenceError::Corrupt {
                key: path.display().to_string(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened file store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_snapshot(&self, key: &str, entries: &BTreeMap<String, Value>) -> PersistenceResult<()> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp_path = self.path.with_extension("tmp");

        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| write_failed(key, e.to_string()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| write_failed(key, e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> PersistenceResult<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> PersistenceResult<()> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);

        self.write_snapshot(key, &next).await?;
        *entries = next;
        Ok(())
    }

    async fn remove(&self, key: &str) -> PersistenceResult<()> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);

        self.write_snapshot(key, &next).await?;
        *entries = next;
        Ok(())
    }

    async fn get_all(&self, prefix: &str) -> PersistenceResult<BTreeMap<String, Value>> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}
