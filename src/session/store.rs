use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Key under which the active session id is persisted.
pub const SESSION_ID_KEY: &str = "gameSessionId";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store contents are corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Key-value store that outlives a single controller, used to resume a
/// session id after a restart.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store; lives as long as the process.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with pre-populated entries
    pub fn with_entries(entries: Vec<(&str, &str)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// JSON-file store: a single object mapping keys to string values.
///
/// A missing file reads as empty. Writes go through a lock so concurrent
/// updates from one process don't interleave.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.load().await?;
        Ok(entries.get(key).cloned())
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await?;
        debug!(key = %key, "Persisted store entry");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
            debug!(key = %key, "Removed store entry");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_set_get_remove() {
        let store = InMemorySessionStore::new();
        assert_eq!(store.get(SESSION_ID_KEY).await.unwrap(), None);

        store.set(SESSION_ID_KEY, "17").await.unwrap();
        assert_eq!(
            store.get(SESSION_ID_KEY).await.unwrap().as_deref(),
            Some("17")
        );

        store.remove(SESSION_ID_KEY).await.unwrap();
        assert!(!store.contains(SESSION_ID_KEY).await);
    }

    #[tokio::test]
    async fn test_in_memory_remove_missing_key_is_ok() {
        let store = InMemorySessionStore::new();
        assert!(store.remove("nothing-here").await.is_ok());
    }

    #[tokio::test]
    async fn test_file_store_survives_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let first = FileSessionStore::new(&path);
        first.set(SESSION_ID_KEY, "99").await.unwrap();
        first.set("other", "value").await.unwrap();

        let reopened = FileSessionStore::new(&path);
        assert_eq!(
            reopened.get(SESSION_ID_KEY).await.unwrap().as_deref(),
            Some("99")
        );

        reopened.remove(SESSION_ID_KEY).await.unwrap();
        assert_eq!(first.get(SESSION_ID_KEY).await.unwrap(), None);
        assert_eq!(first.get("other").await.unwrap().as_deref(), Some("value"));
    }

    #[tokio::test]
    async fn test_file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get(SESSION_ID_KEY).await.unwrap(), None);
        assert!(store.remove(SESSION_ID_KEY).await.is_ok());
    }

    #[tokio::test]
    async fn test_file_store_reports_corrupt_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = FileSessionStore::new(&path);
        assert!(matches!(
            store.get(SESSION_ID_KEY).await,
            Err(StoreError::Corrupt(_))
        ));
    }
}
