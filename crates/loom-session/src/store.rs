//! Record persistence
//!
//! - [`JsonFileStore`]: one JSON document on disk, replaced atomically
//! - [`MemoryStore`]: in-process store for tests and scratch sessions

use crate::error::StoreError;
use async_trait::async_trait;
use loom_core::SessionRecord;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Destination for session records
#[async_trait]
pub trait RecordStore: Send + Sync + Debug {
    /// # Errors
    /// Returns [`StoreError`] if the record cannot be written
    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;

    /// The stored record, or `None` if nothing was saved yet
    ///
    /// # Errors
    /// Returns [`StoreError`] if the record exists but cannot be read
    async fn load(&self) -> Result<Option<SessionRecord>, StoreError>;
}

/// Pretty-printed JSON file
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so readers never observe a half-written record.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(record)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, &json).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), bytes = json.len(), "saved session record");
        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionRecord>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps the latest record in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<SessionRecord>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves
    #[inline]
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn latest(&self) -> Option<SessionRecord> {
        self.record.lock().clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        *self.record.lock() = Some(record.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.record.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::{LoomTree, NodeId, NodeType};

    fn record() -> SessionRecord {
        let mut tree = LoomTree::new();
        let a = tree
            .create_node(NodeType::User, NodeId::ROOT, "saved text", "")
            .unwrap();
        SessionRecord::new(tree.serialize(), a)
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("session.json"));
        assert!(store.load().await.unwrap().is_none());

        let record = record();
        store.save(&record).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(record));
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let result = JsonFileStore::new(path).load().await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn memory_store_counts_saves() {
        let store = MemoryStore::new();
        store.save(&record()).await.unwrap();
        store.save(&record()).await.unwrap();
        assert_eq!(store.save_count(), 2);
        assert!(store.load().await.unwrap().is_some());
    }
}
