//! File-based Snapshot Store Adapter
//!
//! Stores ledger snapshots as JSON files on disk, one file per key.
//! Timestamps serialize as ISO-8601 strings, matching the snapshot wire
//! format.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::ledger::LedgerSnapshot;
use crate::ports::{SnapshotStore, SnapshotStoreError};

/// File-based storage for ledger snapshots.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    base_path: PathBuf,
}

impl FileSnapshotStore {
    /// Create a new file store with a base directory.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// File path for a key.
    fn snapshot_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }

    /// Ensure the base directory exists.
    async fn ensure_dir(&self) -> Result<(), SnapshotStoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| SnapshotStoreError::IoError(e.to_string()))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, key: &str, snapshot: &LedgerSnapshot) -> Result<(), SnapshotStoreError> {
        self.ensure_dir().await?;

        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| SnapshotStoreError::SerializationFailed(e.to_string()))?;

        fs::write(self.snapshot_path(key), json)
            .await
            .map_err(|e| SnapshotStoreError::IoError(e.to_string()))?;

        Ok(())
    }

    async fn load(&self, key: &str) -> Result<LedgerSnapshot, SnapshotStoreError> {
        let path = self.snapshot_path(key);
        if !path.exists() {
            return Err(SnapshotStoreError::NotFound(key.to_string()));
        }

        let json = fs::read(&path)
            .await
            .map_err(|e| SnapshotStoreError::IoError(e.to_string()))?;

        serde_json::from_slice(&json)
            .map_err(|e| SnapshotStoreError::DeserializationFailed(e.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, SnapshotStoreError> {
        Ok(self.snapshot_path(key).exists())
    }

    async fn delete(&self, key: &str) -> Result<(), SnapshotStoreError> {
        let path = self.snapshot_path(key);
        if path.exists() {
            fs::remove_file(path)
                .await
                .map_err(|e| SnapshotStoreError::IoError(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{AgentId, OrganizationId};
    use crate::domain::ledger::LedgerStore;

    async fn populated_snapshot() -> LedgerSnapshot {
        let store = LedgerStore::new(OrganizationId::new("org-test").unwrap());
        store
            .create_decision("A", "d", AgentId::new("p").unwrap(), vec![])
            .await;
        store.snapshot().await
    }

    #[tokio::test]
    async fn save_and_load_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        let snapshot = populated_snapshot().await;
        store.save("ledger", &snapshot).await.unwrap();

        let loaded = store.load("ledger").await.unwrap();
        assert_eq!(loaded.sequence, snapshot.sequence);
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].hash, snapshot.entries[0].hash);
        assert_eq!(loaded.decisions.len(), 1);
    }

    #[tokio::test]
    async fn load_missing_key_returns_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let result = store.load("absent").await;
        assert!(matches!(result, Err(SnapshotStoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn corrupt_file_is_a_deserialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        tokio::fs::write(dir.path().join("ledger.json"), b"not json")
            .await
            .unwrap();

        let result = store.load("ledger").await;
        assert!(matches!(
            result,
            Err(SnapshotStoreError::DeserializationFailed(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        store.save("ledger", &populated_snapshot().await).await.unwrap();
        assert!(store.exists("ledger").await.unwrap());

        store.delete("ledger").await.unwrap();
        assert!(!store.exists("ledger").await.unwrap());

        // Deleting again is a no-op.
        store.delete("ledger").await.unwrap();
    }

    #[tokio::test]
    async fn snapshot_file_contains_iso8601_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        store.save("ledger", &populated_snapshot().await).await.unwrap();

        let raw = tokio::fs::read_to_string(dir.path().join("ledger.json"))
            .await
            .unwrap();
        assert!(raw.contains("\"timestamp\""));
        assert!(raw.contains('T'), "timestamps should be ISO-8601 strings");
    }
}
