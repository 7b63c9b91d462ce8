//! In-Memory Snapshot Store Adapter
//!
//! Stores ledger snapshots in memory. Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::ledger::LedgerSnapshot;
use crate::ports::{SnapshotStore, SnapshotStoreError};

/// In-memory storage for ledger snapshots.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotStore {
    snapshots: Arc<RwLock<HashMap<String, LedgerSnapshot>>>,
}

impl InMemorySnapshotStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored snapshots (useful for tests).
    pub async fn clear(&self) {
        self.snapshots.write().await.clear();
    }

    /// Number of stored snapshots.
    pub async fn count(&self) -> usize {
        self.snapshots.read().await.len()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(&self, key: &str, snapshot: &LedgerSnapshot) -> Result<(), SnapshotStoreError> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(key.to_string(), snapshot.clone());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<LedgerSnapshot, SnapshotStoreError> {
        let snapshots = self.snapshots.read().await;
        snapshots
            .get(key)
            .cloned()
            .ok_or_else(|| SnapshotStoreError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, SnapshotStoreError> {
        Ok(self.snapshots.read().await.contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<(), SnapshotStoreError> {
        self.snapshots.write().await.remove(key);
        Ok(())
    }
}
