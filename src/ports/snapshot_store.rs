//! Snapshot Store Port - Interface for persisting the ledger snapshot.
//!
//! The ledger persists as a single blob per key: the full entry chain plus
//! the decision index. Implementations may be in-memory, file-backed, or
//! database-backed.

use async_trait::async_trait;

use crate::domain::ledger::LedgerSnapshot;

/// Errors that can occur during snapshot storage operations.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotStoreError {
    #[error("Snapshot not found for key: {0}")]
    NotFound(String),

    #[error("Failed to serialize snapshot: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize snapshot: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for persisting and loading ledger snapshots by a stable key.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Save the snapshot under a key, replacing any previous value.
    async fn save(&self, key: &str, snapshot: &LedgerSnapshot) -> Result<(), SnapshotStoreError>;

    /// Load the snapshot stored under a key.
    ///
    /// # Errors
    /// Returns `SnapshotStoreError::NotFound` if no snapshot exists.
    async fn load(&self, key: &str) -> Result<LedgerSnapshot, SnapshotStoreError>;

    /// Check whether a snapshot exists for a key.
    async fn exists(&self, key: &str) -> Result<bool, SnapshotStoreError>;

    /// Delete the snapshot stored under a key, if any.
    async fn delete(&self, key: &str) -> Result<(), SnapshotStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_store_error_not_found_display() {
        let err = SnapshotStoreError::NotFound("ledger".to_string());
        assert!(err.to_string().contains("Snapshot not found"));
        assert!(err.to_string().contains("ledger"));
    }

    #[test]
    fn snapshot_store_error_serialization_display() {
        let err = SnapshotStoreError::SerializationFailed("bad value".to_string());
        assert!(err.to_string().contains("serialize"));
    }
}
