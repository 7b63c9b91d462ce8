//! Snapshot store adapters.

mod in_memory_snapshot_store;
mod file_snapshot_store;

pub use in_memory_snapshot_store::InMemorySnapshotStore;
pub use file_snapshot_store::FileSnapshotStore;
