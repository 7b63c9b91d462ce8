//! Adapters - implementations of the ports.

pub mod analyst;
pub mod signer;
pub mod storage;

pub use analyst::{FailoverReviewAnalyst, KeywordReviewAnalyst};
pub use signer::Sha256AttestationSigner;
pub use storage::{FileSnapshotStore, InMemorySnapshotStore};
