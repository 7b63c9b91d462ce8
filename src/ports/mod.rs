//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SnapshotStore` - durable key-value persistence for the ledger snapshot
//! - `ReviewAnalyst` - analysis capability behind per-role reviews, with a
//!   mandatory deterministic fallback so review always completes
//! - `AttestationSigner` - cryptographic digest for externally-verifiable
//!   export attestation, off the append critical path

mod snapshot_store;
mod review_analyst;
mod attestation_signer;

pub use snapshot_store::{SnapshotStore, SnapshotStoreError};
pub use review_analyst::{AnalystError, AnalystInfo, ReviewAnalyst, ReviewAssessment, ReviewRequest};
pub use attestation_signer::{AttestationSigner, SignerError};
