//! Ledger module - Tamper-evident, append-only decision provenance chain.
//!
//! The ledger owns the hash-linked sequence of [`LedgerEntry`] records and
//! the [`DecisionRecord`] index narrated by those entries. Appends are
//! serialized through a single writer; verification never repairs.

mod checksum;
mod entry;
mod decision;
mod audit;
mod store;

pub use checksum::{digest, GENESIS_HASH};
pub use entry::{AppendRequest, EventType, LedgerEntry, SensitivityLevel, Vote};
pub use decision::{ComplianceStatus, DecisionRecord, DecisionStatus, DecisionVerdict, VoteCast};
pub use audit::{AuditFinding, AuditRecord, AuditStatus, FindingSeverity};
pub use store::{
    AuditExport, ChainVerification, EntryFilter, ExportAttestation, HashChainLink, LedgerSnapshot,
    LedgerStore,
};
