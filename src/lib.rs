//! Decision Ledger - Decision Provenance & Governance Core
//!
//! A tamper-evident, append-only ledger of decision-related events coupled
//! with a policy-driven multi-reviewer veto/approval engine that gates
//! proposals before they take effect.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
