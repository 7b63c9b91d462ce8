//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the decision provenance domain.

mod ids;
mod timestamp;
mod score;
mod state_machine;
mod errors;

pub use ids::{AgentId, AuditId, DecisionId, EntryId, OrganizationId, PolicyId, ProposalId, UserId};
pub use timestamp::Timestamp;
pub use score::Score;
pub use state_machine::StateMachine;
pub use errors::{DomainError, ErrorCode, ValidationError};
