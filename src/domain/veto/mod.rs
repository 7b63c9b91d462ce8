//! Veto module - policy-driven multi-reviewer governance.
//!
//! Proposals are evaluated against configured [`VetoPolicy`] trigger rules
//! to determine which reviewer roles must weigh in; per-role reviews are
//! aggregated into a final verdict where any blocking veto is a hard gate.

mod agent;
mod policy;
mod proposal;
mod review;

pub use agent::{registered_agent, registered_agents, ReviewerRole, VetoAgent};
pub use policy::{
    AmountOperator, PolicyEngine, ProposalFacts, TriggerCondition, VetoPolicy,
};
pub use proposal::{VetoDecision, VetoStatus};
pub use review::{Concern, ConcernSeverity, ReviewStatus, VetoReview};
