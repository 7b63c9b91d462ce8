//! Ledger entry - an immutable fact about something that happened.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use crate::domain::foundation::{
    AgentId, DecisionId, EntryId, OrganizationId, Score, Timestamp, UserId,
};

use super::checksum;

/// Closed enumeration of everything the ledger can record.
///
/// Wire names use the dotted `subject.action` convention so entries remain
/// greppable in exported reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "decision.proposed")]
    DecisionProposed,
    #[serde(rename = "agent.contributed")]
    AgentContributed,
    #[serde(rename = "agent.voted")]
    AgentVoted,
    #[serde(rename = "agent.vetoed")]
    AgentVetoed,
    #[serde(rename = "decision.approved")]
    DecisionApproved,
    #[serde(rename = "decision.rejected")]
    DecisionRejected,
    #[serde(rename = "decision.vetoed")]
    DecisionVetoed,
    #[serde(rename = "decision.executed")]
    DecisionExecuted,
    #[serde(rename = "decision.outcome_recorded")]
    OutcomeRecorded,
    #[serde(rename = "audit.requested")]
    AuditRequested,
    #[serde(rename = "audit.started")]
    AuditStarted,
    #[serde(rename = "audit.completed")]
    AuditCompleted,
    #[serde(rename = "audit.failed")]
    AuditFailed,
    #[serde(rename = "proposal.submitted")]
    ProposalSubmitted,
    #[serde(rename = "review.completed")]
    ReviewCompleted,
    #[serde(rename = "override.requested")]
    OverrideRequested,
    #[serde(rename = "override.approved")]
    OverrideApproved,
    #[serde(rename = "override.denied")]
    OverrideDenied,
}

impl EventType {
    /// Returns the wire name (e.g. `"decision.proposed"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::DecisionProposed => "decision.proposed",
            EventType::AgentContributed => "agent.contributed",
            EventType::AgentVoted => "agent.voted",
            EventType::AgentVetoed => "agent.vetoed",
            EventType::DecisionApproved => "decision.approved",
            EventType::DecisionRejected => "decision.rejected",
            EventType::DecisionVetoed => "decision.vetoed",
            EventType::DecisionExecuted => "decision.executed",
            EventType::OutcomeRecorded => "decision.outcome_recorded",
            EventType::AuditRequested => "audit.requested",
            EventType::AuditStarted => "audit.started",
            EventType::AuditCompleted => "audit.completed",
            EventType::AuditFailed => "audit.failed",
            EventType::ProposalSubmitted => "proposal.submitted",
            EventType::ReviewCompleted => "review.completed",
            EventType::OverrideRequested => "override.requested",
            EventType::OverrideApproved => "override.approved",
            EventType::OverrideDenied => "override.denied",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ballot cast on a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Approve,
    Reject,
    Abstain,
    Veto,
}

impl Vote {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vote::Approve => "approve",
            Vote::Reject => "reject",
            Vote::Abstain => "abstain",
            Vote::Veto => "veto",
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Data sensitivity classification, governing default retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityLevel {
    Public,
    Internal,
    Confidential,
    Restricted,
}

impl SensitivityLevel {
    /// Default retention window in days for entries at this level.
    pub fn default_retention_days(&self) -> u32 {
        match self {
            SensitivityLevel::Public => 365,
            SensitivityLevel::Internal => 365 * 3,
            SensitivityLevel::Confidential => 365 * 7,
            SensitivityLevel::Restricted => 365 * 10,
        }
    }
}

impl Default for SensitivityLevel {
    fn default() -> Self {
        SensitivityLevel::Internal
    }
}

/// An immutable fact in the append-only chain.
///
/// # Invariants
///
/// - `sequence` is assigned by the store and strictly increasing.
/// - `hash` commits to the canonical fields (see [`LedgerEntry::canonical_bytes`]);
///   `previous_hash` commits to the prior entry, forming the chain.
/// - Only the `verified*` fields ever change after creation, and only after
///   an independent hash check succeeds. Entries are never deleted;
///   `retention_period_days` governs disposal policy, not ledger mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub sequence: u64,
    pub timestamp: Timestamp,
    pub event_type: EventType,
    pub decision_id: DecisionId,
    pub organization_id: OrganizationId,
    pub user_id: Option<UserId>,
    pub agent_id: Option<AgentId>,
    pub title: String,
    pub description: String,

    /// Free-form payload, opaque to the ledger. Expected shape per
    /// `event_type` is a convention between callers, not a contract.
    pub data: Map<String, JsonValue>,

    pub confidence_score: Option<Score>,
    pub vote: Option<Vote>,
    pub vote_weight: Option<f64>,

    pub previous_hash: String,
    pub hash: String,

    pub compliance_frameworks: Vec<String>,
    pub retention_period_days: u32,
    pub sensitivity_level: SensitivityLevel,
    pub pii_involved: bool,

    pub verified: bool,
    pub verified_at: Option<Timestamp>,
    pub verified_by: Option<String>,
}

/// Canonical hash input. Field order is fixed; volatile fields
/// (`verified*`) and `hash` itself are excluded.
#[derive(Serialize)]
struct CanonicalFields<'a> {
    id: &'a EntryId,
    sequence: u64,
    timestamp: String,
    event_type: &'a EventType,
    decision_id: &'a DecisionId,
    previous_hash: &'a str,
    data: &'a Map<String, JsonValue>,
}

impl LedgerEntry {
    /// Serializes the canonical fields this entry's hash commits to.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let canonical = CanonicalFields {
            id: &self.id,
            sequence: self.sequence,
            timestamp: self.timestamp.to_rfc3339(),
            event_type: &self.event_type,
            decision_id: &self.decision_id,
            previous_hash: &self.previous_hash,
            data: &self.data,
        };
        // Struct field order is fixed, so the serialization is canonical.
        serde_json::to_vec(&canonical).unwrap_or_default()
    }

    /// Recomputes the integrity digest from the canonical fields.
    pub fn compute_hash(&self) -> String {
        checksum::digest(&self.canonical_bytes())
    }

    /// Marks this entry verified after a successful independent hash check.
    ///
    /// The one mutation entries allow.
    pub(crate) fn mark_verified(&mut self, verified_by: impl Into<String>) {
        self.verified = true;
        self.verified_at = Some(Timestamp::now());
        self.verified_by = Some(verified_by.into());
    }
}

/// Everything a caller supplies to `LedgerStore::append`.
///
/// Sequence, hashes, timestamps, and the owning organization are
/// store-assigned and absent here.
#[derive(Debug, Clone)]
pub struct AppendRequest {
    pub event_type: EventType,
    pub decision_id: DecisionId,
    pub title: String,
    pub description: String,
    pub data: Map<String, JsonValue>,
    pub user_id: Option<UserId>,
    pub agent_id: Option<AgentId>,
    pub confidence_score: Option<Score>,
    pub vote: Option<Vote>,
    pub vote_weight: Option<f64>,
    pub compliance_frameworks: Vec<String>,
    pub retention_period_days: Option<u32>,
    pub sensitivity_level: SensitivityLevel,
    pub pii_involved: bool,
}

impl AppendRequest {
    /// Creates a request with required fields; everything else defaults.
    pub fn new(
        event_type: EventType,
        decision_id: DecisionId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            decision_id,
            title: title.into(),
            description: description.into(),
            data: Map::new(),
            user_id: None,
            agent_id: None,
            confidence_score: None,
            vote: None,
            vote_weight: None,
            compliance_frameworks: Vec::new(),
            retention_period_days: None,
            sensitivity_level: SensitivityLevel::default(),
            pii_involved: false,
        }
    }

    /// Sets the opaque payload.
    pub fn with_data(mut self, data: Map<String, JsonValue>) -> Self {
        self.data = data;
        self
    }

    /// Inserts one payload field.
    pub fn with_data_field(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Attributes the entry to an agent.
    pub fn with_agent(mut self, agent_id: AgentId) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    /// Attributes the entry to a user.
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Records a confidence score alongside the event.
    pub fn with_confidence(mut self, score: Score) -> Self {
        self.confidence_score = Some(score);
        self
    }

    /// Records a vote alongside the event.
    pub fn with_vote(mut self, vote: Vote) -> Self {
        self.vote = Some(vote);
        self
    }

    /// Records a vote weight.
    pub fn with_vote_weight(mut self, weight: f64) -> Self {
        self.vote_weight = Some(weight);
        self
    }

    /// Tags the entry with compliance frameworks (e.g. GDPR, SOX).
    pub fn with_frameworks(mut self, frameworks: Vec<String>) -> Self {
        self.compliance_frameworks = frameworks;
        self
    }

    /// Overrides the retention window; defaults per sensitivity level.
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_period_days = Some(days);
        self
    }

    /// Sets the sensitivity classification.
    pub fn with_sensitivity(mut self, level: SensitivityLevel) -> Self {
        self.sensitivity_level = level;
        self
    }

    /// Flags the entry as involving personally identifiable information.
    pub fn with_pii(mut self, pii: bool) -> Self {
        self.pii_involved = pii;
        self
    }
}
