//! Decision record aggregate - the evolving subject ledger entries describe.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    AgentId, DecisionId, DomainError, EntryId, Score, StateMachine, Timestamp,
};

use super::audit::AuditRecord;
use super::entry::Vote;

/// Lifecycle status of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Proposed,
    Deliberating,
    Voting,
    Approved,
    Rejected,
    Vetoed,
    Executed,
}

impl StateMachine for DecisionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use DecisionStatus::*;
        matches!(
            (self, target),
            (Proposed, Deliberating)
                | (Proposed, Voting)
                | (Proposed, Approved)
                | (Proposed, Rejected)
                | (Proposed, Vetoed)
                | (Deliberating, Voting)
                | (Deliberating, Approved)
                | (Deliberating, Rejected)
                | (Deliberating, Vetoed)
                | (Voting, Approved)
                | (Voting, Rejected)
                | (Voting, Vetoed)
                | (Approved, Executed)
                | (Rejected, Executed)
                | (Vetoed, Executed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use DecisionStatus::*;
        match self {
            Proposed => vec![Deliberating, Voting, Approved, Rejected, Vetoed],
            Deliberating => vec![Voting, Approved, Rejected, Vetoed],
            Voting => vec![Approved, Rejected, Vetoed],
            Approved | Rejected | Vetoed => vec![Executed],
            Executed => vec![],
        }
    }
}

impl DecisionStatus {
    /// True once a verdict has been reached (or executed).
    pub fn is_finalized(&self) -> bool {
        matches!(
            self,
            DecisionStatus::Approved
                | DecisionStatus::Rejected
                | DecisionStatus::Vetoed
                | DecisionStatus::Executed
        )
    }
}

/// The three verdicts a finalize call may set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionVerdict {
    Approved,
    Rejected,
    Vetoed,
}

impl DecisionVerdict {
    /// The decision status this verdict resolves to.
    pub fn as_status(&self) -> DecisionStatus {
        match self {
            DecisionVerdict::Approved => DecisionStatus::Approved,
            DecisionVerdict::Rejected => DecisionStatus::Rejected,
            DecisionVerdict::Vetoed => DecisionStatus::Vetoed,
        }
    }
}

/// Compliance standing derived from completed audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Pending,
    Compliant,
    ReviewNeeded,
    Violation,
}

/// One ballot recorded against a decision, in cast order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteCast {
    pub agent_id: AgentId,
    pub vote: Vote,
    pub confidence: Score,
    pub timestamp: Timestamp,
}

/// The evolving subject that ledger entries narrate.
///
/// # Invariants
///
/// - `first_entry_hash` equals the hash of the first entry in
///   `ledger_entries`; `latest_entry_hash` equals the hash of the last.
/// - Owned exclusively by the `LedgerStore`; all mutation goes through
///   store operations so every change is paired with a chain entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: DecisionId,
    pub title: String,
    pub description: String,
    pub proposed_by: AgentId,
    pub proposed_at: Timestamp,
    pub status: DecisionStatus,

    /// Participant set.
    pub agents: Vec<AgentId>,

    /// Ballots in cast order.
    pub voters: Vec<VoteCast>,

    pub final_confidence: Option<Score>,
    pub outcome: Option<String>,
    pub outcome_recorded_at: Option<Timestamp>,

    /// Entry ids belonging to this decision, chronological.
    pub ledger_entries: Vec<EntryId>,
    pub first_entry_hash: Option<String>,
    pub latest_entry_hash: Option<String>,

    pub compliance_status: ComplianceStatus,
    pub audit_history: Vec<AuditRecord>,
}

impl DecisionRecord {
    /// Creates a freshly proposed decision with no entries linked yet.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        proposed_by: AgentId,
        agents: Vec<AgentId>,
    ) -> Self {
        Self {
            id: DecisionId::new(),
            title: title.into(),
            description: description.into(),
            proposed_by,
            proposed_at: Timestamp::now(),
            status: DecisionStatus::Proposed,
            agents,
            voters: Vec::new(),
            final_confidence: None,
            outcome: None,
            outcome_recorded_at: None,
            ledger_entries: Vec::new(),
            first_entry_hash: None,
            latest_entry_hash: None,
            compliance_status: ComplianceStatus::Pending,
            audit_history: Vec::new(),
        }
    }

    /// Links an appended entry into this decision's history.
    ///
    /// The first linked entry anchors `first_entry_hash`; every link moves
    /// `latest_entry_hash`.
    pub(crate) fn link_entry(&mut self, entry_id: EntryId, hash: &str) {
        if self.ledger_entries.is_empty() {
            self.first_entry_hash = Some(hash.to_string());
        }
        self.ledger_entries.push(entry_id);
        self.latest_entry_hash = Some(hash.to_string());
    }

    /// Moves to `Deliberating` on the first contribution.
    ///
    /// Tolerant of late contributions: once past this state the status is
    /// left untouched rather than regressed.
    pub(crate) fn mark_deliberating(&mut self) {
        if self.status == DecisionStatus::Proposed {
            self.status = DecisionStatus::Deliberating;
        }
    }

    /// Moves to `Voting` on the first ballot; tolerant like deliberation.
    pub(crate) fn mark_voting(&mut self) {
        if self.status.can_transition_to(&DecisionStatus::Voting) {
            self.status = DecisionStatus::Voting;
        }
    }

    /// Records a ballot.
    pub(crate) fn record_voter(&mut self, agent_id: AgentId, vote: Vote, confidence: Score) {
        self.voters.push(VoteCast {
            agent_id,
            vote,
            confidence,
            timestamp: Timestamp::now(),
        });
    }

    /// Applies a terminal verdict.
    pub(crate) fn finalize(
        &mut self,
        verdict: DecisionVerdict,
        final_confidence: Score,
    ) -> Result<(), DomainError> {
        self.status = self.status.transition_to(verdict.as_status())?;
        self.final_confidence = Some(final_confidence);
        Ok(())
    }

    /// Records the real-world outcome; only meaningful after finalization.
    pub(crate) fn record_outcome(&mut self, outcome: impl Into<String>) -> Result<(), DomainError> {
        if !self.status.is_finalized() {
            return Err(DomainError::invalid_transition(format!(
                "Cannot record outcome while decision is {:?}",
                self.status
            )));
        }
        self.outcome = Some(outcome.into());
        self.outcome_recorded_at = Some(Timestamp::now());
        Ok(())
    }

    /// Marks the decision executed; caller-driven, only after a verdict.
    pub(crate) fn mark_executed(&mut self) -> Result<(), DomainError> {
        self.status = self.status.transition_to(DecisionStatus::Executed)?;
        Ok(())
    }
}
