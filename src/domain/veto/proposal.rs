//! Proposal aggregate - a submission under governance review.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ProposalId, StateMachine, Timestamp, UserId,
};

use super::review::{ReviewStatus, VetoReview};

/// Governance status of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VetoStatus {
    Pending,
    Approved,
    Vetoed,
    OverrideRequested,
}

impl StateMachine for VetoStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use VetoStatus::*;
        matches!(
            (self, target),
            (Pending, Approved)
                | (Pending, Vetoed)
                | (Vetoed, OverrideRequested)
                | (OverrideRequested, Approved)
                | (OverrideRequested, Vetoed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use VetoStatus::*;
        match self {
            Pending => vec![Approved, Vetoed],
            Vetoed => vec![OverrideRequested],
            OverrideRequested => vec![Approved, Vetoed],
            Approved => vec![],
        }
    }
}

/// A proposal under governance review, with its per-role reviews and the
/// human-override trail.
///
/// # Invariants
///
/// - A blocking vetoed review is a hard gate: the proposal can never be
///   `Approved` by aggregation while one exists.
/// - Override operations are reachable only from the states the
///   [`VetoStatus`] machine allows; anything else errors without mutating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VetoDecision {
    pub id: ProposalId,
    pub proposal_title: String,
    pub proposal_description: String,
    pub category: Option<String>,
    pub amount: Option<i64>,
    pub submitted_by: UserId,
    pub submitted_at: Timestamp,
    pub status: VetoStatus,
    pub reviews: Vec<VetoReview>,
    pub final_decision: Option<String>,
    pub decided_at: Option<Timestamp>,
    pub decided_by: Option<UserId>,

    pub override_requested: bool,
    pub override_requested_by: Option<UserId>,
    pub override_reason: Option<String>,
    pub override_approved: Option<bool>,
    pub override_approved_by: Option<UserId>,
}

impl VetoDecision {
    /// Creates a pending proposal with no reviews yet.
    pub fn new(
        proposal_title: impl Into<String>,
        proposal_description: impl Into<String>,
        submitted_by: UserId,
        category: Option<String>,
        amount: Option<i64>,
    ) -> Self {
        Self {
            id: ProposalId::new(),
            proposal_title: proposal_title.into(),
            proposal_description: proposal_description.into(),
            category,
            amount,
            submitted_by,
            submitted_at: Timestamp::now(),
            status: VetoStatus::Pending,
            reviews: Vec::new(),
            final_decision: None,
            decided_at: None,
            decided_by: None,
            override_requested: false,
            override_requested_by: None,
            override_reason: None,
            override_approved: None,
            override_approved_by: None,
        }
    }

    /// Attaches one completed role review.
    pub fn attach_review(&mut self, review: VetoReview) {
        self.reviews.push(review);
    }

    /// True when any attached review is a blocking veto.
    pub fn has_blocking_veto(&self) -> bool {
        self.reviews
            .iter()
            .any(|r| r.is_blocking && r.status == ReviewStatus::Vetoed)
    }

    /// Aggregates the attached reviews into a final status.
    ///
    /// Any blocking veto wins outright; unanimous approval approves; any
    /// other mix stays pending for human action (see `resolve_manually`).
    pub fn evaluate(&mut self) -> VetoStatus {
        if self.status != VetoStatus::Pending {
            return self.status;
        }
        if self.has_blocking_veto() {
            self.status = VetoStatus::Vetoed;
            self.final_decision = Some("vetoed".to_string());
            self.decided_at = Some(Timestamp::now());
        } else if !self.reviews.is_empty()
            && self.reviews.iter().all(|r| r.status == ReviewStatus::Approved)
        {
            self.status = VetoStatus::Approved;
            self.final_decision = Some("approved".to_string());
            self.decided_at = Some(Timestamp::now());
        }
        self.status
    }

    /// Resolves a reviewed-but-mixed pending proposal by explicit human
    /// decision. Fails for unreviewed proposals and non-pending states.
    pub fn resolve_manually(
        &mut self,
        approve: bool,
        decided_by: UserId,
    ) -> Result<VetoStatus, DomainError> {
        if self.reviews.is_empty() {
            return Err(DomainError::invalid_transition(
                "Cannot manually resolve a proposal with no reviews",
            ));
        }
        if approve && self.has_blocking_veto() {
            return Err(DomainError::invalid_transition(
                "Cannot manually approve past a blocking veto; use the override workflow",
            ));
        }
        let target = if approve {
            VetoStatus::Approved
        } else {
            VetoStatus::Vetoed
        };
        self.status = self.status.transition_to(target)?;
        self.final_decision = Some(
            if approve { "approved_manually" } else { "vetoed_manually" }.to_string(),
        );
        self.decided_at = Some(Timestamp::now());
        self.decided_by = Some(decided_by);
        Ok(self.status)
    }

    /// Requests a human override of a veto. Only reachable from `Vetoed`
    /// and only with a non-empty reason.
    pub fn request_override(
        &mut self,
        requested_by: UserId,
        reason: impl Into<String>,
    ) -> Result<(), DomainError> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(DomainError::validation(
                "override_reason",
                "Override requests require a reason",
            ));
        }
        self.status = self.status.transition_to(VetoStatus::OverrideRequested)?;
        self.override_requested = true;
        self.override_requested_by = Some(requested_by);
        self.override_reason = Some(reason);
        Ok(())
    }

    /// Approves a requested override, reinstating the proposal.
    pub fn approve_override(&mut self, approved_by: UserId) -> Result<(), DomainError> {
        if self.status != VetoStatus::OverrideRequested {
            return Err(DomainError::invalid_transition(format!(
                "Cannot approve override while proposal is {:?}",
                self.status
            )));
        }
        self.status = self.status.transition_to(VetoStatus::Approved)?;
        self.override_approved = Some(true);
        self.override_approved_by = Some(approved_by.clone());
        self.final_decision = Some("approved_by_override".to_string());
        self.decided_at = Some(Timestamp::now());
        self.decided_by = Some(approved_by);
        Ok(())
    }

    /// Denies a requested override, returning the proposal to vetoed.
    pub fn deny_override(&mut self, denied_by: UserId) -> Result<(), DomainError> {
        if self.status != VetoStatus::OverrideRequested {
            return Err(DomainError::invalid_transition(format!(
                "Cannot deny override while proposal is {:?}",
                self.status
            )));
        }
        self.status = self.status.transition_to(VetoStatus::Vetoed)?;
        self.override_approved = Some(false);
        self.override_approved_by = Some(denied_by.clone());
        self.final_decision = Some("vetoed".to_string());
        self.decided_at = Some(Timestamp::now());
        self.decided_by = Some(denied_by);
        Ok(())
    }
}
