//! Governance service - proposal submission, per-role review, aggregation,
//! and the human-override workflow.
//!
//! Every governance transition appends an entry through the shared ledger
//! store, so both subsystems share one verifiable history. Snapshot
//! persistence of those entries is owned by `ProvenanceService::persist`.

use futures::future::join_all;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::GovernanceConfig;
use crate::domain::foundation::{
    AgentId, DecisionId, DomainError, ErrorCode, PolicyId, ProposalId, Score, UserId,
};
use crate::domain::ledger::{AppendRequest, EventType, LedgerStore};
use crate::domain::veto::{
    registered_agent, PolicyEngine, ProposalFacts, ReviewerRole, VetoDecision, VetoPolicy,
    VetoReview, VetoStatus,
};
use crate::ports::{ReviewAnalyst, ReviewRequest};

struct GovernanceState {
    policies: PolicyEngine,
    proposals: HashMap<ProposalId, VetoDecision>,
    order: Vec<ProposalId>,
}

/// Runs proposals through policy-determined reviews and manages overrides.
pub struct GovernanceService {
    store: Arc<LedgerStore>,
    analyst: Arc<dyn ReviewAnalyst>,
    state: RwLock<GovernanceState>,
    default_auto_veto: Score,
}

impl GovernanceService {
    /// Creates a service over the shared ledger store and an analyst.
    pub fn new(
        store: Arc<LedgerStore>,
        analyst: Arc<dyn ReviewAnalyst>,
        config: &GovernanceConfig,
    ) -> Self {
        Self {
            store,
            analyst,
            state: RwLock::new(GovernanceState {
                policies: PolicyEngine::new(),
                proposals: HashMap::new(),
                order: Vec::new(),
            }),
            default_auto_veto: Score::new(config.auto_veto_threshold),
        }
    }

    /// Ledger entries for proposals use the proposal's uuid as the subject
    /// id; they are orphan entries by design (no `DecisionRecord` exists).
    fn subject_id(proposal_id: ProposalId) -> DecisionId {
        DecisionId::from_uuid(*proposal_id.as_uuid())
    }

    // ------------------------------------------------------------------
    // Policies
    // ------------------------------------------------------------------

    /// Registers a policy after validation.
    pub async fn add_policy(&self, policy: VetoPolicy) -> Result<PolicyId, DomainError> {
        self.state.write().await.policies.add(policy)
    }

    /// Activates or deactivates a policy.
    pub async fn set_policy_active(
        &self,
        policy_id: PolicyId,
        active: bool,
    ) -> Result<(), DomainError> {
        self.state.write().await.policies.set_active(policy_id, active)
    }

    /// All registered policies.
    pub async fn policies(&self) -> Vec<VetoPolicy> {
        self.state.read().await.policies.policies().to_vec()
    }

    // ------------------------------------------------------------------
    // Submission & review
    // ------------------------------------------------------------------

    /// Submits a proposal: determines required reviewers, runs one review
    /// per role concurrently, aggregates, and records the whole trail.
    pub async fn submit_proposal(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        submitted_by: UserId,
        category: Option<String>,
        amount: Option<i64>,
    ) -> Result<VetoDecision, DomainError> {
        let mut proposal =
            VetoDecision::new(title, description, submitted_by.clone(), category, amount);

        let (required, auto_veto) = {
            let state = self.state.read().await;
            let facts = ProposalFacts {
                title: &proposal.proposal_title,
                description: &proposal.proposal_description,
                category: proposal.category.as_deref(),
                amount: proposal.amount,
                risk_score: None,
            };
            let required = state.policies.determine_required_reviewers(&facts);
            let auto_veto = state
                .policies
                .auto_veto_threshold(&facts)
                .unwrap_or(self.default_auto_veto);
            (required, auto_veto)
        };

        self.store
            .append(
                AppendRequest::new(
                    EventType::ProposalSubmitted,
                    Self::subject_id(proposal.id),
                    proposal.proposal_title.clone(),
                    format!("Proposal submitted by {}", submitted_by),
                )
                .with_user(submitted_by)
                .with_data_field(
                    "required_reviewers",
                    json!(required.iter().map(|r| r.as_str()).collect::<Vec<_>>()),
                ),
            )
            .await;

        // Reviews are independent and run in parallel; aggregation waits
        // for all of them (a join, not a race).
        let outcomes = join_all(
            required
                .iter()
                .map(|role| self.review_role(&proposal, *role, auto_veto)),
        )
        .await;
        for outcome in outcomes {
            let review = outcome?;
            self.append_review_entry(&proposal, &review).await;
            proposal.attach_review(review);
        }

        let status = proposal.evaluate();
        self.append_verdict_entry(&proposal, status).await;
        info!(proposal_id = %proposal.id, status = ?status, "proposal evaluated");

        let mut state = self.state.write().await;
        state.proposals.insert(proposal.id, proposal.clone());
        state.order.push(proposal.id);
        Ok(proposal)
    }

    /// Runs one additional role review against a stored proposal and
    /// re-evaluates it.
    pub async fn run_agent_review(
        &self,
        proposal_id: ProposalId,
        role: ReviewerRole,
    ) -> Result<VetoReview, DomainError> {
        let proposal = self
            .proposal(proposal_id)
            .await
            .ok_or_else(|| proposal_not_found(proposal_id))?;
        let review = self
            .review_role(&proposal, role, self.default_auto_veto)
            .await?;
        self.append_review_entry(&proposal, &review).await;

        let mut state = self.state.write().await;
        let stored = state
            .proposals
            .get_mut(&proposal_id)
            .ok_or_else(|| proposal_not_found(proposal_id))?;
        stored.attach_review(review.clone());
        let status = stored.evaluate();
        let snapshot = stored.clone();
        drop(state);

        self.append_verdict_entry(&snapshot, status).await;
        Ok(review)
    }

    async fn review_role(
        &self,
        proposal: &VetoDecision,
        role: ReviewerRole,
        auto_veto: Score,
    ) -> Result<VetoReview, DomainError> {
        let agent = registered_agent(role);
        let request = ReviewRequest {
            role,
            jurisdiction: agent.jurisdiction.iter().map(|s| s.to_string()).collect(),
            title: proposal.proposal_title.clone(),
            description: proposal.proposal_description.clone(),
            category: proposal.category.clone(),
            amount: proposal.amount,
        };
        let assessment = self
            .analyst
            .assess(&request)
            .await
            .map_err(|e| DomainError::new(ErrorCode::AnalystError, e.to_string()))?;

        let agent_id = AgentId::new(format!("{}-agent", role))?;
        Ok(VetoReview::from_assessment(
            agent,
            agent_id,
            assessment.risk_score,
            assessment.confidence,
            assessment.reasoning,
            assessment.concerns,
            auto_veto,
        ))
    }

    async fn append_review_entry(&self, proposal: &VetoDecision, review: &VetoReview) {
        self.store
            .append(
                AppendRequest::new(
                    EventType::ReviewCompleted,
                    Self::subject_id(proposal.id),
                    proposal.proposal_title.clone(),
                    format!("{} review: {:?}", review.agent_role, review.status),
                )
                .with_agent(review.agent_id.clone())
                .with_confidence(review.confidence)
                .with_data_field("role", json!(review.agent_role.as_str()))
                .with_data_field("risk_score", json!(review.risk_score.value()))
                .with_data_field("is_blocking", json!(review.is_blocking))
                .with_data_field("concern_count", json!(review.concerns.len())),
            )
            .await;
    }

    /// Appends the terminal entry for an aggregation or override outcome.
    /// A still-pending proposal appends nothing.
    async fn append_verdict_entry(&self, proposal: &VetoDecision, status: VetoStatus) {
        let event_type = match status {
            VetoStatus::Approved => EventType::DecisionApproved,
            VetoStatus::Vetoed => EventType::DecisionVetoed,
            VetoStatus::Pending | VetoStatus::OverrideRequested => return,
        };
        self.store
            .append(
                AppendRequest::new(
                    event_type,
                    Self::subject_id(proposal.id),
                    proposal.proposal_title.clone(),
                    format!(
                        "Proposal {}",
                        proposal.final_decision.as_deref().unwrap_or("resolved")
                    ),
                )
                .with_data_field("blocking_veto", json!(proposal.has_blocking_veto())),
            )
            .await;
    }

    // ------------------------------------------------------------------
    // Overrides & manual resolution
    // ------------------------------------------------------------------

    /// Requests a human override of a vetoed proposal.
    pub async fn request_override(
        &self,
        proposal_id: ProposalId,
        requested_by: UserId,
        reason: impl Into<String>,
    ) -> Result<VetoDecision, DomainError> {
        let reason = reason.into();
        let snapshot = {
            let mut state = self.state.write().await;
            let proposal = state
                .proposals
                .get_mut(&proposal_id)
                .ok_or_else(|| proposal_not_found(proposal_id))?;
            proposal.request_override(requested_by.clone(), reason.clone())?;
            proposal.clone()
        };

        self.store
            .append(
                AppendRequest::new(
                    EventType::OverrideRequested,
                    Self::subject_id(proposal_id),
                    snapshot.proposal_title.clone(),
                    format!("Override requested by {}", requested_by),
                )
                .with_user(requested_by)
                .with_data_field("reason", json!(reason)),
            )
            .await;
        Ok(snapshot)
    }

    /// Approves a requested override, reinstating the proposal.
    pub async fn approve_override(
        &self,
        proposal_id: ProposalId,
        approved_by: UserId,
    ) -> Result<VetoDecision, DomainError> {
        let snapshot = {
            let mut state = self.state.write().await;
            let proposal = state
                .proposals
                .get_mut(&proposal_id)
                .ok_or_else(|| proposal_not_found(proposal_id))?;
            proposal.approve_override(approved_by.clone())?;
            proposal.clone()
        };

        self.store
            .append(
                AppendRequest::new(
                    EventType::OverrideApproved,
                    Self::subject_id(proposal_id),
                    snapshot.proposal_title.clone(),
                    format!("Override approved by {}", approved_by),
                )
                .with_user(approved_by),
            )
            .await;
        Ok(snapshot)
    }

    /// Denies a requested override, returning the proposal to vetoed.
    pub async fn deny_override(
        &self,
        proposal_id: ProposalId,
        denied_by: UserId,
    ) -> Result<VetoDecision, DomainError> {
        let snapshot = {
            let mut state = self.state.write().await;
            let proposal = state
                .proposals
                .get_mut(&proposal_id)
                .ok_or_else(|| proposal_not_found(proposal_id))?;
            proposal.deny_override(denied_by.clone())?;
            proposal.clone()
        };

        self.store
            .append(
                AppendRequest::new(
                    EventType::OverrideDenied,
                    Self::subject_id(proposal_id),
                    snapshot.proposal_title.clone(),
                    format!("Override denied by {}", denied_by),
                )
                .with_user(denied_by),
            )
            .await;
        Ok(snapshot)
    }

    /// Resolves a reviewed-but-mixed pending proposal by explicit human
    /// decision - the escalation path out of the residual state.
    pub async fn resolve_manually(
        &self,
        proposal_id: ProposalId,
        approve: bool,
        decided_by: UserId,
    ) -> Result<VetoDecision, DomainError> {
        let (snapshot, status) = {
            let mut state = self.state.write().await;
            let proposal = state
                .proposals
                .get_mut(&proposal_id)
                .ok_or_else(|| proposal_not_found(proposal_id))?;
            let status = proposal.resolve_manually(approve, decided_by.clone())?;
            (proposal.clone(), status)
        };

        self.append_verdict_entry(&snapshot, status).await;
        Ok(snapshot)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Looks up one proposal.
    pub async fn proposal(&self, proposal_id: ProposalId) -> Option<VetoDecision> {
        self.state.read().await.proposals.get(&proposal_id).cloned()
    }

    /// All proposals, in submission order.
    pub async fn proposals(&self) -> Vec<VetoDecision> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|id| state.proposals.get(id).cloned())
            .collect()
    }

    /// Proposals still awaiting a verdict.
    pub async fn pending_proposals(&self) -> Vec<VetoDecision> {
        self.proposals_with_status(VetoStatus::Pending).await
    }

    /// Proposals currently vetoed.
    pub async fn vetoed_proposals(&self) -> Vec<VetoDecision> {
        self.proposals_with_status(VetoStatus::Vetoed).await
    }

    async fn proposals_with_status(&self, status: VetoStatus) -> Vec<VetoDecision> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|id| state.proposals.get(id))
            .filter(|p| p.status == status)
            .cloned()
            .collect()
    }
}

fn proposal_not_found(proposal_id: ProposalId) -> DomainError {
    DomainError::new(
        ErrorCode::ProposalNotFound,
        format!("Proposal not found: {}", proposal_id),
    )
}
