//! Per-role review verdicts.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AgentId, Score, Timestamp};

use super::agent::{ReviewerRole, VetoAgent};

/// Verdict of a single reviewer role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Approved,
    Vetoed,
    Conditional,
}

/// Severity of one review concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcernSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// One concern raised by a reviewer, tagged with its jurisdiction category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concern {
    pub category: String,
    pub severity: ConcernSeverity,
    pub description: String,
    pub mitigation: Option<String>,
}

/// One reviewer role's verdict on a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VetoReview {
    pub agent_id: AgentId,
    pub agent_role: ReviewerRole,
    pub status: ReviewStatus,
    pub risk_score: Score,
    pub confidence: Score,
    pub reasoning: String,
    pub concerns: Vec<Concern>,
    pub conditions: Option<Vec<String>>,
    pub reviewed_at: Timestamp,
    /// True when this review's veto blocks the proposal outright.
    pub is_blocking: bool,
}

impl VetoReview {
    /// Builds a review from an assessment, deriving status and blocking
    /// behavior from the agent's registry definition.
    ///
    /// Status: vetoed when the risk score reaches the agent's threshold or
    /// the policy's auto-veto threshold; conditional when any concern is
    /// high severity or worse; approved otherwise. Blocking requires the
    /// role to be able to block automatically.
    #[allow(clippy::too_many_arguments)]
    pub fn from_assessment(
        agent: &VetoAgent,
        agent_id: AgentId,
        risk_score: Score,
        confidence: Score,
        reasoning: String,
        concerns: Vec<Concern>,
        auto_veto_threshold: Score,
    ) -> Self {
        let vetoed = risk_score >= agent.veto_threshold || risk_score >= auto_veto_threshold;
        let status = if vetoed {
            ReviewStatus::Vetoed
        } else if concerns.iter().any(|c| c.severity >= ConcernSeverity::High) {
            ReviewStatus::Conditional
        } else {
            ReviewStatus::Approved
        };
        let conditions = match status {
            ReviewStatus::Conditional => Some(
                concerns
                    .iter()
                    .filter(|c| c.severity >= ConcernSeverity::High)
                    .filter_map(|c| c.mitigation.clone())
                    .collect(),
            ),
            _ => None,
        };
        let is_blocking =
            agent.can_block_automatic && vetoed && risk_score >= agent.veto_threshold;

        Self {
            agent_id,
            agent_role: agent.role,
            status,
            risk_score,
            confidence,
            reasoning,
            concerns,
            conditions,
            reviewed_at: Timestamp::now(),
            is_blocking,
        }
    }
}
