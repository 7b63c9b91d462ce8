//! Review Analyst Port - Interface for per-role proposal analysis.
//!
//! The governance engine asks an analyst to assess a proposal from one
//! reviewer role's point of view. A rich implementation may call out to an
//! external reasoning capability; a deterministic fallback must always be
//! available so review completes even when that capability is down.

use async_trait::async_trait;

use crate::domain::foundation::Score;
use crate::domain::veto::{Concern, ReviewerRole};

/// Errors that can occur during analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalystError {
    #[error("Analyst unavailable: {0}")]
    Unavailable(String),

    #[error("Analysis timed out after {0}s")]
    Timeout(u64),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),
}

/// What an analyst is asked to assess.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub role: ReviewerRole,
    /// Concern categories the role is competent to raise; analysts must
    /// not score concerns outside it.
    pub jurisdiction: Vec<String>,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub amount: Option<i64>,
}

/// What an analyst produces: raw scores and concerns. Status and blocking
/// derivation stay in the domain.
#[derive(Debug, Clone)]
pub struct ReviewAssessment {
    pub risk_score: Score,
    pub confidence: Score,
    pub reasoning: String,
    pub concerns: Vec<Concern>,
}

/// Identifies an analyst implementation for logging and probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalystInfo {
    pub name: String,
    /// Deterministic analysts always return the same assessment for the
    /// same request.
    pub deterministic: bool,
}

/// Port for per-role proposal analysis.
#[async_trait]
pub trait ReviewAnalyst: Send + Sync {
    /// Assess a proposal from one reviewer role's point of view.
    async fn assess(&self, request: &ReviewRequest) -> Result<ReviewAssessment, AnalystError>;

    /// Capability probe: whether this analyst can currently serve requests.
    fn is_available(&self) -> bool;

    /// Implementation info for logging.
    fn analyst_info(&self) -> AnalystInfo;
}
