//! Compliance audit records attached to a decision.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuditId, DomainError, StateMachine, Timestamp, UserId};

/// Lifecycle of one audit instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl StateMachine for AuditStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use AuditStatus::*;
        matches!(
            (self, target),
            (Pending, InProgress)
                | (Pending, Completed)
                | (Pending, Failed)
                | (InProgress, Completed)
                | (InProgress, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use AuditStatus::*;
        match self {
            Pending => vec![InProgress, Completed, Failed],
            InProgress => vec![Completed, Failed],
            Completed | Failed => vec![],
        }
    }
}

/// Severity of one audit finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FindingSeverity {
    /// Findings at this severity flip the decision to review-needed.
    pub fn requires_review(&self) -> bool {
        matches!(self, FindingSeverity::High | FindingSeverity::Critical)
    }
}

/// One finding produced by a completed audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFinding {
    pub severity: FindingSeverity,
    pub category: String,
    pub description: String,
    pub remediation: Option<String>,
    pub resolved: bool,
}

/// One compliance audit instance attached to a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditId,
    pub requested_at: Timestamp,
    pub requested_by: UserId,
    pub reason: String,
    pub framework: String,
    pub status: AuditStatus,
    pub findings: Vec<AuditFinding>,
    pub completed_at: Option<Timestamp>,
    pub report: Option<String>,
}

impl AuditRecord {
    /// Creates a pending audit.
    pub fn new(
        requested_by: UserId,
        reason: impl Into<String>,
        framework: impl Into<String>,
    ) -> Self {
        Self {
            id: AuditId::new(),
            requested_at: Timestamp::now(),
            requested_by,
            reason: reason.into(),
            framework: framework.into(),
            status: AuditStatus::Pending,
            findings: Vec::new(),
            completed_at: None,
            report: None,
        }
    }

    /// Moves a pending audit to in-progress.
    pub(crate) fn begin(&mut self) -> Result<(), DomainError> {
        self.status = self.status.transition_to(AuditStatus::InProgress)?;
        Ok(())
    }

    /// Completes the audit with findings and a report.
    ///
    /// Accepted from both pending and in-progress, so the original
    /// request-then-complete flow works without an explicit begin.
    pub(crate) fn complete(
        &mut self,
        findings: Vec<AuditFinding>,
        report: impl Into<String>,
    ) -> Result<(), DomainError> {
        self.status = self.status.transition_to(AuditStatus::Completed)?;
        self.findings = findings;
        self.completed_at = Some(Timestamp::now());
        self.report = Some(report.into());
        Ok(())
    }

    /// Marks the audit failed, recording the reason as its report.
    pub(crate) fn fail(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.status = self.status.transition_to(AuditStatus::Failed)?;
        self.completed_at = Some(Timestamp::now());
        self.report = Some(reason.into());
        Ok(())
    }

    /// True when any finding is severe enough to need review.
    pub fn has_severe_findings(&self) -> bool {
        self.findings.iter().any(|f| f.severity.requires_review())
    }
}
