//! Keyword Review Analyst - the deterministic fallback scoring strategy.
//!
//! Accumulates risk from a fixed table of weighted signals found in the
//! proposal text, restricted to concerns within the reviewer's declared
//! jurisdiction. Always available, always completes, and produces the same
//! assessment for the same request.

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::domain::foundation::Score;
use crate::domain::veto::{Concern, ConcernSeverity};
use crate::ports::{AnalystError, AnalystInfo, ReviewAnalyst, ReviewAssessment, ReviewRequest};

/// One weighted signal in the scoring table.
struct RiskSignal {
    keyword: &'static str,
    weight: u8,
    category: &'static str,
    severity: ConcernSeverity,
    mitigation: Option<&'static str>,
}

static RISK_SIGNALS: Lazy<Vec<RiskSignal>> = Lazy::new(|| {
    vec![
        RiskSignal {
            keyword: "delete",
            weight: 25,
            category: "data",
            severity: ConcernSeverity::High,
            mitigation: Some("Require a reversible soft-delete window"),
        },
        RiskSignal {
            keyword: "purge",
            weight: 25,
            category: "data",
            severity: ConcernSeverity::High,
            mitigation: Some("Stage the purge behind a retention check"),
        },
        RiskSignal {
            keyword: "irreversible",
            weight: 30,
            category: "irreversible",
            severity: ConcernSeverity::Critical,
            mitigation: None,
        },
        RiskSignal {
            keyword: "pii",
            weight: 40,
            category: "privacy",
            severity: ConcernSeverity::Critical,
            mitigation: Some("Confirm a lawful basis and records of processing"),
        },
        RiskSignal {
            keyword: "personal data",
            weight: 35,
            category: "privacy",
            severity: ConcernSeverity::Critical,
            mitigation: Some("Confirm a lawful basis and records of processing"),
        },
        RiskSignal {
            keyword: "gdpr",
            weight: 20,
            category: "regulatory",
            severity: ConcernSeverity::Medium,
            mitigation: None,
        },
        RiskSignal {
            keyword: "customer",
            weight: 10,
            category: "data",
            severity: ConcernSeverity::Medium,
            mitigation: None,
        },
        RiskSignal {
            keyword: "bypass",
            weight: 30,
            category: "security",
            severity: ConcernSeverity::Critical,
            mitigation: Some("Route through the standard approval path"),
        },
        RiskSignal {
            keyword: "unencrypted",
            weight: 30,
            category: "security",
            severity: ConcernSeverity::High,
            mitigation: Some("Encrypt in transit and at rest"),
        },
        RiskSignal {
            keyword: "credentials",
            weight: 25,
            category: "access",
            severity: ConcernSeverity::High,
            mitigation: Some("Rotate affected credentials"),
        },
        RiskSignal {
            keyword: "production",
            weight: 15,
            category: "operational",
            severity: ConcernSeverity::Medium,
            mitigation: None,
        },
        RiskSignal {
            keyword: "migration",
            weight: 15,
            category: "operational",
            severity: ConcernSeverity::Medium,
            mitigation: Some("Rehearse against a staging copy"),
        },
        RiskSignal {
            keyword: "contract",
            weight: 20,
            category: "contractual",
            severity: ConcernSeverity::Medium,
            mitigation: None,
        },
        RiskSignal {
            keyword: "terminate",
            weight: 20,
            category: "legal",
            severity: ConcernSeverity::High,
            mitigation: Some("Obtain counsel sign-off"),
        },
        RiskSignal {
            keyword: "payroll",
            weight: 25,
            category: "financial",
            severity: ConcernSeverity::High,
            mitigation: None,
        },
        RiskSignal {
            keyword: "budget",
            weight: 10,
            category: "budget",
            severity: ConcernSeverity::Low,
            mitigation: None,
        },
    ]
});

/// Amount at which a proposal registers a large-spend signal.
const LARGE_AMOUNT_THRESHOLD: i64 = 25_000;

/// Base risk every proposal starts from.
const BASE_RISK: u8 = 10;

/// Deterministic keyword-weighted analyst.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordReviewAnalyst;

impl KeywordReviewAnalyst {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReviewAnalyst for KeywordReviewAnalyst {
    async fn assess(&self, request: &ReviewRequest) -> Result<ReviewAssessment, AnalystError> {
        let haystack = format!("{} {}", request.title, request.description).to_lowercase();
        let in_jurisdiction =
            |category: &str| request.jurisdiction.iter().any(|j| j == category);

        let mut risk = Score::new(BASE_RISK);
        let mut concerns = Vec::new();

        for signal in RISK_SIGNALS.iter() {
            if !haystack.contains(signal.keyword) || !in_jurisdiction(signal.category) {
                continue;
            }
            risk = risk.saturating_add(signal.weight);
            concerns.push(Concern {
                category: signal.category.to_string(),
                severity: signal.severity,
                description: format!(
                    "Proposal text mentions \"{}\" ({} concern)",
                    signal.keyword, signal.category
                ),
                mitigation: signal.mitigation.map(String::from),
            });
        }

        if let Some(amount) = request.amount {
            if amount >= LARGE_AMOUNT_THRESHOLD && in_jurisdiction("financial") {
                risk = risk.saturating_add(15);
                concerns.push(Concern {
                    category: "financial".to_string(),
                    severity: ConcernSeverity::Medium,
                    description: format!("Proposal amount {} exceeds the large-spend line", amount),
                    mitigation: Some("Confirm budget ownership".to_string()),
                });
            }
        }

        // Confidence grows with matched evidence, capped below certainty.
        let confidence = if concerns.is_empty() {
            Score::new(60)
        } else {
            Score::new(70).saturating_add(5 * concerns.len().min(5) as u8)
        };

        let reasoning = if concerns.is_empty() {
            format!(
                "No {} signals matched; residual risk only",
                request.role
            )
        } else {
            format!(
                "{} signal(s) within the {} jurisdiction raised risk to {}",
                concerns.len(),
                request.role,
                risk
            )
        };

        Ok(ReviewAssessment {
            risk_score: risk,
            confidence,
            reasoning,
            concerns,
        })
    }

    fn is_available(&self) -> bool {
        true
    }

    fn analyst_info(&self) -> AnalystInfo {
        AnalystInfo {
            name: "keyword".to_string(),
            deterministic: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::veto::{registered_agent, ReviewerRole};

    fn request(role: ReviewerRole, title: &str, amount: Option<i64>) -> ReviewRequest {
        let agent = registered_agent(role);
        ReviewRequest {
            role,
            jurisdiction: agent.jurisdiction.iter().map(|s| s.to_string()).collect(),
            title: title.to_string(),
            description: String::new(),
            category: None,
            amount,
        }
    }

    #[tokio::test]
    async fn assessment_is_deterministic() {
        let analyst = KeywordReviewAnalyst::new();
        let req = request(ReviewerRole::Compliance, "Delete customer PII records", Some(50_000));

        let a = analyst.assess(&req).await.unwrap();
        let b = analyst.assess(&req).await.unwrap();
        assert_eq!(a.risk_score, b.risk_score);
        assert_eq!(a.concerns.len(), b.concerns.len());
    }

    #[tokio::test]
    async fn pii_deletion_crosses_compliance_threshold() {
        let analyst = KeywordReviewAnalyst::new();
        let req = request(ReviewerRole::Compliance, "Delete customer PII records", Some(50_000));

        let assessment = analyst.assess(&req).await.unwrap();
        let agent = registered_agent(ReviewerRole::Compliance);
        assert!(
            assessment.risk_score >= agent.veto_threshold,
            "risk {} should reach the compliance threshold {}",
            assessment.risk_score,
            agent.veto_threshold
        );
        assert!(assessment
            .concerns
            .iter()
            .any(|c| c.category == "privacy"));
    }

    #[tokio::test]
    async fn signals_outside_jurisdiction_are_ignored() {
        let analyst = KeywordReviewAnalyst::new();
        // Finance has no "privacy" or "data" jurisdiction, so PII deletion
        // text contributes nothing.
        let req = request(ReviewerRole::Finance, "Delete customer PII records", None);

        let assessment = analyst.assess(&req).await.unwrap();
        assert_eq!(assessment.risk_score, Score::new(BASE_RISK));
        assert!(assessment.concerns.is_empty());
    }

    #[tokio::test]
    async fn large_amount_registers_for_finance() {
        let analyst = KeywordReviewAnalyst::new();
        let req = request(ReviewerRole::Finance, "New vendor engagement", Some(60_000));

        let assessment = analyst.assess(&req).await.unwrap();
        assert_eq!(assessment.risk_score, Score::new(BASE_RISK + 15));
        assert_eq!(assessment.concerns.len(), 1);
        assert_eq!(assessment.concerns[0].category, "financial");
    }

    #[tokio::test]
    async fn benign_proposal_scores_base_risk() {
        let analyst = KeywordReviewAnalyst::new();
        let req = request(ReviewerRole::Risk, "Rename the status page", None);

        let assessment = analyst.assess(&req).await.unwrap();
        assert_eq!(assessment.risk_score, Score::new(BASE_RISK));
        assert_eq!(assessment.confidence, Score::new(60));
    }

    #[test]
    fn analyst_reports_deterministic() {
        let info = KeywordReviewAnalyst::new().analyst_info();
        assert!(info.deterministic);
        assert!(KeywordReviewAnalyst::new().is_available());
    }
}
