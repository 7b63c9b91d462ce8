//! Veto policies - configuration rules deciding who must review what.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::foundation::{
    DomainError, ErrorCode, PolicyId, Score, ValidationError,
};

use super::agent::ReviewerRole;

/// Comparison operator for numeric triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountOperator {
    GreaterThan,
    LessThan,
}

impl AmountOperator {
    fn compare(&self, left: i64, right: i64) -> bool {
        match self {
            AmountOperator::GreaterThan => left > right,
            AmountOperator::LessThan => left < right,
        }
    }
}

/// The facts a trigger is evaluated against.
///
/// `risk_score` is only present once a review has produced one; at
/// submission time it is `None`, so risk-score triggers never match on a
/// default value.
#[derive(Debug, Clone, Copy)]
pub struct ProposalFacts<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: Option<&'a str>,
    pub amount: Option<i64>,
    pub risk_score: Option<Score>,
}

/// One trigger rule inside a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Matches when the lower-cased title+description contains any keyword.
    Keyword {
        keywords: Vec<String>,
        agent_to_notify: ReviewerRole,
    },
    /// Matches when the proposal's category is in the set.
    Category {
        categories: Vec<String>,
        agent_to_notify: ReviewerRole,
    },
    /// Matches the proposal amount against a threshold.
    Amount {
        operator: AmountOperator,
        threshold: i64,
        agent_to_notify: ReviewerRole,
    },
    /// Matches a known risk score against a threshold.
    RiskScore {
        operator: AmountOperator,
        threshold: Score,
        agent_to_notify: ReviewerRole,
    },
}

impl TriggerCondition {
    /// The reviewer this trigger pulls in when it matches.
    pub fn agent_to_notify(&self) -> ReviewerRole {
        match self {
            TriggerCondition::Keyword { agent_to_notify, .. }
            | TriggerCondition::Category { agent_to_notify, .. }
            | TriggerCondition::Amount { agent_to_notify, .. }
            | TriggerCondition::RiskScore { agent_to_notify, .. } => *agent_to_notify,
        }
    }

    /// Evaluates this trigger against the proposal facts.
    pub fn matches(&self, facts: &ProposalFacts<'_>) -> bool {
        match self {
            TriggerCondition::Keyword { keywords, .. } => {
                let haystack =
                    format!("{} {}", facts.title, facts.description).to_lowercase();
                keywords
                    .iter()
                    .any(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
            }
            TriggerCondition::Category { categories, .. } => facts
                .category
                .map(|c| categories.iter().any(|cat| cat.eq_ignore_ascii_case(c)))
                .unwrap_or(false),
            TriggerCondition::Amount { operator, threshold, .. } => facts
                .amount
                .map(|a| operator.compare(a, *threshold))
                .unwrap_or(false),
            TriggerCondition::RiskScore { operator, threshold, .. } => facts
                .risk_score
                .map(|s| operator.compare(i64::from(s.value()), i64::from(threshold.value())))
                .unwrap_or(false),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            TriggerCondition::Keyword { keywords, .. } => {
                if keywords.is_empty() || keywords.iter().any(|k| k.trim().is_empty()) {
                    return Err(ValidationError::empty_field("keywords"));
                }
            }
            TriggerCondition::Category { categories, .. } => {
                if categories.is_empty() {
                    return Err(ValidationError::empty_field("categories"));
                }
            }
            TriggerCondition::Amount { threshold, .. } => {
                if *threshold < 0 {
                    return Err(ValidationError::out_of_range(
                        "threshold",
                        0,
                        i32::MAX,
                        (*threshold).try_into().unwrap_or(i32::MIN),
                    ));
                }
            }
            TriggerCondition::RiskScore { .. } => {}
        }
        Ok(())
    }
}

/// A configured governance rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VetoPolicy {
    pub id: PolicyId,
    pub name: String,
    pub description: String,
    pub trigger_conditions: Vec<TriggerCondition>,
    /// Reviewers always required when this policy matches.
    pub required_agents: Vec<ReviewerRole>,
    /// Risk score at which any review under this policy becomes a veto.
    pub auto_veto_threshold: Score,
    /// Roles to escalate to when reviews come back mixed.
    pub escalation_path: Vec<ReviewerRole>,
    pub is_active: bool,
}

impl VetoPolicy {
    /// Creates an active policy with the given triggers.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        trigger_conditions: Vec<TriggerCondition>,
    ) -> Self {
        Self {
            id: PolicyId::new(),
            name: name.into(),
            description: description.into(),
            trigger_conditions,
            required_agents: Vec::new(),
            auto_veto_threshold: Score::new(85),
            escalation_path: Vec::new(),
            is_active: true,
        }
    }

    /// Adds always-required reviewers.
    pub fn with_required_agents(mut self, agents: Vec<ReviewerRole>) -> Self {
        self.required_agents = agents;
        self
    }

    /// Overrides the auto-veto threshold.
    pub fn with_auto_veto_threshold(mut self, threshold: Score) -> Self {
        self.auto_veto_threshold = threshold;
        self
    }

    /// Sets the escalation path.
    pub fn with_escalation_path(mut self, path: Vec<ReviewerRole>) -> Self {
        self.escalation_path = path;
        self
    }

    /// Validates the trigger configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if self.trigger_conditions.is_empty() {
            return Err(ValidationError::empty_field("trigger_conditions"));
        }
        for condition in &self.trigger_conditions {
            condition.validate()?;
        }
        Ok(())
    }

    /// True when any trigger matches the facts.
    pub fn matches(&self, facts: &ProposalFacts<'_>) -> bool {
        self.trigger_conditions.iter().any(|c| c.matches(facts))
    }
}

/// Evaluates active policies to determine required reviewers.
#[derive(Debug, Clone, Default)]
pub struct PolicyEngine {
    policies: Vec<VetoPolicy>,
}

impl PolicyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a policy after validating its configuration.
    pub fn add(&mut self, policy: VetoPolicy) -> Result<PolicyId, DomainError> {
        policy.validate()?;
        let id = policy.id;
        self.policies.push(policy);
        Ok(id)
    }

    /// Activates or deactivates a policy.
    pub fn set_active(&mut self, policy_id: PolicyId, active: bool) -> Result<(), DomainError> {
        let policy = self
            .policies
            .iter_mut()
            .find(|p| p.id == policy_id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::PolicyNotFound,
                    format!("Policy not found: {}", policy_id),
                )
            })?;
        policy.is_active = active;
        Ok(())
    }

    /// All registered policies.
    pub fn policies(&self) -> &[VetoPolicy] {
        &self.policies
    }

    /// Determines which reviewer roles must weigh in on a proposal.
    ///
    /// Every matching trigger of every active policy adds its notified
    /// reviewer, plus the policy's always-required set. When nothing
    /// matches, the risk role is the floor: no proposal is reviewer-less.
    pub fn determine_required_reviewers(
        &self,
        facts: &ProposalFacts<'_>,
    ) -> BTreeSet<ReviewerRole> {
        let mut required = BTreeSet::new();
        for policy in self.policies.iter().filter(|p| p.is_active) {
            let mut matched = false;
            for condition in &policy.trigger_conditions {
                if condition.matches(facts) {
                    required.insert(condition.agent_to_notify());
                    matched = true;
                }
            }
            if matched {
                required.extend(policy.required_agents.iter().copied());
            }
        }
        if required.is_empty() {
            required.insert(ReviewerRole::Risk);
        }
        required
    }

    /// The strictest auto-veto threshold among matching active policies,
    /// or `None` when no policy matches.
    pub fn auto_veto_threshold(&self, facts: &ProposalFacts<'_>) -> Option<Score> {
        self.policies
            .iter()
            .filter(|p| p.is_active && p.matches(facts))
            .map(|p| p.auto_veto_threshold)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts<'a>(title: &'a str, description: &'a str) -> ProposalFacts<'a> {
        ProposalFacts {
            title,
            description,
            category: None,
            amount: None,
            risk_score: None,
        }
    }

    fn pii_policy() -> VetoPolicy {
        VetoPolicy::new(
            "PII handling",
            "Data deletion and privacy-sensitive changes",
            vec![TriggerCondition::Keyword {
                keywords: vec!["pii".to_string(), "personal data".to_string()],
                agent_to_notify: ReviewerRole::Compliance,
            }],
        )
    }

    #[test]
    fn keyword_trigger_matches_case_insensitively() {
        let trigger = TriggerCondition::Keyword {
            keywords: vec!["PII".to_string()],
            agent_to_notify: ReviewerRole::Compliance,
        };
        assert!(trigger.matches(&facts("Delete customer pii records", "")));
        assert!(trigger.matches(&facts("Routine", "touches PII store")));
        assert!(!trigger.matches(&facts("Rename a service", "no sensitive data")));
    }

    #[test]
    fn category_trigger_matches_configured_set() {
        let trigger = TriggerCondition::Category {
            categories: vec!["infrastructure".to_string()],
            agent_to_notify: ReviewerRole::Risk,
        };
        let mut f = facts("Anything", "");
        assert!(!trigger.matches(&f));
        f.category = Some("Infrastructure");
        assert!(trigger.matches(&f));
    }

    #[test]
    fn amount_trigger_compares_against_threshold() {
        let trigger = TriggerCondition::Amount {
            operator: AmountOperator::GreaterThan,
            threshold: 10_000,
            agent_to_notify: ReviewerRole::Finance,
        };
        let mut f = facts("Purchase", "");
        assert!(!trigger.matches(&f));
        f.amount = Some(50_000);
        assert!(trigger.matches(&f));
        f.amount = Some(10_000);
        assert!(!trigger.matches(&f));
    }

    #[test]
    fn risk_score_trigger_never_matches_without_a_score() {
        let trigger = TriggerCondition::RiskScore {
            operator: AmountOperator::GreaterThan,
            threshold: Score::new(50),
            agent_to_notify: ReviewerRole::Risk,
        };
        let mut f = facts("Anything", "");
        assert!(!trigger.matches(&f));
        f.risk_score = Some(Score::new(80));
        assert!(trigger.matches(&f));
    }

    #[test]
    fn policy_validation_rejects_empty_keywords() {
        let policy = VetoPolicy::new(
            "Broken",
            "",
            vec![TriggerCondition::Keyword {
                keywords: vec![],
                agent_to_notify: ReviewerRole::Risk,
            }],
        );
        assert!(policy.validate().is_err());
    }

    #[test]
    fn policy_validation_rejects_missing_triggers() {
        let policy = VetoPolicy::new("No triggers", "", vec![]);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn engine_rejects_invalid_policy() {
        let mut engine = PolicyEngine::new();
        let result = engine.add(VetoPolicy::new("Empty", "", vec![]));
        assert!(result.is_err());
        assert!(engine.policies().is_empty());
    }

    #[test]
    fn matching_trigger_adds_notified_reviewer() {
        let mut engine = PolicyEngine::new();
        engine.add(pii_policy()).unwrap();

        let required = engine
            .determine_required_reviewers(&facts("Delete customer PII records", ""));
        assert!(required.contains(&ReviewerRole::Compliance));
    }

    #[test]
    fn matched_policy_pulls_in_required_agents() {
        let mut engine = PolicyEngine::new();
        engine
            .add(pii_policy().with_required_agents(vec![ReviewerRole::Security]))
            .unwrap();

        let required =
            engine.determine_required_reviewers(&facts("Purge PII backups", ""));
        assert!(required.contains(&ReviewerRole::Compliance));
        assert!(required.contains(&ReviewerRole::Security));
    }

    #[test]
    fn risk_role_is_the_floor_when_nothing_matches() {
        let engine = PolicyEngine::new();
        let required = engine.determine_required_reviewers(&facts("Rename service", ""));
        assert_eq!(required.len(), 1);
        assert!(required.contains(&ReviewerRole::Risk));
    }

    #[test]
    fn inactive_policies_are_skipped() {
        let mut engine = PolicyEngine::new();
        let id = engine.add(pii_policy()).unwrap();
        engine.set_active(id, false).unwrap();

        let required =
            engine.determine_required_reviewers(&facts("Delete PII records", ""));
        assert!(!required.contains(&ReviewerRole::Compliance));
        assert!(required.contains(&ReviewerRole::Risk));
    }

    #[test]
    fn set_active_unknown_policy_errors() {
        let mut engine = PolicyEngine::new();
        let err = engine.set_active(PolicyId::new(), false).unwrap_err();
        assert_eq!(err.code, ErrorCode::PolicyNotFound);
    }

    #[test]
    fn auto_veto_threshold_takes_strictest_match() {
        let mut engine = PolicyEngine::new();
        engine
            .add(pii_policy().with_auto_veto_threshold(Score::new(70)))
            .unwrap();
        engine
            .add(
                VetoPolicy::new(
                    "Deletions",
                    "",
                    vec![TriggerCondition::Keyword {
                        keywords: vec!["delete".to_string()],
                        agent_to_notify: ReviewerRole::Risk,
                    }],
                )
                .with_auto_veto_threshold(Score::new(90)),
            )
            .unwrap();

        let threshold = engine
            .auto_veto_threshold(&facts("Delete customer PII records", ""))
            .unwrap();
        assert_eq!(threshold, Score::new(70));

        assert!(engine.auto_veto_threshold(&facts("Rename", "")).is_none());
    }

    #[test]
    fn trigger_condition_serializes_tagged() {
        let trigger = TriggerCondition::Keyword {
            keywords: vec!["pii".to_string()],
            agent_to_notify: ReviewerRole::Compliance,
        };
        let json = serde_json::to_value(&trigger).unwrap();
        assert_eq!(json["type"], "keyword");
        assert_eq!(json["agent_to_notify"], "compliance");
    }
}
