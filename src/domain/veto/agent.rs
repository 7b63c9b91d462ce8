//! Reviewer role definitions - the static veto agent registry.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::foundation::Score;

/// The reviewer roles the governance engine can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerRole {
    Risk,
    Compliance,
    Legal,
    Finance,
    Security,
}

impl ReviewerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewerRole::Risk => "risk",
            ReviewerRole::Compliance => "compliance",
            ReviewerRole::Legal => "legal",
            ReviewerRole::Finance => "finance",
            ReviewerRole::Security => "security",
        }
    }

    /// All roles, in registry order.
    pub fn all() -> [ReviewerRole; 5] {
        [
            ReviewerRole::Risk,
            ReviewerRole::Compliance,
            ReviewerRole::Legal,
            ReviewerRole::Finance,
            ReviewerRole::Security,
        ]
    }
}

impl fmt::Display for ReviewerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static definition of one reviewer role.
///
/// Not persisted; the registry is compiled-in configuration.
#[derive(Debug, Clone)]
pub struct VetoAgent {
    pub role: ReviewerRole,
    /// Concern categories this role is competent to raise.
    pub jurisdiction: &'static [&'static str],
    /// Risk score at or above which this role's review becomes a veto.
    pub veto_threshold: Score,
    /// Whether a veto from this role blocks automatically.
    pub can_block_automatic: bool,
    /// Whether this role's veto can only be lifted by a human override.
    pub requires_human_override: bool,
}

static REGISTRY: Lazy<BTreeMap<ReviewerRole, VetoAgent>> = Lazy::new(|| {
    let agents = [
        VetoAgent {
            role: ReviewerRole::Risk,
            jurisdiction: &["operational", "strategic", "irreversible", "data"],
            veto_threshold: Score::new(75),
            can_block_automatic: true,
            requires_human_override: false,
        },
        VetoAgent {
            role: ReviewerRole::Compliance,
            jurisdiction: &["privacy", "regulatory", "compliance", "data"],
            veto_threshold: Score::new(60),
            can_block_automatic: true,
            requires_human_override: true,
        },
        VetoAgent {
            role: ReviewerRole::Legal,
            jurisdiction: &["legal", "contractual", "regulatory"],
            veto_threshold: Score::new(70),
            can_block_automatic: true,
            requires_human_override: true,
        },
        VetoAgent {
            role: ReviewerRole::Finance,
            jurisdiction: &["financial", "budget"],
            veto_threshold: Score::new(70),
            can_block_automatic: false,
            requires_human_override: false,
        },
        VetoAgent {
            role: ReviewerRole::Security,
            jurisdiction: &["security", "access", "data"],
            veto_threshold: Score::new(65),
            can_block_automatic: true,
            requires_human_override: false,
        },
    ];
    agents.into_iter().map(|a| (a.role, a)).collect()
});

/// Looks up the static definition for a role.
pub fn registered_agent(role: ReviewerRole) -> &'static VetoAgent {
    &REGISTRY[&role]
}

/// All registered role definitions.
pub fn registered_agents() -> impl Iterator<Item = &'static VetoAgent> {
    REGISTRY.values()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_is_registered() {
        for role in ReviewerRole::all() {
            let agent = registered_agent(role);
            assert_eq!(agent.role, role);
            assert!(!agent.jurisdiction.is_empty());
        }
    }

    #[test]
    fn compliance_requires_human_override() {
        let agent = registered_agent(ReviewerRole::Compliance);
        assert!(agent.requires_human_override);
        assert!(agent.can_block_automatic);
    }

    #[test]
    fn finance_cannot_block_automatically() {
        assert!(!registered_agent(ReviewerRole::Finance).can_block_automatic);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ReviewerRole::Compliance).unwrap(),
            "\"compliance\""
        );
    }

    #[test]
    fn registry_iterates_all_roles() {
        assert_eq!(registered_agents().count(), ReviewerRole::all().len());
    }
}
