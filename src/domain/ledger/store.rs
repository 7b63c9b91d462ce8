//! Ledger store - the single-writer, append-only chain and decision index.
//!
//! Computing `previous_hash` requires reading the current tail and appending
//! writes a new one, so the whole read-then-write sequence runs under one
//! write-lock acquisition. Reads take the read lock and see a consistent
//! snapshot; they never race an in-flight append.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::domain::foundation::{
    AgentId, AuditId, DecisionId, DomainError, EntryId, ErrorCode, OrganizationId, Score,
    Timestamp, UserId,
};

use super::audit::{AuditFinding, AuditRecord};
use super::checksum::GENESIS_HASH;
use super::decision::{DecisionRecord, DecisionVerdict};
use super::entry::{AppendRequest, EventType, LedgerEntry, Vote};

/// Result of walking the chain from genesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainVerification {
    pub valid: bool,
    pub entries_checked: usize,
    /// Sequence number where divergence begins, if any.
    pub broken_at: Option<u64>,
    pub broken_entry_id: Option<EntryId>,
    pub message: String,
}

impl ChainVerification {
    fn valid(entries_checked: usize) -> Self {
        Self {
            valid: true,
            entries_checked,
            broken_at: None,
            broken_entry_id: None,
            message: format!("Chain valid: {} entries verified", entries_checked),
        }
    }

    fn broken(entries_checked: usize, entry: &LedgerEntry, reason: &str) -> Self {
        Self {
            valid: false,
            entries_checked,
            broken_at: Some(entry.sequence),
            broken_entry_id: Some(entry.id),
            message: format!("Chain broken at sequence {}: {}", entry.sequence, reason),
        }
    }
}

/// One `{sequence, hash}` pair in an exported report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashChainLink {
    pub sequence: u64,
    pub hash: String,
}

/// Cryptographic attestation attached to an export by the signer port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportAttestation {
    pub algorithm: String,
    pub digest: String,
    pub signed_at: Timestamp,
}

/// Everything an external party needs to independently re-derive and check
/// one decision's sub-chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditExport {
    pub verification: ChainVerification,
    pub decision: DecisionRecord,
    pub entries: Vec<LedgerEntry>,
    pub hash_chain: Vec<HashChainLink>,
    pub exported_at: Timestamp,
    pub attestation: Option<ExportAttestation>,
}

/// Filter for entry search. All criteria are optional and conjunctive.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub event_type: Option<EventType>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub agent_id: Option<AgentId>,
    pub compliance_framework: Option<String>,
    pub pii_involved: Option<bool>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn with_time_range(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_agent(mut self, agent_id: AgentId) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.compliance_framework = Some(framework.into());
        self
    }

    pub fn with_pii(mut self, pii: bool) -> Self {
        self.pii_involved = Some(pii);
        self
    }

    fn matches(&self, entry: &LedgerEntry) -> bool {
        if let Some(event_type) = self.event_type {
            if entry.event_type != event_type {
                return false;
            }
        }
        if let Some(from) = self.from {
            if entry.timestamp.is_before(&from) {
                return false;
            }
        }
        if let Some(to) = self.to {
            if entry.timestamp.is_after(&to) {
                return false;
            }
        }
        if let Some(agent_id) = &self.agent_id {
            if entry.agent_id.as_ref() != Some(agent_id) {
                return false;
            }
        }
        if let Some(framework) = &self.compliance_framework {
            if !entry.compliance_frameworks.iter().any(|f| f == framework) {
                return false;
            }
        }
        if let Some(pii) = self.pii_involved {
            if entry.pii_involved != pii {
                return false;
            }
        }
        true
    }
}

/// Persisted snapshot of the full store. Timestamps serialize as ISO-8601.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub sequence: u64,
    pub entries: Vec<LedgerEntry>,
    pub decisions: Vec<DecisionRecord>,
}

#[derive(Default)]
struct LedgerInner {
    /// Process-wide monotonic counter; only `append` advances it.
    sequence: u64,
    /// Entries in sequence order.
    entries: Vec<LedgerEntry>,
    entry_index: HashMap<EntryId, usize>,
    decisions: HashMap<DecisionId, DecisionRecord>,
    decision_order: Vec<DecisionId>,
}

/// The append-only ledger and decision index.
///
/// Cheap to clone; clones share the same underlying chain.
#[derive(Clone)]
pub struct LedgerStore {
    organization_id: OrganizationId,
    inner: Arc<RwLock<LedgerInner>>,
}

impl LedgerStore {
    /// Creates an empty store owned by one organization.
    pub fn new(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            inner: Arc::new(RwLock::new(LedgerInner::default())),
        }
    }

    /// The organization every entry in this store is stamped with.
    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    // ------------------------------------------------------------------
    // Append
    // ------------------------------------------------------------------

    /// Appends one entry to the chain.
    ///
    /// Atomic: the entry is fully hashed before insertion and the tail
    /// read, sequence assignment, and insert happen under one write lock.
    /// An unknown `decision_id` still succeeds as an orphan entry;
    /// decision linkage is best-effort.
    pub async fn append(&self, request: AppendRequest) -> LedgerEntry {
        let mut inner = self.inner.write().await;
        self.append_locked(&mut inner, request)
    }

    fn append_locked(&self, inner: &mut LedgerInner, request: AppendRequest) -> LedgerEntry {
        let previous_hash = inner
            .entries
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let sequence = inner.sequence + 1;
        let retention = request
            .retention_period_days
            .unwrap_or_else(|| request.sensitivity_level.default_retention_days());

        let mut entry = LedgerEntry {
            id: EntryId::new(),
            sequence,
            timestamp: Timestamp::now(),
            event_type: request.event_type,
            decision_id: request.decision_id,
            organization_id: self.organization_id.clone(),
            user_id: request.user_id,
            agent_id: request.agent_id,
            title: request.title,
            description: request.description,
            data: request.data,
            confidence_score: request.confidence_score,
            vote: request.vote,
            vote_weight: request.vote_weight,
            previous_hash,
            hash: String::new(),
            compliance_frameworks: request.compliance_frameworks,
            retention_period_days: retention,
            sensitivity_level: request.sensitivity_level,
            pii_involved: request.pii_involved,
            verified: false,
            verified_at: None,
            verified_by: None,
        };
        entry.hash = entry.compute_hash();

        inner.sequence = sequence;
        inner.entry_index.insert(entry.id, inner.entries.len());
        inner.entries.push(entry.clone());

        match inner.decisions.get_mut(&entry.decision_id) {
            Some(decision) => decision.link_entry(entry.id, &entry.hash),
            None => {
                // Best-effort linkage: orphan entries are facts too.
                debug!(
                    decision_id = %entry.decision_id,
                    event_type = %entry.event_type,
                    "appended orphan entry for unknown decision"
                );
            }
        }

        entry
    }

    // ------------------------------------------------------------------
    // Decision lifecycle
    // ------------------------------------------------------------------

    /// Registers a new decision and appends its `decision.proposed` entry.
    pub async fn create_decision(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        proposed_by: AgentId,
        agents: Vec<AgentId>,
    ) -> DecisionRecord {
        let decision = DecisionRecord::new(title, description, proposed_by.clone(), agents);

        let mut inner = self.inner.write().await;
        inner.decisions.insert(decision.id, decision.clone());
        inner.decision_order.push(decision.id);

        let request = AppendRequest::new(
            EventType::DecisionProposed,
            decision.id,
            decision.title.clone(),
            format!("Decision proposed by {}", proposed_by),
        )
        .with_agent(proposed_by);
        self.append_locked(&mut inner, request);

        info!(decision_id = %decision.id, "decision created");
        // Re-read: append_locked set the hash anchors on the stored record.
        inner.decisions.get(&decision.id).cloned().unwrap_or(decision)
    }

    /// Records a deliberation contribution, moving the decision to
    /// `deliberating` if it has not progressed past it.
    pub async fn record_deliberation(
        &self,
        decision_id: DecisionId,
        agent_id: AgentId,
        text: impl Into<String>,
        confidence: Score,
    ) -> Result<LedgerEntry, DomainError> {
        let text = text.into();
        let mut inner = self.inner.write().await;
        let decision = inner
            .decisions
            .get_mut(&decision_id)
            .ok_or_else(|| DomainError::decision_not_found(decision_id))?;
        decision.mark_deliberating();
        let title = decision.title.clone();

        let request = AppendRequest::new(
            EventType::AgentContributed,
            decision_id,
            title,
            format!("Deliberation contribution from {}", agent_id),
        )
        .with_agent(agent_id)
        .with_confidence(confidence)
        .with_data_field("text", json!(text));
        Ok(self.append_locked(&mut inner, request))
    }

    /// Records a vote, moving the decision to `voting`.
    ///
    /// A `veto` ballot is recorded as an `agent.vetoed` entry.
    pub async fn record_vote(
        &self,
        decision_id: DecisionId,
        agent_id: AgentId,
        vote: Vote,
        confidence: Score,
        reasoning: impl Into<String>,
    ) -> Result<LedgerEntry, DomainError> {
        let reasoning = reasoning.into();
        let mut inner = self.inner.write().await;
        let decision = inner
            .decisions
            .get_mut(&decision_id)
            .ok_or_else(|| DomainError::decision_not_found(decision_id))?;
        decision.mark_voting();
        decision.record_voter(agent_id.clone(), vote, confidence);
        let title = decision.title.clone();

        let event_type = if vote == Vote::Veto {
            EventType::AgentVetoed
        } else {
            EventType::AgentVoted
        };
        let request = AppendRequest::new(
            event_type,
            decision_id,
            title,
            format!("{} cast by {}", vote, agent_id),
        )
        .with_agent(agent_id)
        .with_vote(vote)
        .with_confidence(confidence)
        .with_data_field("reasoning", json!(reasoning));
        Ok(self.append_locked(&mut inner, request))
    }

    /// Applies a terminal verdict and appends the matching terminal entry.
    pub async fn finalize_decision(
        &self,
        decision_id: DecisionId,
        verdict: DecisionVerdict,
        final_confidence: Score,
    ) -> Result<LedgerEntry, DomainError> {
        let mut inner = self.inner.write().await;
        let decision = inner
            .decisions
            .get_mut(&decision_id)
            .ok_or_else(|| DomainError::decision_not_found(decision_id))?;
        decision.finalize(verdict, final_confidence)?;
        let title = decision.title.clone();

        let event_type = match verdict {
            DecisionVerdict::Approved => EventType::DecisionApproved,
            DecisionVerdict::Rejected => EventType::DecisionRejected,
            DecisionVerdict::Vetoed => EventType::DecisionVetoed,
        };
        let request = AppendRequest::new(
            event_type,
            decision_id,
            title,
            format!("Decision finalized: {:?}", verdict),
        )
        .with_confidence(final_confidence);
        let entry = self.append_locked(&mut inner, request);
        info!(decision_id = %decision_id, verdict = ?verdict, "decision finalized");
        Ok(entry)
    }

    /// Records the real-world outcome of a finalized decision.
    pub async fn record_outcome(
        &self,
        decision_id: DecisionId,
        outcome: impl Into<String>,
        metrics: Map<String, JsonValue>,
    ) -> Result<LedgerEntry, DomainError> {
        let outcome = outcome.into();
        let mut inner = self.inner.write().await;
        let decision = inner
            .decisions
            .get_mut(&decision_id)
            .ok_or_else(|| DomainError::decision_not_found(decision_id))?;
        decision.record_outcome(outcome.clone())?;
        let title = decision.title.clone();

        let request = AppendRequest::new(
            EventType::OutcomeRecorded,
            decision_id,
            title,
            format!("Outcome recorded: {}", outcome),
        )
        .with_data_field("outcome", json!(outcome))
        .with_data_field("metrics", JsonValue::Object(metrics));
        Ok(self.append_locked(&mut inner, request))
    }

    /// Marks a finalized decision as executed (caller-driven).
    pub async fn mark_executed(
        &self,
        decision_id: DecisionId,
    ) -> Result<LedgerEntry, DomainError> {
        let mut inner = self.inner.write().await;
        let decision = inner
            .decisions
            .get_mut(&decision_id)
            .ok_or_else(|| DomainError::decision_not_found(decision_id))?;
        decision.mark_executed()?;
        let title = decision.title.clone();

        let request = AppendRequest::new(
            EventType::DecisionExecuted,
            decision_id,
            title,
            "Decision executed",
        );
        Ok(self.append_locked(&mut inner, request))
    }

    // ------------------------------------------------------------------
    // Audits
    // ------------------------------------------------------------------

    /// Opens a compliance audit against a decision.
    pub async fn request_audit(
        &self,
        decision_id: DecisionId,
        requested_by: UserId,
        reason: impl Into<String>,
        framework: impl Into<String>,
    ) -> Result<AuditRecord, DomainError> {
        let reason = reason.into();
        let framework = framework.into();
        let mut inner = self.inner.write().await;
        let decision = inner
            .decisions
            .get_mut(&decision_id)
            .ok_or_else(|| DomainError::decision_not_found(decision_id))?;

        let audit = AuditRecord::new(requested_by.clone(), reason.clone(), framework.clone());
        decision.audit_history.push(audit.clone());
        let title = decision.title.clone();

        let request = AppendRequest::new(
            EventType::AuditRequested,
            decision_id,
            title,
            format!("Audit requested under {}: {}", framework, reason),
        )
        .with_user(requested_by)
        .with_frameworks(vec![framework])
        .with_data_field("audit_id", json!(audit.id.to_string()));
        self.append_locked(&mut inner, request);
        Ok(audit)
    }

    /// Moves a pending audit to in-progress.
    pub async fn begin_audit(
        &self,
        decision_id: DecisionId,
        audit_id: AuditId,
    ) -> Result<LedgerEntry, DomainError> {
        let mut inner = self.inner.write().await;
        let decision = inner
            .decisions
            .get_mut(&decision_id)
            .ok_or_else(|| DomainError::decision_not_found(decision_id))?;
        let audit = find_audit(decision, audit_id)?;
        audit.begin()?;
        let framework = audit.framework.clone();
        let title = decision.title.clone();

        let request = AppendRequest::new(
            EventType::AuditStarted,
            decision_id,
            title,
            format!("Audit started under {}", framework),
        )
        .with_data_field("audit_id", json!(audit_id.to_string()));
        Ok(self.append_locked(&mut inner, request))
    }

    /// Completes an audit, deriving the decision's compliance status from
    /// the findings: review-needed if any is high or critical severity.
    pub async fn complete_audit(
        &self,
        decision_id: DecisionId,
        audit_id: AuditId,
        findings: Vec<AuditFinding>,
        report: impl Into<String>,
    ) -> Result<LedgerEntry, DomainError> {
        use super::decision::ComplianceStatus;

        let mut inner = self.inner.write().await;
        let decision = inner
            .decisions
            .get_mut(&decision_id)
            .ok_or_else(|| DomainError::decision_not_found(decision_id))?;
        let audit = find_audit(decision, audit_id)?;
        audit.complete(findings, report)?;
        let severe = audit.has_severe_findings();
        let finding_count = audit.findings.len();
        let framework = audit.framework.clone();

        decision.compliance_status = if severe {
            ComplianceStatus::ReviewNeeded
        } else {
            ComplianceStatus::Compliant
        };
        let title = decision.title.clone();

        let request = AppendRequest::new(
            EventType::AuditCompleted,
            decision_id,
            title,
            format!(
                "Audit completed under {}: {} finding(s)",
                framework, finding_count
            ),
        )
        .with_frameworks(vec![framework])
        .with_data_field("audit_id", json!(audit_id.to_string()))
        .with_data_field("finding_count", json!(finding_count))
        .with_data_field("severe_findings", json!(severe));
        Ok(self.append_locked(&mut inner, request))
    }

    /// Marks an audit failed.
    pub async fn fail_audit(
        &self,
        decision_id: DecisionId,
        audit_id: AuditId,
        reason: impl Into<String>,
    ) -> Result<LedgerEntry, DomainError> {
        let reason = reason.into();
        let mut inner = self.inner.write().await;
        let decision = inner
            .decisions
            .get_mut(&decision_id)
            .ok_or_else(|| DomainError::decision_not_found(decision_id))?;
        let audit = find_audit(decision, audit_id)?;
        audit.fail(reason.clone())?;
        let title = decision.title.clone();

        let request = AppendRequest::new(
            EventType::AuditFailed,
            decision_id,
            title,
            format!("Audit failed: {}", reason),
        )
        .with_data_field("audit_id", json!(audit_id.to_string()));
        Ok(self.append_locked(&mut inner, request))
    }

    // ------------------------------------------------------------------
    // Verification
    // ------------------------------------------------------------------

    /// Walks the chain from genesis, checking linkage then recomputed
    /// hashes. Reports the first divergence; never repairs.
    pub async fn verify_chain(&self) -> ChainVerification {
        // Verify against a consistent snapshot so appends are not blocked
        // for the whole walk.
        let entries = {
            let inner = self.inner.read().await;
            inner.entries.clone()
        };

        let mut expected_prev = GENESIS_HASH.to_string();
        for (i, entry) in entries.iter().enumerate() {
            if entry.previous_hash != expected_prev {
                error!(
                    sequence = entry.sequence,
                    entry_id = %entry.id,
                    "chain linkage mismatch"
                );
                return ChainVerification::broken(i, entry, "previous_hash does not match prior entry");
            }
            if entry.compute_hash() != entry.hash {
                error!(
                    sequence = entry.sequence,
                    entry_id = %entry.id,
                    "entry hash mismatch"
                );
                return ChainVerification::broken(i, entry, "stored hash does not match recomputed hash");
            }
            expected_prev = entry.hash.clone();

            // Stay interruptible on large ledgers.
            if i % 256 == 255 {
                tokio::task::yield_now().await;
            }
        }
        ChainVerification::valid(entries.len())
    }

    /// Recomputes one entry's hash, marking it verified on success.
    ///
    /// Does not check chain linkage. Returns `Ok(false)` (and mutates
    /// nothing) when the recomputed hash differs.
    pub async fn verify_entry(
        &self,
        entry_id: EntryId,
        verified_by: impl Into<String>,
    ) -> Result<bool, DomainError> {
        let mut inner = self.inner.write().await;
        let idx = *inner.entry_index.get(&entry_id).ok_or_else(|| {
            DomainError::new(ErrorCode::EntryNotFound, format!("Entry not found: {}", entry_id))
        })?;
        let entry = &mut inner.entries[idx];
        if entry.compute_hash() != entry.hash {
            error!(entry_id = %entry_id, sequence = entry.sequence, "entry failed verification");
            return Ok(false);
        }
        entry.mark_verified(verified_by);
        Ok(true)
    }

    /// Builds the audit export for one decision: full-chain verification,
    /// the decision snapshot, its entries in order, and the sub-chain's
    /// `{sequence, hash}` pairs.
    pub async fn export(&self, decision_id: DecisionId) -> Result<AuditExport, DomainError> {
        let verification = self.verify_chain().await;

        let inner = self.inner.read().await;
        let decision = inner
            .decisions
            .get(&decision_id)
            .cloned()
            .ok_or_else(|| DomainError::decision_not_found(decision_id))?;
        let entries: Vec<LedgerEntry> = inner
            .entries
            .iter()
            .filter(|e| e.decision_id == decision_id)
            .cloned()
            .collect();
        let hash_chain = entries
            .iter()
            .map(|e| HashChainLink {
                sequence: e.sequence,
                hash: e.hash.clone(),
            })
            .collect();

        Ok(AuditExport {
            verification,
            decision,
            entries,
            hash_chain,
            exported_at: Timestamp::now(),
            attestation: None,
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Looks up one entry by id.
    pub async fn entry(&self, entry_id: EntryId) -> Option<LedgerEntry> {
        let inner = self.inner.read().await;
        inner
            .entry_index
            .get(&entry_id)
            .map(|&idx| inner.entries[idx].clone())
    }

    /// All entries, newest first.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        let inner = self.inner.read().await;
        inner.entries.iter().rev().cloned().collect()
    }

    /// Entries for one decision, chronological.
    pub async fn entries_for_decision(&self, decision_id: DecisionId) -> Vec<LedgerEntry> {
        let inner = self.inner.read().await;
        inner
            .entries
            .iter()
            .filter(|e| e.decision_id == decision_id)
            .cloned()
            .collect()
    }

    /// Entries matching a filter, chronological.
    pub async fn search(&self, filter: &EntryFilter) -> Vec<LedgerEntry> {
        let inner = self.inner.read().await;
        inner
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    /// Looks up one decision by id.
    pub async fn decision(&self, decision_id: DecisionId) -> Option<DecisionRecord> {
        let inner = self.inner.read().await;
        inner.decisions.get(&decision_id).cloned()
    }

    /// All decisions, in creation order.
    pub async fn decisions(&self) -> Vec<DecisionRecord> {
        let inner = self.inner.read().await;
        inner
            .decision_order
            .iter()
            .filter_map(|id| inner.decisions.get(id).cloned())
            .collect()
    }

    /// The current sequence counter (highest assigned sequence).
    pub async fn sequence(&self) -> u64 {
        self.inner.read().await.sequence
    }

    /// Number of entries in the chain.
    pub async fn entry_count(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// True when the chain has no entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    // ------------------------------------------------------------------
    // Snapshot
    // ------------------------------------------------------------------

    /// Captures the full store state for persistence.
    pub async fn snapshot(&self) -> LedgerSnapshot {
        let inner = self.inner.read().await;
        LedgerSnapshot {
            sequence: inner.sequence,
            entries: inner.entries.clone(),
            decisions: inner
                .decision_order
                .iter()
                .filter_map(|id| inner.decisions.get(id).cloned())
                .collect(),
        }
    }

    /// Replaces the store state with a persisted snapshot.
    ///
    /// Hydration does not verify the chain; callers run `verify_chain`
    /// afterwards when they need the integrity check, and violations are
    /// reported, not corrected.
    pub async fn hydrate(&self, snapshot: LedgerSnapshot) {
        let mut inner = self.inner.write().await;
        inner.sequence = snapshot.sequence;
        inner.entry_index = snapshot
            .entries
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.id, idx))
            .collect();
        inner.entries = snapshot.entries;
        inner.decision_order = snapshot.decisions.iter().map(|d| d.id).collect();
        inner.decisions = snapshot.decisions.into_iter().map(|d| (d.id, d)).collect();
        info!(
            entries = inner.entries.len(),
            decisions = inner.decision_order.len(),
            "ledger hydrated from snapshot"
        );
    }
}

fn find_audit(
    decision: &mut DecisionRecord,
    audit_id: AuditId,
) -> Result<&mut AuditRecord, DomainError> {
    decision
        .audit_history
        .iter_mut()
        .find(|a| a.id == audit_id)
        .ok_or_else(|| {
            DomainError::new(ErrorCode::AuditNotFound, format!("Audit not found: {}", audit_id))
        })
}
