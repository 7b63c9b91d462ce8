//! Provenance service - the decision lifecycle and audit surface.
//!
//! A thin layer over the ledger store that pairs every mutation with a
//! best-effort snapshot persist. Persistence failures degrade to
//! in-memory-only operation with a warning; availability wins over
//! durability here, deliberately.

use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::foundation::{
    AgentId, AuditId, DecisionId, DomainError, EntryId, Score, UserId,
};
use crate::domain::ledger::{
    AuditExport, AuditFinding, AuditRecord, ChainVerification, DecisionRecord, DecisionVerdict,
    EntryFilter, LedgerEntry, LedgerStore, Vote,
};
use crate::ports::{AttestationSigner, SnapshotStore, SnapshotStoreError};

/// Orchestrates decision lifecycle, audits, and export over the ledger.
pub struct ProvenanceService {
    store: Arc<LedgerStore>,
    snapshots: Arc<dyn SnapshotStore>,
    signer: Option<Arc<dyn AttestationSigner>>,
    snapshot_key: String,
    signer_timeout: Duration,
}

impl ProvenanceService {
    /// Creates a service around an existing store and snapshot backend.
    pub fn new(
        store: Arc<LedgerStore>,
        snapshots: Arc<dyn SnapshotStore>,
        snapshot_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            snapshots,
            signer: None,
            snapshot_key: snapshot_key.into(),
            signer_timeout: Duration::from_secs(5),
        }
    }

    /// Attaches an attestation signer for exports.
    pub fn with_signer(mut self, signer: Arc<dyn AttestationSigner>, timeout: Duration) -> Self {
        self.signer = Some(signer);
        self.signer_timeout = timeout;
        self
    }

    /// The underlying store, for read-side composition.
    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    /// Hydrates the store from the persisted snapshot.
    ///
    /// A missing snapshot starts empty; a failed load logs a warning and
    /// runs in-memory-only rather than failing startup.
    pub async fn load(&self) -> Result<(), DomainError> {
        match self.snapshots.load(&self.snapshot_key).await {
            Ok(snapshot) => {
                self.store.hydrate(snapshot).await;
                Ok(())
            }
            Err(SnapshotStoreError::NotFound(_)) => {
                info!(key = %self.snapshot_key, "no snapshot found, starting empty");
                Ok(())
            }
            Err(err) => {
                warn!(
                    key = %self.snapshot_key,
                    error = %err,
                    "snapshot load failed, continuing in-memory only"
                );
                Ok(())
            }
        }
    }

    /// Persists the current snapshot. Failures are logged, not raised.
    pub async fn persist(&self) {
        let snapshot = self.store.snapshot().await;
        if let Err(err) = self.snapshots.save(&self.snapshot_key, &snapshot).await {
            warn!(
                key = %self.snapshot_key,
                error = %err,
                "snapshot save failed, ledger remains in-memory only"
            );
        }
    }

    // ------------------------------------------------------------------
    // Decision lifecycle
    // ------------------------------------------------------------------

    /// Proposes a new decision.
    pub async fn create_decision(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        proposed_by: AgentId,
        agents: Vec<AgentId>,
    ) -> DecisionRecord {
        let decision = self
            .store
            .create_decision(title, description, proposed_by, agents)
            .await;
        self.persist().await;
        decision
    }

    /// Records a deliberation contribution.
    pub async fn record_deliberation(
        &self,
        decision_id: DecisionId,
        agent_id: AgentId,
        text: impl Into<String>,
        confidence: Score,
    ) -> Result<LedgerEntry, DomainError> {
        let entry = self
            .store
            .record_deliberation(decision_id, agent_id, text, confidence)
            .await?;
        self.persist().await;
        Ok(entry)
    }

    /// Records a vote.
    pub async fn record_vote(
        &self,
        decision_id: DecisionId,
        agent_id: AgentId,
        vote: Vote,
        confidence: Score,
        reasoning: impl Into<String>,
    ) -> Result<LedgerEntry, DomainError> {
        let entry = self
            .store
            .record_vote(decision_id, agent_id, vote, confidence, reasoning)
            .await?;
        self.persist().await;
        Ok(entry)
    }

    /// Finalizes a decision with a verdict.
    pub async fn finalize_decision(
        &self,
        decision_id: DecisionId,
        verdict: DecisionVerdict,
        final_confidence: Score,
    ) -> Result<LedgerEntry, DomainError> {
        let entry = self
            .store
            .finalize_decision(decision_id, verdict, final_confidence)
            .await?;
        self.persist().await;
        Ok(entry)
    }

    /// Records the outcome of a finalized decision.
    pub async fn record_outcome(
        &self,
        decision_id: DecisionId,
        outcome: impl Into<String>,
        metrics: Map<String, JsonValue>,
    ) -> Result<LedgerEntry, DomainError> {
        let entry = self.store.record_outcome(decision_id, outcome, metrics).await?;
        self.persist().await;
        Ok(entry)
    }

    /// Marks a finalized decision as executed.
    pub async fn mark_executed(&self, decision_id: DecisionId) -> Result<LedgerEntry, DomainError> {
        let entry = self.store.mark_executed(decision_id).await?;
        self.persist().await;
        Ok(entry)
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
        let audit = self
            .store
            .request_audit(decision_id, requested_by, reason, framework)
            .await?;
        self.persist().await;
        Ok(audit)
    }

    /// Moves a pending audit to in-progress.
    pub async fn begin_audit(
        &self,
        decision_id: DecisionId,
        audit_id: AuditId,
    ) -> Result<LedgerEntry, DomainError> {
        let entry = self.store.begin_audit(decision_id, audit_id).await?;
        self.persist().await;
        Ok(entry)
    }

    /// Completes an audit with findings and a report.
    pub async fn complete_audit(
        &self,
        decision_id: DecisionId,
        audit_id: AuditId,
        findings: Vec<AuditFinding>,
        report: impl Into<String>,
    ) -> Result<LedgerEntry, DomainError> {
        let entry = self
            .store
            .complete_audit(decision_id, audit_id, findings, report)
            .await?;
        self.persist().await;
        Ok(entry)
    }

    /// Marks an audit failed.
    pub async fn fail_audit(
        &self,
        decision_id: DecisionId,
        audit_id: AuditId,
        reason: impl Into<String>,
    ) -> Result<LedgerEntry, DomainError> {
        let entry = self.store.fail_audit(decision_id, audit_id, reason).await?;
        self.persist().await;
        Ok(entry)
    }

    // ------------------------------------------------------------------
    // Verification & export
    // ------------------------------------------------------------------

    /// Verifies the full chain.
    pub async fn verify_chain(&self) -> ChainVerification {
        self.store.verify_chain().await
    }

    /// Verifies one entry, flipping its verified flag on success.
    pub async fn verify_entry(
        &self,
        entry_id: EntryId,
        verified_by: impl Into<String>,
    ) -> Result<bool, DomainError> {
        let verified = self.store.verify_entry(entry_id, verified_by).await?;
        if verified {
            self.persist().await;
        }
        Ok(verified)
    }

    /// Builds the audit export for a decision, attaching a signed
    /// attestation when a signer is configured.
    ///
    /// Signing is wrapped in a timeout; a slow or failing signer degrades
    /// to an unsigned export instead of blocking.
    pub async fn export_for_audit(
        &self,
        decision_id: DecisionId,
    ) -> Result<AuditExport, DomainError> {
        let mut export = self.store.export(decision_id).await?;

        if let Some(signer) = &self.signer {
            match serde_json::to_vec(&export) {
                Ok(payload) => {
                    match tokio::time::timeout(self.signer_timeout, signer.sign(&payload)).await {
                        Ok(Ok(attestation)) => export.attestation = Some(attestation),
                        Ok(Err(err)) => {
                            warn!(error = %err, "export attestation failed, exporting unsigned");
                        }
                        Err(_) => {
                            warn!(
                                timeout_secs = self.signer_timeout.as_secs(),
                                "export attestation timed out, exporting unsigned"
                            );
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "export serialization for signing failed");
                }
            }
        }

        Ok(export)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Looks up one entry.
    pub async fn entry(&self, entry_id: EntryId) -> Option<LedgerEntry> {
        self.store.entry(entry_id).await
    }

    /// All entries, newest first.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.store.entries().await
    }

    /// Entries for one decision, chronological.
    pub async fn entries_for_decision(&self, decision_id: DecisionId) -> Vec<LedgerEntry> {
        self.store.entries_for_decision(decision_id).await
    }

    /// Entries matching a filter.
    pub async fn search(&self, filter: &EntryFilter) -> Vec<LedgerEntry> {
        self.store.search(filter).await
    }

    /// Looks up one decision.
    pub async fn decision(&self, decision_id: DecisionId) -> Option<DecisionRecord> {
        self.store.decision(decision_id).await
    }

    /// All decisions.
    pub async fn decisions(&self) -> Vec<DecisionRecord> {
        self.store.decisions().await
    }
}
