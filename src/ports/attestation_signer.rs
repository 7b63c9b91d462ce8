//! Attestation Signer Port - cryptographic digest for export attestation.
//!
//! The ledger's own checksum is a fast integrity check, not a security
//! proof. Externally-verifiable signature material goes through this port
//! instead (backed by a platform crypto provider or KMS), and stays off
//! the append critical path.

use async_trait::async_trait;

use crate::domain::ledger::ExportAttestation;

/// Errors that can occur during signing or verification.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("Signer unavailable: {0}")]
    Unavailable(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Port for producing and checking export attestations.
#[async_trait]
pub trait AttestationSigner: Send + Sync {
    /// Produce an attestation over the payload bytes.
    async fn sign(&self, payload: &[u8]) -> Result<ExportAttestation, SignerError>;

    /// Check an attestation against the payload bytes.
    async fn verify(
        &self,
        payload: &[u8],
        attestation: &ExportAttestation,
    ) -> Result<bool, SignerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signer_error_display() {
        let err = SignerError::SigningFailed("key rotation in progress".to_string());
        assert!(err.to_string().contains("Signing failed"));
    }
}
