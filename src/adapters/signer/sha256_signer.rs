//! SHA-256 Attestation Signer Adapter
//!
//! Produces a SHA-256 digest over the export payload. A production
//! deployment substitutes a KMS-backed implementation of the same port;
//! the digest shape and verification contract stay identical.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::domain::foundation::Timestamp;
use crate::domain::ledger::ExportAttestation;
use crate::ports::{AttestationSigner, SignerError};

/// SHA-256 digest signer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256AttestationSigner;

impl Sha256AttestationSigner {
    pub fn new() -> Self {
        Self
    }

    fn hex_digest(payload: &[u8]) -> String {
        let digest = Sha256::digest(payload);
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[async_trait]
impl AttestationSigner for Sha256AttestationSigner {
    async fn sign(&self, payload: &[u8]) -> Result<ExportAttestation, SignerError> {
        Ok(ExportAttestation {
            algorithm: "sha-256".to_string(),
            digest: Self::hex_digest(payload),
            signed_at: Timestamp::now(),
        })
    }

    async fn verify(
        &self,
        payload: &[u8],
        attestation: &ExportAttestation,
    ) -> Result<bool, SignerError> {
        if attestation.algorithm != "sha-256" {
            return Err(SignerError::SigningFailed(format!(
                "Unsupported algorithm: {}",
                attestation.algorithm
            )));
        }
        Ok(Self::hex_digest(payload) == attestation.digest)
    }
}
