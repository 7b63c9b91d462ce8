//! Attestation signer adapters.

mod sha256_signer;

pub use sha256_signer::Sha256AttestationSigner;
