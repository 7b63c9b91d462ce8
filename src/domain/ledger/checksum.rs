//! Integrity checksum for chain linking.
//!
//! Four independent passes of a 32-bit multiplicative rolling hash, each
//! with its own fixed seed, finalized with a murmur-style bit mixer and
//! concatenated into a 64-hex-char digest. This is an integrity checksum
//! for detecting corruption, not a cryptographic commitment; attestation
//! material goes through the `AttestationSigner` port instead.

/// Sentinel `previous_hash` for the first entry in the chain.
///
/// Sixteen zeros - a value `digest` can never produce in practice, making
/// genesis detection unambiguous.
pub const GENESIS_HASH: &str = "0000000000000000";

/// Per-lane seeds. Must stay fixed: every stored hash depends on them.
const LANE_SEEDS: [u32; 4] = [0x811c_9dc5, 0x9747_b28c, 0x1b87_3593, 0xcc9e_2d51];

/// FNV-1a 32-bit prime.
const MULTIPLIER: u32 = 0x0100_0193;

/// Computes the 64-hex-char integrity digest of `bytes`.
///
/// Deterministic: identical input always yields an identical digest, and a
/// single flipped bit changes the digest with high probability.
pub fn digest(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(64);
    for seed in LANE_SEEDS {
        let mut h = seed;
        for &b in bytes {
            h ^= u32::from(b);
            h = h.wrapping_mul(MULTIPLIER);
        }
        out.push_str(&format!("{:08x}", fmix32(h)));
    }
    out
}

/// Final avalanche step (murmur3 fmix32).
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}
