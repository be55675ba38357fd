//! Deterministic per-value PRNG construction.
//!
//! Every generated value gets its own generator, re-seeded from
//! `SHA-256("<seed>:<value>:<attempt>")`. No global generator exists, so
//! output never depends on processing order and engines can be sharded
//! freely.

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

/// Build the PRNG for one `(seed, value, attempt)` triple.
///
/// An absent session seed is rendered as the empty string, matching the
/// vault's hash-key convention.
pub fn value_rng(seed: Option<&str>, value: &str, attempt: u32) -> ChaCha20Rng {
    let mut hasher = Sha256::new();
    hasher.update(seed.unwrap_or("").as_bytes());
    hasher.update(b":");
    hasher.update(value.as_bytes());
    hasher.update(b":");
    hasher.update(attempt.to_string().as_bytes());
    let digest = hasher.finalize();

    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    ChaCha20Rng::from_seed(key)
}
