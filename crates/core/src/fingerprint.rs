//! Fingerprint derivation for alert deduplication.
//!
//! A fingerprint is the content-addressed identity of an incident: two
//! alerts with the same `(service_id, fingerprint)` are the same incident
//! and are folded into one stored record.

use sha2::{Digest, Sha256};

/// Derive a fingerprint from an ordered sequence of identity parts.
///
/// Hashes the parts with SHA-256, separating them with a byte that cannot
/// appear in the values so `["ab", "c"]` and `["a", "bc"]` hash differently,
/// and keeps the first 16 bytes hex-encoded (32 chars).
///
/// Callers are responsible for ordering: label sets must be sorted before
/// being passed in so that insertion order does not change the identity.
pub fn derive_fingerprint<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
        hasher.update([0x1e]);
    }
    hex::encode(&hasher.finalize()[..16])
}
