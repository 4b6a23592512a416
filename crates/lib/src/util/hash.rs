//! Hashing utilities for configuration fingerprints.
//!
//! This module provides:
//! - `Hashable`: deterministic digest of any serializable value
//! - `hash_bytes()`: Arbitrary byte hashing

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::consts::FINGERPRINT_SEGMENT_LEN;

pub type HashError = serde_json::Error;

/// Values whose JSON serialization is stable can be digested directly.
///
/// The digest is two truncated SHA-256 segments joined by `-`: the first over
/// the serialized material, the second over the material with a fixed suffix.
/// Callers must only serialize ordered containers (`Vec`, `BTreeMap`) so the
/// material does not depend on hash-map iteration order.
pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<String, HashError> {
    let serialized = serde_json::to_string(self)?;
    let first = hash_bytes(serialized.as_bytes());
    let second = hash_bytes(format!("{}-key2", serialized).as_bytes());
    Ok(format!(
      "{}-{}",
      &first[..FINGERPRINT_SEGMENT_LEN],
      &second[..FINGERPRINT_SEGMENT_LEN]
    ))
  }
}

/// Hash arbitrary bytes.
///
/// Returns the full 64-character SHA256 hash, lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  hex::encode(hasher.finalize())
}
