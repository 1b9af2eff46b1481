//! Content hashing for dirty tracking

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex SHA-256 over the JSON serialization of `value`.
///
/// Struct fields serialize in declaration order, so an unchanged value always
/// produces the same bytes and therefore the same digest.
pub fn compute_hash<T: Serialize + ?Sized>(value: &T) -> String {
    let mut hasher = Sha256::new();
    if let Err(e) = serde_json::to_writer(&mut hasher, value) {
        tracing::warn!(error = %e, "Hashing a value that failed to serialize");
    }
    hex::encode(hasher.finalize())
}
