//! Canonical serialization and SHA-256 hashing.
//!
//! Both the map engine and the context pack renderer use the same
//! substrate for tamper evidence and change detection: a value is
//! normalized into a canonical JSON form (object keys sorted, arrays in
//! declared order) and hashed with SHA-256. Two structurally equal
//! values always produce the same hash regardless of key insertion
//! order; volatile fields are excluded by the caller before hashing.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serializes a JSON value in canonical form.
///
/// `serde_json` with default features backs objects with a `BTreeMap`,
/// so object keys serialize in sorted order. Arrays keep their declared
/// order. Cycles cannot be represented in a [`Value`], so the operation
/// is total for any well-formed input.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized (e.g. a map with
/// non-string keys reached this layer).
pub fn canonical_json(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Computes the content hash of any serializable value.
///
/// The value is converted to a [`Value`] (normalizing key order) and
/// hashed over its canonical serialization.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn content_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let normalized = serde_json::to_value(value)?;
    Ok(hash_bytes(canonical_json(&normalized)?.as_bytes()))
}

/// Computes the lowercase hex SHA-256 digest of raw bytes.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_json_sorts_object_keys() {
        let a: Value = serde_json::from_str(r#"{"zebra":1,"alpha":2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"alpha":2,"zebra":1}"#).unwrap();
        assert_eq!(canonical_json(&a).unwrap(), canonical_json(&b).unwrap());
        assert_eq!(canonical_json(&a).unwrap(), r#"{"alpha":2,"zebra":1}"#);
    }

    #[test]
    fn canonical_json_preserves_array_order() {
        let v = json!(["c", "a", "b"]);
        assert_eq!(canonical_json(&v).unwrap(), r#"["c","a","b"]"#);
    }

    #[test]
    fn content_hash_is_key_order_independent() {
        let a: Value = serde_json::from_str(r#"{"x":{"b":1,"a":[1,2]},"y":null}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y":null,"x":{"a":[1,2],"b":1}}"#).unwrap();
        assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn content_hash_detects_single_value_change() {
        let a = json!({"k": "value"});
        let b = json!({"k": "valuf"});
        assert_ne!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn hash_bytes_matches_known_vector() {
        // SHA-256 of the empty string.
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hash_bytes_one_byte_flip_changes_digest() {
        assert_ne!(hash_bytes(b"hello"), hash_bytes(b"hellp"));
    }
}
