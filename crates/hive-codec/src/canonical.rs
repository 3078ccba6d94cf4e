//! Canonical JSON encoding for signed payloads.
//!
//! `serde_json::Map` is backed by a `BTreeMap` (the `preserve_order` feature
//! is not enabled anywhere in this workspace), so object keys are always
//! emitted in ascending order, recursively, and `serde_json::to_vec` never
//! inserts insignificant whitespace. Canonicalization therefore reduces to
//! one rule this module owns: replace the `sig` field with a fixed sentinel
//! before hashing, so the signature never signs over itself.

use crate::error::CodecError;

/// Sentinel written into the `sig` field before computing signing bytes.
pub const SIG_SENTINEL: &str = "";

/// Produce the canonical bytes a signature commits to: `value` with its
/// `sig` field (if any) replaced by [`SIG_SENTINEL`], serialized compactly
/// with sorted keys.
pub fn canonical_bytes_for_signing(mut value: serde_json::Value) -> Vec<u8> {
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            "sig".to_string(),
            serde_json::Value::String(SIG_SENTINEL.to_string()),
        );
    }
    serde_json::to_vec(&value).expect("canonical json serialization of a Value cannot fail")
}

/// Parse a UTF-8 canonical JSON payload into a `serde_json::Value`.
pub fn parse_payload(bytes: &[u8]) -> Result<serde_json::Value, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::BadJson(e.to_string()))
}

/// Serialize `value` to canonical (sorted-key, compact) JSON bytes.
pub fn to_canonical_bytes(value: &serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(value).expect("canonical json serialization of a Value cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted() {
        let v = json!({"z": 1, "a": 2, "m": 3});
        let bytes = to_canonical_bytes(&v);
        let s = String::from_utf8(bytes).unwrap();
        assert_eq!(s, r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn sig_field_is_sentinel() {
        let v = json!({"sig": "deadbeef", "a": 1});
        let bytes = canonical_bytes_for_signing(v);
        let s = String::from_utf8(bytes).unwrap();
        assert_eq!(s, r#"{"a":1,"sig":""}"#);
    }
}
