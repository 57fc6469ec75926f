//! Shared-secret request signatures.
//!
//! Two nodes that trust each other share a secret. The caller attaches a
//! SHA-256 digest of `secret ‖ path ‖ canonical-param-string` as the
//! `request_signature` parameter; the receiving node recomputes the digest
//! and requires an exact match before dispatching an externally originated
//! request.
//!
//! The canonical param string is the URL-encoded `key=value` join over all
//! params except `request_signature` itself. Params iterate in sorted key
//! order, so the canonical form is stable regardless of insertion order.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::request::Params;

/// Parameter carrying the signature on the wire.
pub const SIGNATURE_PARAM: &str = "request_signature";

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Structured values go over the wire as compact JSON.
        other => other.to_string(),
    }
}

fn encode_pairs<'a>(pairs: impl Iterator<Item = (&'a String, &'a Value)>) -> String {
    let mut query = String::new();
    for (key, value) in pairs {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&urlencoding::encode(key));
        query.push('=');
        query.push_str(&urlencoding::encode(&value_to_string(value)));
    }
    query
}

/// URL-encode all params, signature included. This is the exact encoding the
/// remote transport sends, so what gets signed is what gets sent.
#[must_use]
pub fn encode_query(params: &Params) -> String {
    encode_pairs(params.iter())
}

/// The canonical form hashed into the signature: every param except the
/// signature itself, in stable (sorted-key) order.
#[must_use]
pub fn canonical_query(params: &Params) -> String {
    encode_pairs(params.iter().filter(|(key, _)| *key != SIGNATURE_PARAM))
}

/// SHA-256 hex digest of `secret ‖ path ‖ canonical_query(params)`.
#[must_use]
pub fn compute(secret: &str, path: &str, params: &Params) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(path.as_bytes());
    hasher.update(canonical_query(params).as_bytes());
    format!("{:x}", hasher.finalize())
}
