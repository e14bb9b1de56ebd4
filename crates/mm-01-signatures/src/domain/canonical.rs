//! # Canonical Encoding
//!
//! Deterministic JSON bytes for signing. Two structures that are equal as
//! JSON always encode to the same bytes, whatever order their fields were
//! inserted in.
//!
//! Object keys are emitted in sorted order explicitly rather than relying on
//! `serde_json::Map` ordering, which flips to insertion order whenever any
//! crate in the build enables `preserve_order`.

use super::errors::SignatureError;
use serde::Serialize;
use serde_json::Value;

/// Canonical bytes of an already-parsed JSON value.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(128);
    write_canonical(value, &mut out);
    out
}

/// Canonical bytes of any serializable structure.
pub fn to_canonical<T: Serialize + ?Sized>(data: &T) -> Result<Vec<u8>, SignatureError> {
    let value =
        serde_json::to_value(data).map_err(|e| SignatureError::Serialization(e.to_string()))?;
    Ok(canonical_bytes(&value))
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(key, out);
                out.push(b':');
                write_canonical(item, out);
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out);
            }
            out.push(b']');
        }
        Value::String(s) => write_string(s, out),
        // Null, booleans and numbers already have a single compact form.
        scalar => out.extend_from_slice(scalar.to_string().as_bytes()),
    }
}

fn write_string(s: &str, out: &mut Vec<u8>) {
    // Display on a JSON string yields the quoted, escaped form.
    out.extend_from_slice(Value::from(s).to_string().as_bytes());
}
