//! Canonical serialization for deterministic hashing.
//!
//! This module serializes data into a canonical JSON form suitable for
//! content addressing. Two values that are logically equal produce the same
//! bytes on every platform.
//!
//! ## Canonical Form
//!
//! - Object keys are sorted by UTF-8 byte order, regardless of map type
//! - No insignificant whitespace
//! - Arrays keep element order
//! - Strings use `serde_json` escaping; non-ASCII is emitted as raw UTF-8
//! - Integers are plain decimal
//! - Floats are formatted by `ryu` directly (`1.0`, `2.5`, `1e21`, `1e-7`),
//!   never through `serde_json`, with `-0.0` written as `0.0`
//!
//! Non-finite floats have no JSON form. `serde_json` maps them to `null`, so
//! callers hashing floats must reject them first (see
//! [`CanonicalError::NonFiniteNumber`]).

use serde::Serialize;
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

/// Error type for canonical serialization.
#[derive(Debug, thiserror::Error)]
pub enum CanonicalError {
    /// Value could not be converted to JSON.
    #[error("canonical serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    /// A float that is NaN or infinite.
    #[error("non-finite number in field `{field}`")]
    NonFiniteNumber {
        /// Field path that held the number.
        field: String,
    },
}

/// Serialize a value to canonical JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CanonicalError> {
    let tree = serde_json::to_value(value)?;
    let mut out = Vec::with_capacity(256);
    write_value(&tree, &mut out)?;
    Ok(out)
}

/// Serialize a value to a canonical JSON string.
pub fn to_canonical_string<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let bytes = to_canonical_bytes(value)?;
    // serde_json only ever writes valid UTF-8.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// SHA-256 of raw bytes as a 32-byte digest.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// SHA-256 of raw bytes as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(sha256(bytes))
}

/// Compute the canonical SHA-256 of a serializable value as lowercase hex.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let bytes = to_canonical_bytes(value)?;
    Ok(sha256_hex(&bytes))
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> Result<(), CanonicalError> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => write_number(n, out)?,
        Value::String(s) => serde_json::to_writer(&mut *out, s)?,
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                write_value(item, out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

fn write_number(n: &Number, out: &mut Vec<u8>) -> Result<(), CanonicalError> {
    if n.is_f64() {
        if let Some(x) = n.as_f64() {
            write_float(x, out);
            return Ok(());
        }
    }
    serde_json::to_writer(&mut *out, n)?;
    Ok(())
}

/// Fixed float form: `ryu` shortest round-trip, `-0.0` as `0.0`.
///
/// `serde_json::Value` never holds a non-finite float.
fn write_float(x: f64, out: &mut Vec<u8>) {
    if x == 0.0 {
        // Covers -0.0 as well.
        out.extend_from_slice(b"0.0");
        return;
    }
    let mut buf = ryu::Buffer::new();
    out.extend_from_slice(buf.format_finite(x).as_bytes());
}
