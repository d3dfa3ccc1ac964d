//! Content hashing for snapshot identity
//!
//! A snapshot's identity is `sha256:` over a canonical serialization of
//! its semantic fields. Canonical form is pinned here (and by the vectors
//! in `tests/hash_vectors.rs`): object keys sorted by UTF-8 byte order,
//! arrays kept in given order, no insignificant whitespace, UTF-8 bytes.
//! Reimplementations in other languages must reproduce it bit-exactly.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::SchemaError;

const HASH_PREFIX: &str = "sha256:";
const HEX_DIGEST_LEN: usize = 64;

/// Serialize a JSON value into its canonical form.
///
/// Fails with [`SchemaError::HashComputationFailed`] if the value cannot
/// be rendered canonically.
pub fn canonical_json(value: &Value) -> Result<String, SchemaError> {
    let mut out = String::new();
    write_canonical(value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), SchemaError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(&escape_string(s)?),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            // Sort explicitly rather than trusting the map's iteration
            // order; canonical form must not depend on serde_json
            // feature flags.
            let mut keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
            keys.sort_unstable();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&escape_string(key)?);
                out.push(':');
                write_canonical(&map[*key], out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn escape_string(s: &str) -> Result<String, SchemaError> {
    serde_json::to_string(s).map_err(|e| SchemaError::HashComputationFailed(e.to_string()))
}

/// SHA256 content hash in `sha256:<64 lowercase hex>` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self(format!("{}{:x}", HASH_PREFIX, digest))
    }

    /// Hash a JSON value via its canonical serialization.
    pub fn compute(value: &Value) -> Result<Self, SchemaError> {
        let canonical = canonical_json(value)?;
        Ok(Self::from_bytes(canonical.as_bytes()))
    }

    /// Parse and validate an externally supplied hash string.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let hex = s
            .strip_prefix(HASH_PREFIX)
            .ok_or_else(|| SchemaError::InvalidFormat(format!("content hash must start with \"{}\": {}", HASH_PREFIX, s)))?;
        if hex.len() != HEX_DIGEST_LEN
            || !hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(SchemaError::InvalidFormat(format!(
                "content hash digest must be {} lowercase hex characters: {}",
                HEX_DIGEST_LEN, s
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this hash matches the given JSON value.
    pub fn verify(&self, value: &Value) -> Result<bool, SchemaError> {
        Ok(*self == Self::compute(value)?)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
