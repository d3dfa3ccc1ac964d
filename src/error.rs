//! Error types for the snapshot engine

use thiserror::Error;

use crate::remote::TransportError;
use crate::validate::Issue;

/// Result type for snapshot operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Snapshot engine errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("schema validation failed with {} issue(s)", .0.len())]
    Validation(Vec<Issue>),

    #[error("unsupported engine key: {0}")]
    UnsupportedEngine(String),

    #[error("hash computation failed: {0}")]
    HashComputationFailed(String),

    #[error("immutability violation: cannot modify snapshot {id} after its hash is computed")]
    ImmutabilityViolation { id: String },

    #[error("invalid sync-state transition: {from} -> {to}")]
    InvalidSyncTransition { from: String, to: String },

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// The accumulated issues, when this error carries any.
    pub fn issues(&self) -> &[Issue] {
        match self {
            SchemaError::Validation(issues) => issues,
            _ => &[],
        }
    }
}
