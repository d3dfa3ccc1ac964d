//! Remote snapshot store capability
//!
//! The engine never talks to the network itself. Manifest reconciliation
//! consumes this trait; the HTTP client implementing it lives with the
//! caller.

use thiserror::Error;
use uuid::Uuid;

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Transport failures surfaced by a remote store implementation.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("network error: {0}")]
    Network(String),
}

/// Resolution capability against the remote snapshot store.
pub trait SnapshotStore {
    /// Whether the given remote snapshot id still resolves.
    fn resolve(&self, id: &Uuid) -> Result<bool, TransportError>;
}
