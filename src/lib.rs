//! Strata Schema Snapshots
//!
//! A versioned, content-addressed snapshot engine for relational database
//! schemas: table definitions are captured as immutable snapshots, chained
//! by parent pointers, each identified by a deterministic content hash.
//!
//! ## Features
//!
//! - **Structural Validation**: single-pass table validation that reports
//!   every violation at once, with a precise path per issue
//! - **Engine-Keyed Rulesets**: `engine:version` keys select the ruleset;
//!   unknown keys fail closed
//! - **Content Addressing**: SHA256 over a canonical projection of a
//!   snapshot's semantic fields (`sha256:<hex>`)
//! - **Immutable Lineage**: finalized snapshots never change; edits derive
//!   a child snapshot pointing at its parent
//! - **Manifest Sync State**: local entries track `synced`, `local-only`,
//!   and `orphaned` against a remote store
//!
//! ## Architecture
//!
//! ```text
//! raw table JSON
//!     │
//!     ▼
//! EngineKey ──selects──▶ EngineRuleset ──validate──▶ Vec<Issue> | ok
//!     │                                                   │
//!     ▼                                                   ▼
//! SchemaSnapshot::finalize ──canonicalize──▶ ContentHash (sha256:…)
//!     │
//!     ▼
//! ManifestEntry { id, syncState, file } ◀──reconcile── SnapshotStore
//! ```

pub mod checksum;
pub mod config;
pub mod engine;
pub mod error;
pub mod ids;
pub mod manifest;
pub mod remote;
pub mod snapshot;
pub mod table;
pub mod validate;

pub use checksum::{canonical_json, ContentHash};
pub use config::{EnvResolver, PlaceholderResolver, ProcessEnv, SnapshotConfig};
pub use engine::{Engine, EngineKey, EngineRuleset};
pub use error::{Result, SchemaError};
pub use manifest::{ManifestEntry, ManifestFile, ManifestId, SyncState};
pub use remote::{SnapshotStore, TransportError, DEFAULT_TIMEOUT_MS};
pub use snapshot::{SchemaSnapshot, SnapshotData, SnapshotStatus};
pub use table::{Column, Constraint, ForeignKey, PrimaryKey, ReferentialAction, Table, UniqueConstraint};
pub use validate::{validate_table, Issue};
