//! Schema snapshots
//!
//! An immutable, content-addressed capture of a schema's table
//! definitions at one point in time. A snapshot is created as a draft,
//! populated, then finalized: structural validation runs, the content
//! hash is computed, and from then on any edit must derive a child
//! snapshot whose `parentId` points at this one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::checksum::ContentHash;
use crate::engine::{Engine, EngineKey};
use crate::error::{Result, SchemaError};
use crate::table::Table;
use crate::validate::Issue;

/// Snapshot lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    Draft,
    Done,
}

/// The table payload of a populated snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotData {
    pub tables: Vec<Table>,
}

/// An immutable, content-addressed version of a schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    pub id: Uuid,
    /// Owning schema.
    pub schema_id: Uuid,
    /// Prior snapshot in the lineage; `None` for the first capture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub engine: String,
    pub engine_version: String,
    /// Must equal `"<engine>:<engineVersion>"`; checked at acceptance.
    pub engine_key: String,
    pub status: SnapshotStatus,
    /// Computed at finalize time, never trusted from input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<ContentHash>,
    /// `None` for draft/empty snapshots.
    #[serde(default)]
    pub data: Option<SnapshotData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projection of the fields that participate in content identity.
///
/// Absent optionals are omitted entirely, never serialized as null, so
/// "field present" and "field absent" can never hash alike.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HashProjection<'a> {
    engine_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tables: Option<&'a [Table]>,
}

impl SchemaSnapshot {
    /// Start a new empty draft for a schema.
    pub fn draft(schema_id: Uuid, label: impl Into<String>, engine: Engine, engine_version: impl Into<String>) -> Self {
        let engine_version = engine_version.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            schema_id,
            parent_id: None,
            label: label.into(),
            description: None,
            engine: engine.to_string(),
            engine_version: engine_version.clone(),
            engine_key: format!("{}:{}", engine, engine_version),
            status: SnapshotStatus::Draft,
            content_hash: None,
            data: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description. Drafts only.
    pub fn with_description(mut self, description: impl Into<String>) -> Result<Self> {
        self.ensure_draft()?;
        self.description = Some(description.into());
        self.updated_at = Utc::now();
        Ok(self)
    }

    /// Set the table payload. Drafts only.
    pub fn with_tables(mut self, tables: Vec<Table>) -> Result<Self> {
        self.ensure_draft()?;
        self.data = Some(SnapshotData { tables });
        self.updated_at = Utc::now();
        Ok(self)
    }

    fn ensure_draft(&self) -> Result<()> {
        if self.status == SnapshotStatus::Done {
            return Err(SchemaError::ImmutabilityViolation {
                id: self.id.to_string(),
            });
        }
        Ok(())
    }

    /// The parsed engine key, failing closed on anything unregistered.
    pub fn engine_key(&self) -> Result<EngineKey> {
        self.engine_key.parse()
    }

    fn check_engine_key(&self) -> Option<Issue> {
        let expected = format!("{}:{}", self.engine, self.engine_version);
        if self.engine_key != expected {
            return Some(Issue::new(
                "engine-key-mismatch",
                format!(
                    "engineKey \"{}\" does not match engine/engineVersion \"{}\"",
                    self.engine_key, expected
                ),
                "engineKey",
            ));
        }
        None
    }

    fn hash_projection(&self) -> Result<Value> {
        let projection = HashProjection {
            engine_key: &self.engine_key,
            description: self.description.as_deref(),
            tables: self.data.as_ref().map(|d| d.tables.as_slice()),
        };
        serde_json::to_value(&projection)
            .map_err(|e| SchemaError::HashComputationFailed(e.to_string()))
    }

    /// Compute the content hash of the current semantic fields.
    pub fn compute_hash(&self) -> Result<ContentHash> {
        ContentHash::compute(&self.hash_projection()?)
    }

    /// Run the engine-key consistency check and per-table structural
    /// validation, accumulating every issue found.
    ///
    /// Fails closed with [`SchemaError::UnsupportedEngine`] before any
    /// structural check when the engine key is unregistered.
    pub fn validate(&self) -> Result<()> {
        // The ruleset is keyed off engineKey alone, exactly like the hash.
        let ruleset = self.engine_key()?.ruleset()?;

        let mut issues = Vec::new();
        if let Some(issue) = self.check_engine_key() {
            issues.push(issue);
        }
        if let Some(data) = &self.data {
            for (i, table) in data.tables.iter().enumerate() {
                if let Err(table_issues) = ruleset.validate(table) {
                    let prefix = format!("data.tables[{}]", i);
                    issues.extend(table_issues.into_iter().map(|issue| issue.with_prefix(&prefix)));
                }
            }
        }
        if !issues.is_empty() {
            tracing::debug!(snapshot = %self.id, count = issues.len(), "snapshot rejected");
            return Err(SchemaError::Validation(issues));
        }
        Ok(())
    }

    /// Validate and seal this snapshot.
    ///
    /// On success computes the content hash and marks the snapshot
    /// `done`. Finalizing an already-done snapshot is an immutability
    /// violation.
    pub fn finalize(mut self) -> Result<Self> {
        self.ensure_draft()?;
        self.validate()?;

        let hash = self.compute_hash()?;
        tracing::info!(snapshot = %self.id, hash = %hash, "snapshot finalized");
        self.content_hash = Some(hash);
        self.status = SnapshotStatus::Done;
        self.updated_at = Utc::now();
        Ok(self)
    }

    /// Whether the stored hash matches the current content. Snapshots
    /// without a stored hash never verify.
    pub fn verify_hash(&self) -> Result<bool> {
        match &self.content_hash {
            Some(hash) => hash.verify(&self.hash_projection()?),
            None => Ok(false),
        }
    }

    /// Begin a new draft continuing this snapshot's lineage.
    ///
    /// The child carries the current description and data as its starting
    /// point; its `parentId` is this snapshot's id. Lineage is a singly
    /// linked list from newest to oldest; parents are never rewritten.
    pub fn derive_child(&self, label: impl Into<String>) -> SchemaSnapshot {
        let now = Utc::now();
        SchemaSnapshot {
            id: Uuid::new_v4(),
            schema_id: self.schema_id,
            parent_id: Some(self.id),
            label: label.into(),
            description: self.description.clone(),
            engine: self.engine.clone(),
            engine_version: self.engine_version.clone(),
            engine_key: self.engine_key.clone(),
            status: SnapshotStatus::Draft,
            content_hash: None,
            data: self.data.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}
