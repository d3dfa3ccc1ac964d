//! Manifest entries
//!
//! Local bookkeeping correlating a record to a possibly-remote snapshot.
//! The manifest owns its entries; snapshots themselves are referenced by
//! id only. Entries move through `local-only -> synced -> orphaned`, and
//! orphaned is terminal; reconciliation creates fresh entries instead of
//! reviving dead ones.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SchemaError};
use crate::ids::{new_local_uuid, LOCAL_ID_PREFIX};
use crate::remote::SnapshotStore;
use crate::validate::Issue;

/// Manifest entry id: either a remote snapshot UUID or a locally minted
/// `local-<uuid>` id. The two spaces never collide; the prefix alone
/// tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ManifestId {
    Remote(Uuid),
    Local(Uuid),
}

impl ManifestId {
    /// Mint a fresh local id.
    pub fn new_local() -> Self {
        ManifestId::Local(new_local_uuid())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ManifestId::Local(_))
    }

    /// The remote snapshot UUID, when this id lives in the remote space.
    pub fn remote_uuid(&self) -> Option<&Uuid> {
        match self {
            ManifestId::Remote(id) => Some(id),
            ManifestId::Local(_) => None,
        }
    }
}

impl fmt::Display for ManifestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestId::Remote(id) => write!(f, "{}", id),
            ManifestId::Local(id) => write!(f, "{}{}", LOCAL_ID_PREFIX, id),
        }
    }
}

impl FromStr for ManifestId {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix(LOCAL_ID_PREFIX) {
            let id = Uuid::parse_str(rest)
                .map_err(|_| SchemaError::InvalidFormat(format!("invalid local id: {}", s)))?;
            if id.get_version_num() != 4 {
                return Err(SchemaError::InvalidFormat(format!(
                    "local id must embed a v4 UUID: {}",
                    s
                )));
            }
            return Ok(ManifestId::Local(id));
        }
        let id = Uuid::parse_str(s)
            .map_err(|_| SchemaError::InvalidFormat(format!("invalid manifest id: {}", s)))?;
        Ok(ManifestId::Remote(id))
    }
}

impl TryFrom<String> for ManifestId {
    type Error = SchemaError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ManifestId> for String {
    fn from(id: ManifestId) -> Self {
        id.to_string()
    }
}

/// Manifest file reference: the literal `current`, or a dated
/// `YYYY-MM-DD_<slug>.yml` filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ManifestFile {
    Current,
    Dated { date: NaiveDate, slug: String },
}

impl fmt::Display for ManifestFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestFile::Current => f.write_str("current"),
            ManifestFile::Dated { date, slug } => {
                write!(f, "{}_{}.yml", date.format("%Y-%m-%d"), slug)
            }
        }
    }
}

impl FromStr for ManifestFile {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "current" {
            return Ok(ManifestFile::Current);
        }
        let invalid = || SchemaError::InvalidFormat(format!("invalid manifest filename: {}", s));
        let stem = s.strip_suffix(".yml").ok_or_else(invalid)?;
        let (date_part, slug) = stem.split_once('_').ok_or_else(invalid)?;
        if date_part.len() != 10 {
            return Err(invalid());
        }
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| invalid())?;
        if slug.is_empty()
            || !slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(invalid());
        }
        Ok(ManifestFile::Dated {
            date,
            slug: slug.to_string(),
        })
    }
}

impl TryFrom<String> for ManifestFile {
    type Error = SchemaError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ManifestFile> for String {
    fn from(file: ManifestFile) -> Self {
        file.to_string()
    }
}

/// Relationship of a manifest entry to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncState {
    Synced,
    LocalOnly,
    Orphaned,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncState::Synced => "synced",
            SyncState::LocalOnly => "local-only",
            SyncState::Orphaned => "orphaned",
        };
        f.write_str(s)
    }
}

/// One manifest record correlating a local file to a snapshot id and its
/// sync state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub id: ManifestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ManifestId>,
    pub file: ManifestFile,
    pub created_at: DateTime<Utc>,
    pub sync_state: SyncState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl ManifestEntry {
    /// Create a local-only entry with a freshly minted `local-` id.
    pub fn local(parent_id: Option<ManifestId>, file: ManifestFile) -> Self {
        Self {
            id: ManifestId::new_local(),
            parent_id,
            file,
            created_at: Utc::now(),
            sync_state: SyncState::LocalOnly,
            synced_at: None,
        }
    }

    /// Promote a local-only entry after its first successful remote
    /// persistence. The identity migrates from the `local-` space to the
    /// remote UUID. This renames the entry rather than creating a new one.
    pub fn promote_synced(&mut self, remote_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        if self.sync_state != SyncState::LocalOnly {
            return Err(SchemaError::InvalidSyncTransition {
                from: self.sync_state.to_string(),
                to: SyncState::Synced.to_string(),
            });
        }
        tracing::info!(local = %self.id, remote = %remote_id, "manifest entry promoted to synced");
        self.id = ManifestId::Remote(remote_id);
        self.sync_state = SyncState::Synced;
        self.synced_at = Some(at);
        Ok(())
    }

    /// Mark a synced entry whose remote snapshot no longer resolves.
    /// Terminal: orphaned entries are never revived in place.
    pub fn mark_orphaned(&mut self) -> Result<()> {
        if self.sync_state != SyncState::Synced {
            return Err(SchemaError::InvalidSyncTransition {
                from: self.sync_state.to_string(),
                to: SyncState::Orphaned.to_string(),
            });
        }
        tracing::warn!(id = %self.id, "manifest entry orphaned");
        self.sync_state = SyncState::Orphaned;
        Ok(())
    }

    /// Check this entry against the remote store, orphaning it if its
    /// snapshot no longer resolves. Returns whether the entry changed.
    /// Transport failures propagate without touching state.
    pub fn reconcile(&mut self, store: &dyn SnapshotStore) -> Result<bool> {
        if self.sync_state != SyncState::Synced {
            return Ok(false);
        }
        let remote_id = match self.id.remote_uuid() {
            Some(id) => *id,
            None => return Ok(false),
        };
        if store.resolve(&remote_id).map_err(SchemaError::Transport)? {
            return Ok(false);
        }
        self.mark_orphaned()?;
        Ok(true)
    }

    /// Re-check the id-space/sync-state invariants, e.g. after
    /// deserializing a manifest written by an older tool.
    pub fn validate(&self) -> std::result::Result<(), Vec<Issue>> {
        let mut issues = Vec::new();
        match self.sync_state {
            SyncState::LocalOnly => {
                if !self.id.is_local() {
                    issues.push(Issue::new(
                        "sync-state-id-mismatch",
                        format!("local-only entry must use a local- id, got \"{}\"", self.id),
                        "id",
                    ));
                }
            }
            SyncState::Synced | SyncState::Orphaned => {
                if self.id.is_local() {
                    issues.push(Issue::new(
                        "sync-state-id-mismatch",
                        format!(
                            "{} entry must reference a remote UUID, got \"{}\"",
                            self.sync_state, self.id
                        ),
                        "id",
                    ));
                }
                if self.sync_state == SyncState::Synced && self.synced_at.is_none() {
                    issues.push(Issue::new(
                        "missing-synced-at",
                        "synced entry must record syncedAt",
                        "syncedAt",
                    ));
                }
            }
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}
