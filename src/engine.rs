//! Engine-keyed validation rulesets
//!
//! An `engine:version` composite key selects the structural ruleset a
//! snapshot is validated against. The selector fails closed: anything not
//! registered here is rejected, never silently defaulted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::table::Table;
use crate::validate::{validate_table, Issue};

/// Supported database engines.
///
/// Closed enumeration: registering a new engine means adding a variant
/// here and a match arm in [`EngineKey::ruleset`]; the compiler then flags
/// every site that does not handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Postgresql,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Postgresql => "postgresql",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgresql" => Ok(Engine::Postgresql),
            other => Err(SchemaError::UnsupportedEngine(other.to_string())),
        }
    }
}

/// Composite `engine:version` key (e.g. `postgresql:v15.0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngineKey {
    pub engine: Engine,
    pub version: String,
}

impl EngineKey {
    pub fn new(engine: Engine, version: impl Into<String>) -> Self {
        Self {
            engine,
            version: version.into(),
        }
    }

    /// Select the validation ruleset registered for this engine version.
    ///
    /// Fails closed with [`SchemaError::UnsupportedEngine`] for unknown
    /// version tokens.
    pub fn ruleset(&self) -> Result<&'static EngineRuleset, SchemaError> {
        match self.engine {
            Engine::Postgresql => match self.version.as_str() {
                "v15.0" | "v16.0" | "v17.0" => Ok(&POSTGRESQL_RULESET),
                _ => {
                    tracing::debug!(key = %self, "rejecting unregistered engine version");
                    Err(SchemaError::UnsupportedEngine(self.to_string()))
                }
            },
        }
    }
}

impl fmt::Display for EngineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.engine, self.version)
    }
}

impl FromStr for EngineKey {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (engine, version) = s
            .split_once(':')
            .ok_or_else(|| SchemaError::UnsupportedEngine(s.to_string()))?;
        if version.is_empty() {
            return Err(SchemaError::UnsupportedEngine(s.to_string()));
        }
        Ok(Self {
            engine: engine.parse()?,
            version: version.to_string(),
        })
    }
}

/// Structural rules applied when validating tables for one engine version.
#[derive(Debug)]
pub struct EngineRuleset {
    /// Maximum identifier length in bytes.
    pub max_identifier_len: usize,
}

impl EngineRuleset {
    /// Validate a table definition against this ruleset.
    pub fn validate(&self, table: &Table) -> Result<(), Vec<Issue>> {
        validate_table(table, self)
    }
}

// Postgres truncates identifiers at NAMEDATALEN - 1 bytes.
static POSTGRESQL_RULESET: EngineRuleset = EngineRuleset {
    max_identifier_len: 63,
};
