//! Configuration for the snapshot tooling
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (strata.toml)
//! - Environment variables (STRATA_*)
//!
//! Secrets may be supplied indirectly: a value like `${STRATA_API_KEY}`
//! is substituted from the environment at resolution time, so config
//! files never need to hold the literal key.
//!
//! ## Example config file (strata.toml):
//! ```toml
//! [registry]
//! path = "./snapshots"
//!
//! [remote]
//! base_url = "https://api.strata.dev"
//! api_key = "${STRATA_API_KEY}"
//! timeout_ms = 10000
//!
//! [validation]
//! engine_key = "postgresql:v17.0"
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use config_crate::{Config, ConfigError, Environment, File};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::remote::DEFAULT_TIMEOUT_MS;

/// Main configuration for the snapshot tooling
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SnapshotConfig {
    /// Local registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Remote store settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Local registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path to the local snapshot/manifest root
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
}

/// Remote store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the remote snapshot store
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key, literal or a `${VAR}` environment reference
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Engine key applied to snapshots that do not carry one
    #[serde(default = "default_engine_key")]
    pub engine_key: String,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_engine_key() -> String {
    "postgresql:v17.0".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            engine_key: default_engine_key(),
        }
    }
}

impl SnapshotConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["strata.toml", ".strata.toml", "config/strata.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "strata", "schemas") {
            let xdg_config = config_dir.config_dir().join("strata.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (STRATA_*)
        builder = builder.add_source(
            Environment::with_prefix("STRATA")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// The API key with any `${VAR}` reference substituted and its
    /// format checked. A key that resolves but is malformed is rejected
    /// here rather than at the first remote call.
    pub fn resolved_api_key(&self, resolver: &dyn EnvResolver) -> Result<Option<String>, SchemaError> {
        let key = match self.remote.api_key.as_deref() {
            Some(raw) => PlaceholderResolver::new().resolve(raw, resolver)?,
            None => return Ok(None),
        };
        crate::ids::validate_api_key(&key).map_err(SchemaError::Validation)?;
        Ok(Some(key))
    }
}

/// Environment lookup capability consumed during placeholder resolution.
/// The `.env`-file loading behind it lives with the caller.
pub trait EnvResolver {
    fn resolve(&self, name: &str) -> Result<String, SchemaError>;
}

/// Resolves against the process environment.
pub struct ProcessEnv;

impl EnvResolver for ProcessEnv {
    fn resolve(&self, name: &str) -> Result<String, SchemaError> {
        std::env::var(name).map_err(|_| SchemaError::EnvVarNotFound(name.to_string()))
    }
}

impl EnvResolver for HashMap<String, String> {
    fn resolve(&self, name: &str) -> Result<String, SchemaError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| SchemaError::EnvVarNotFound(name.to_string()))
    }
}

/// Substitutes `${VAR_NAME}` placeholders in configuration values.
pub struct PlaceholderResolver {
    pattern: Regex,
}

impl Default for PlaceholderResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaceholderResolver {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap(),
        }
    }

    /// Replace every `${VAR}` in `value`; a variable the resolver cannot
    /// supply fails the whole value.
    pub fn resolve(&self, value: &str, resolver: &dyn EnvResolver) -> Result<String, SchemaError> {
        let mut out = String::with_capacity(value.len());
        let mut last = 0;
        for captures in self.pattern.captures_iter(value) {
            let whole = captures.get(0).expect("capture 0 always present");
            out.push_str(&value[last..whole.start()]);
            out.push_str(&resolver.resolve(&captures[1])?);
            last = whole.end();
        }
        out.push_str(&value[last..]);
        Ok(out)
    }
}
