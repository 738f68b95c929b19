//! Store configuration: where documents live and how stale vectors are resized.
//!
//! Documents are laid out as
//! `<data_dir>/<active_version>/craving_system/<file>.json`.

use std::path::{Component, Path, PathBuf};

use cravetown_logic::resize::TruncationPolicy;
use thiserror::Error;

pub const ENV_DATA_DIR: &str = "CRAVETOWN_DATA_DIR";
pub const ENV_VERSION: &str = "CRAVETOWN_VERSION";
pub const ENV_TRUNCATION: &str = "CRAVETOWN_TRUNCATION";

/// Sub-directory of a data version holding the craving documents.
pub const CRAVING_SYSTEM_DIR: &str = "craving_system";

/// The persisted craving documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentKind {
    DimensionDefinitions,
    CharacterClasses,
    CharacterTraits,
    EnablementRules,
    FulfillmentVectors,
}

impl DocumentKind {
    pub fn file_name(self) -> &'static str {
        match self {
            DocumentKind::DimensionDefinitions => "dimension_definitions.json",
            DocumentKind::CharacterClasses => "character_classes.json",
            DocumentKind::CharacterTraits => "character_traits.json",
            DocumentKind::EnablementRules => "enablement_rules.json",
            DocumentKind::FulfillmentVectors => "fulfillment_vectors.json",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Root holding one directory per data version.
    pub data_dir: PathBuf,
    /// Data version directory name, e.g. `"base"`.
    pub active_version: String,
    /// Applied when normalizing loaded items against the registry.
    pub truncation: TruncationPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            active_version: "base".to_string(),
            truncation: TruncationPolicy::Warn,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("data directory is empty")]
    EmptyDataDir,

    #[error("active version name is empty")]
    EmptyVersion,

    #[error("active version '{0}' must be a single directory name")]
    VersionEscapesDataDir(String),

    #[error("unknown truncation policy '{0}' (expected 'warn' or 'reject')")]
    UnknownTruncationPolicy(String),
}

/// Parse `warn` / `reject`, case-insensitively.
pub fn parse_truncation(value: &str) -> Result<TruncationPolicy, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "warn" => Ok(TruncationPolicy::Warn),
        "reject" => Ok(TruncationPolicy::Reject),
        _ => Err(ConfigError::UnknownTruncationPolicy(value.to_string())),
    }
}

impl StoreConfig {
    /// Defaults overridden by `CRAVETOWN_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`StoreConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(version) = lookup(ENV_VERSION) {
            config.active_version = version;
        }
        if let Some(policy) = lookup(ENV_TRUNCATION) {
            config.truncation = parse_truncation(&policy)?;
        }
        Ok(config)
    }

    /// Same settings rooted at `data_dir`.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn craving_dir(&self) -> PathBuf {
        self.data_dir
            .join(&self.active_version)
            .join(CRAVING_SYSTEM_DIR)
    }

    pub fn document_path(&self, kind: DocumentKind) -> PathBuf {
        self.craving_dir().join(kind.file_name())
    }
}

/// Check a configuration, returning every problem found.
pub fn validate_config(config: &StoreConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.data_dir.as_os_str().is_empty() {
        errors.push(ConfigError::EmptyDataDir);
    }

    let version = config.active_version.as_str();
    if version.trim().is_empty() {
        errors.push(ConfigError::EmptyVersion);
    } else if !is_single_component(version) {
        errors.push(ConfigError::VersionEscapesDataDir(version.to_string()));
    }

    errors
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
