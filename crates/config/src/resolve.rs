//! `ENV_`-prefixed overrides and the effective configuration.
//!
//! Deployments inject per-environment values through `ENV_*` variables. Each
//! recognized override replaces the base value when it is present and
//! non-empty; resolution itself never fails.

use crate::env::{
    ENV_COLLECTION_NAME, ENV_DATA_DIRECTORY, ENV_EMBEDDING_MODEL_ID, ENV_INTERNAL_DB, ENV_REGION,
    ENV_SEARCH_HOSTNAME, ENV_SEARCH_USERNAME, parse_optional_secret, parse_optional_trimmed_string,
};
use crate::schema::{PipelineConfig, ValidatedPipelineConfig};
use embed_preflight_shared::{ErrorCode, ErrorEnvelope, SecretString};
use std::collections::BTreeMap;
use std::fmt;

/// Override var: region.
pub const ENV_OVERRIDE_REGION: &str = "ENV_REGION";
/// Override var: search collection name.
pub const ENV_OVERRIDE_COLLECTION_NAME: &str = "ENV_OPEN_SEARCH_SERVERLESS_COLLECTION_NAME";
/// Override var: search hostname.
pub const ENV_OVERRIDE_SEARCH_HOSTNAME: &str = "ENV_OPEN_SEARCH_HOSTNAME";
/// Override var: search username.
pub const ENV_OVERRIDE_SEARCH_USERNAME: &str = "ENV_OPENSEARCH_USERNAME";
/// Override var: search password (secret).
// gitleaks:allow
pub const ENV_OVERRIDE_SEARCH_PASSWORD: &str = "ENV_OPENSEARCH_PASSWORD";

/// Values read from the `ENV_*` override variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// Override for the region.
    pub region: Option<Box<str>>,
    /// Override for the collection name.
    pub collection_name: Option<Box<str>>,
    /// Override for the search hostname.
    pub search_hostname: Option<Box<str>>,
    /// Override for the search username.
    pub search_username: Option<Box<str>>,
    /// Override for the search password.
    pub search_password: Option<SecretString>,
}

impl EnvOverrides {
    /// Read overrides from a key/value map. Blank values are skipped.
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self {
            region: parse_optional_trimmed_string(map, ENV_OVERRIDE_REGION),
            collection_name: parse_optional_trimmed_string(map, ENV_OVERRIDE_COLLECTION_NAME),
            search_hostname: parse_optional_trimmed_string(map, ENV_OVERRIDE_SEARCH_HOSTNAME),
            search_username: parse_optional_trimmed_string(map, ENV_OVERRIDE_SEARCH_USERNAME),
            search_password: parse_optional_secret(map, ENV_OVERRIDE_SEARCH_PASSWORD),
        }
    }

    /// Read overrides from the current process environment.
    #[must_use]
    pub fn from_std_env() -> Self {
        let mut map = BTreeMap::new();
        for name in [
            ENV_OVERRIDE_REGION,
            ENV_OVERRIDE_COLLECTION_NAME,
            ENV_OVERRIDE_SEARCH_HOSTNAME,
            ENV_OVERRIDE_SEARCH_USERNAME,
            ENV_OVERRIDE_SEARCH_PASSWORD,
        ] {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }
        Self::from_map(&map)
    }

    /// Returns true when no override is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.region.is_none()
            && self.collection_name.is_none()
            && self.search_hostname.is_none()
            && self.search_username.is_none()
            && self.search_password.is_none()
    }

    /// Names of the override variables that are set, in a stable order.
    #[must_use]
    pub fn applied_vars(&self) -> Vec<&'static str> {
        [
            (ENV_OVERRIDE_REGION, self.region.is_some()),
            (ENV_OVERRIDE_COLLECTION_NAME, self.collection_name.is_some()),
            (ENV_OVERRIDE_SEARCH_HOSTNAME, self.search_hostname.is_some()),
            (ENV_OVERRIDE_SEARCH_USERNAME, self.search_username.is_some()),
            (ENV_OVERRIDE_SEARCH_PASSWORD, self.search_password.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

/// Merge the base config with `ENV_*` overrides.
///
/// For each of the five recognized keys the override wins when present; every
/// other value passes through unchanged.
#[must_use]
pub fn resolve_overrides(
    base: &ValidatedPipelineConfig,
    overrides: &EnvOverrides,
) -> EffectiveConfig {
    let mut config = base.as_ref().clone();

    if let Some(region) = &overrides.region {
        config.region = Some(region.clone());
    }
    if let Some(name) = &overrides.collection_name {
        config.search.collection_name = Some(name.clone());
    }
    if let Some(hostname) = &overrides.search_hostname {
        config.search.hostname = Some(hostname.clone());
    }
    if let Some(username) = &overrides.search_username {
        config.search.username = Some(username.clone());
    }
    if let Some(password) = &overrides.search_password {
        config.search.password = Some(password.clone());
    }

    EffectiveConfig { raw: config }
}

/// Config keys consumed by preflight checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Cloud region.
    Region,
    /// Search collection name.
    CollectionName,
    /// Search service hostname.
    SearchHostname,
    /// Search basic auth username.
    SearchUsername,
    /// Embedding model identifier.
    EmbeddingModelId,
    /// Document data directory.
    DataDirectory,
    /// Internal database path.
    InternalDb,
}

impl ConfigKey {
    /// Base environment variable for this key.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::Region => ENV_REGION,
            Self::CollectionName => ENV_COLLECTION_NAME,
            Self::SearchHostname => ENV_SEARCH_HOSTNAME,
            Self::SearchUsername => ENV_SEARCH_USERNAME,
            Self::EmbeddingModelId => ENV_EMBEDDING_MODEL_ID,
            Self::DataDirectory => ENV_DATA_DIRECTORY,
            Self::InternalDb => ENV_INTERNAL_DB,
        }
    }

    /// Config file path for this key.
    #[must_use]
    pub const fn config_path(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::CollectionName => "search.collectionName",
            Self::SearchHostname => "search.hostname",
            Self::SearchUsername => "search.username",
            Self::EmbeddingModelId => "embedding.modelId",
            Self::DataDirectory => "storage.dataDirectory",
            Self::InternalDb => "storage.internalDb",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.env_var())
    }
}

/// Config after overrides; read-only for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    raw: PipelineConfig,
}

impl EffectiveConfig {
    /// Value of a key, if set.
    #[must_use]
    pub fn value(&self, key: ConfigKey) -> Option<&str> {
        let raw = &self.raw;
        match key {
            ConfigKey::Region => raw.region.as_deref(),
            ConfigKey::CollectionName => raw.search.collection_name.as_deref(),
            ConfigKey::SearchHostname => raw.search.hostname.as_deref(),
            ConfigKey::SearchUsername => raw.search.username.as_deref(),
            ConfigKey::EmbeddingModelId => raw.embedding.model_id.as_deref(),
            ConfigKey::DataDirectory => raw.storage.data_directory.as_deref(),
            ConfigKey::InternalDb => raw.storage.internal_db.as_deref(),
        }
        .filter(|value| !value.trim().is_empty())
    }

    /// Value of a required key, or a configuration error naming it.
    pub fn require(&self, key: ConfigKey) -> Result<&str, ErrorEnvelope> {
        self.value(key).ok_or_else(|| {
            ErrorEnvelope::expected(
                ErrorCode::missing_config(),
                format!("{} must be set", key.env_var()),
            )
            .with_metadata("envVar", key.env_var())
            .with_metadata("configPath", key.config_path())
        })
    }

    /// Search password, if set.
    #[must_use]
    pub const fn search_password(&self) -> Option<&SecretString> {
        self.raw.search.password.as_ref()
    }

    /// Borrow the merged config.
    #[must_use]
    pub const fn as_config(&self) -> &PipelineConfig {
        &self.raw
    }
}

impl std::ops::Deref for EffectiveConfig {
    type Target = PipelineConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}
