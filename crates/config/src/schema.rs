//! Pipeline configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization trims string values; blank strings become unset.
//! - Secrets and pipeline pass-through values are kept verbatim; only blank
//!   values become unset.

use embed_preflight_shared::{ErrorCode, ErrorEnvelope, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use url::Url;

/// Sanitizes a URL for error messages by stripping credentials.
fn sanitize_url_for_error(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() || !parsed.username().is_empty() {
                if parsed.set_username("").is_err() {
                    return "[invalid url: invalid username]".to_string();
                }
                if parsed.set_password(None).is_err() {
                    return "[invalid url: invalid password]".to_string();
                }
            }
            parsed.to_string()
        },
        Err(error) => format!("[invalid url: {error}]"),
    }
}

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

const HTTP_TIMEOUT_MIN_MS: u64 = 1_000;
const HTTP_TIMEOUT_MAX_MS: u64 = 600_000;
const HTTP_TIMEOUT_DEFAULT_MS: u64 = 30_000;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PipelineConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Deployment profile label (passed through to the pipeline).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Box<str>>,
    /// Cloud region hosting the model registry and the search collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Box<str>>,
    /// Local filesystem locations.
    pub storage: StorageConfig,
    /// Embedding model settings.
    pub embedding: EmbeddingModelConfig,
    /// Search service settings.
    pub search: SearchConfig,
    /// Pipeline tuning knobs; not consumed by preflight.
    pub pipeline: PipelineTuningConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            profile: None,
            region: None,
            storage: StorageConfig::default(),
            embedding: EmbeddingModelConfig::default(),
            search: SearchConfig::default(),
            pipeline: PipelineTuningConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate and normalize the config into a `ValidatedPipelineConfig`.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedPipelineConfig, ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }

        normalize_optional_trimmed(&mut self.profile);
        normalize_optional_trimmed(&mut self.region);
        self.storage.normalize();
        self.embedding.normalize();
        self.embedding.validate()?;
        self.search.normalize();
        self.search.validate()?;
        self.pipeline.normalize();

        Ok(ValidatedPipelineConfig { raw: self })
    }
}

/// Validated config wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPipelineConfig {
    raw: PipelineConfig,
}

impl ValidatedPipelineConfig {
    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &PipelineConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> PipelineConfig {
        self.raw
    }
}

impl AsRef<PipelineConfig> for ValidatedPipelineConfig {
    fn as_ref(&self) -> &PipelineConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedPipelineConfig {
    type Target = PipelineConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Filesystem locations the pipeline reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct StorageConfig {
    /// Directory scanned for documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_directory: Option<Box<str>>,
    /// Internal database file; only its parent directory must exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_db: Option<Box<str>>,
}

impl StorageConfig {
    fn normalize(&mut self) {
        normalize_optional_trimmed(&mut self.data_directory);
        normalize_optional_trimmed(&mut self.internal_db);
    }
}

/// Embedding model and model registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct EmbeddingModelConfig {
    /// Foundation model identifier (e.g. `amazon.titan-embed-text-v1`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<Box<str>>,
    /// Output vector size expected by the pipeline, carried verbatim.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_passthrough"
    )]
    pub output_vector_size: Option<Box<str>>,
    /// Registry endpoint override; defaults to the regional control plane.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_base_url: Option<Box<str>>,
    /// Optional bearer token for the registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_token: Option<SecretString>,
    /// Registry request timeout (ms).
    pub registry_timeout_ms: u64,
}

impl Default for EmbeddingModelConfig {
    fn default() -> Self {
        Self {
            model_id: None,
            output_vector_size: None,
            registry_base_url: None,
            registry_token: None,
            registry_timeout_ms: HTTP_TIMEOUT_DEFAULT_MS,
        }
    }
}

impl EmbeddingModelConfig {
    fn normalize(&mut self) {
        normalize_optional_trimmed(&mut self.model_id);
        normalize_optional_trimmed(&mut self.registry_base_url);
        normalize_optional_verbatim(&mut self.output_vector_size);
        normalize_optional_secret(&mut self.registry_token);
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if let Some(url) = self.registry_base_url.as_deref() {
            validate_http_url("embedding", "registryBaseUrl", url)?;
        }
        validate_timeout_ms(
            "embedding",
            "registryTimeoutMs",
            self.registry_timeout_ms,
            HTTP_TIMEOUT_MIN_MS,
            HTTP_TIMEOUT_MAX_MS,
        )
    }
}

/// OpenSearch-compatible collection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SearchConfig {
    /// Search service hostname, with or without a scheme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<Box<str>>,
    /// Collection (index) the pipeline writes to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<Box<str>>,
    /// Basic auth username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<Box<str>>,
    /// Basic auth password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<SecretString>,
    /// Search request timeout (ms).
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            collection_name: None,
            username: None,
            password: None,
            timeout_ms: HTTP_TIMEOUT_DEFAULT_MS,
        }
    }
}

impl SearchConfig {
    fn normalize(&mut self) {
        normalize_optional_trimmed(&mut self.hostname);
        normalize_optional_trimmed(&mut self.collection_name);
        normalize_optional_trimmed(&mut self.username);
        normalize_optional_secret(&mut self.password);
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_timeout_ms(
            "search",
            "timeoutMs",
            self.timeout_ms,
            HTTP_TIMEOUT_MIN_MS,
            HTTP_TIMEOUT_MAX_MS,
        )
    }
}

/// Settings consumed by the embedding pipeline after preflight succeeds.
///
/// Values are opaque: numbers or strings are accepted and stored as written,
/// never parsed or range-checked here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PipelineTuningConfig {
    /// Text splitter chunk size.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_passthrough"
    )]
    pub text_splitter_chunk_size: Option<Box<str>>,
    /// Text splitter chunk overlap.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_passthrough"
    )]
    pub text_splitter_chunk_overlap: Option<Box<str>>,
    /// Concurrent file readers.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_passthrough"
    )]
    pub files_processing_concurrency: Option<Box<str>>,
    /// Scanner interval as passed to the pipeline scheduler.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_passthrough"
    )]
    pub scanner_interval: Option<Box<str>>,
    /// Concurrent document indexing tasks.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_passthrough"
    )]
    pub documents_indexing_concurrency: Option<Box<str>>,
    /// Concurrent embedding requests.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_passthrough"
    )]
    pub embedding_concurrency: Option<Box<str>>,
}

impl PipelineTuningConfig {
    fn normalize(&mut self) {
        for value in [
            &mut self.text_splitter_chunk_size,
            &mut self.text_splitter_chunk_overlap,
            &mut self.files_processing_concurrency,
            &mut self.scanner_interval,
            &mut self.documents_indexing_concurrency,
            &mut self.embedding_concurrency,
        ] {
            normalize_optional_verbatim(value);
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PassthroughValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Accepts a number or a string and keeps its textual form.
fn deserialize_passthrough<'de, D>(deserializer: D) -> Result<Option<Box<str>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<PassthroughValue>::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        PassthroughValue::Integer(number) => number.to_string().into_boxed_str(),
        PassthroughValue::Float(number) => number.to_string().into_boxed_str(),
        PassthroughValue::Text(text) => text.into_boxed_str(),
    }))
}

/// Parse config JSON and return a validated config.
pub fn parse_pipeline_config_json(input: &str) -> Result<ValidatedPipelineConfig, ErrorEnvelope> {
    let config: PipelineConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;
    config.validate_and_normalize().map_err(Into::into)
}

/// Parse config TOML and return a validated config.
pub fn parse_pipeline_config_toml(input: &str) -> Result<ValidatedPipelineConfig, ErrorEnvelope> {
    let config: PipelineConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;
    config.validate_and_normalize().map_err(Into::into)
}

/// Validation failures for the config schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A timeout value is out of bounds.
    TimeoutOutOfRange {
        /// Schema section (e.g. `search`).
        section: &'static str,
        /// Field name in the config file (e.g. `timeoutMs`).
        field: &'static str,
        /// Value provided (ms).
        value_ms: u64,
        /// Minimum allowed value (ms).
        min_ms: u64,
        /// Maximum allowed value (ms).
        max_ms: u64,
    },
    /// A URL entry is invalid.
    InvalidUrl {
        /// Schema section (e.g. `embedding`).
        section: &'static str,
        /// Field name in the config file (e.g. `registryBaseUrl`).
        field: &'static str,
        /// Invalid URL value.
        url: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::TimeoutOutOfRange { .. } => ErrorCode::new("config", "invalid_timeout"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_url"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => write!(
                formatter,
                "unsupported config version {found} (supported: {supported})"
            ),
            Self::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => write!(
                formatter,
                "{section}.{field} must be between {min_ms} and {max_ms} ms (got {value_ms})"
            ),
            Self::InvalidUrl {
                section,
                field,
                url,
            } => write!(
                formatter,
                "{section}.{field} must be an http(s) URL: {}",
                sanitize_url_for_error(url)
            ),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let mut envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => {
                envelope = envelope
                    .with_metadata("found", found.to_string())
                    .with_metadata("supported", supported.to_string());
            },
            ConfigSchemaError::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => {
                envelope = envelope
                    .with_metadata("section", section)
                    .with_metadata("field", field)
                    .with_metadata("value_ms", value_ms.to_string())
                    .with_metadata("min_ms", min_ms.to_string())
                    .with_metadata("max_ms", max_ms.to_string());
            },
            ConfigSchemaError::InvalidUrl {
                section,
                field,
                url,
            } => {
                envelope = envelope
                    .with_metadata("section", section)
                    .with_metadata("field", field)
                    .with_metadata("url", sanitize_url_for_error(&url));
            },
        }

        envelope
    }
}

const fn validate_timeout_ms(
    section: &'static str,
    field: &'static str,
    value_ms: u64,
    min_ms: u64,
    max_ms: u64,
) -> Result<(), ConfigSchemaError> {
    if value_ms < min_ms || value_ms > max_ms {
        return Err(ConfigSchemaError::TimeoutOutOfRange {
            section,
            field,
            value_ms,
            min_ms,
            max_ms,
        });
    }
    Ok(())
}

fn validate_http_url(
    section: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ConfigSchemaError> {
    let parsed = Url::parse(value).map_err(|_| ConfigSchemaError::InvalidUrl {
        section,
        field,
        url: value.to_owned(),
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigSchemaError::InvalidUrl {
            section,
            field,
            url: value.to_owned(),
        });
    }

    Ok(())
}

fn normalize_optional_trimmed(value: &mut Option<Box<str>>) {
    let Some(raw) = value.take() else {
        return;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        *value = None;
    } else {
        *value = Some(trimmed.to_owned().into_boxed_str());
    }
}

fn normalize_optional_verbatim(value: &mut Option<Box<str>>) {
    if value.as_deref().is_some_and(|raw| raw.trim().is_empty()) {
        *value = None;
    }
}

fn normalize_optional_secret(value: &mut Option<SecretString>) {
    if value
        .as_ref()
        .is_some_and(|secret| secret.expose().trim().is_empty())
    {
        *value = None;
    }
}
