//! Base environment variable parsing and env-to-config merging.
//!
//! This module keeps env parsing:
//! - lenient for strings (blank values count as unset)
//! - strict for numbers and URLs (invalid values fail fast)
//! - safe (secret values are redacted in error metadata)

use crate::schema::{PipelineConfig, ValidatedPipelineConfig};
use embed_preflight_shared::{ErrorCode, ErrorEnvelope, REDACTED_VALUE, SecretString, is_secret_key};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Env var: deployment profile label.
pub const ENV_PROFILE: &str = "PROFILE";
/// Env var: cloud region.
pub const ENV_REGION: &str = "REGION";
/// Env var: search collection name.
pub const ENV_COLLECTION_NAME: &str = "OPEN_SEARCH_SERVERLESS_COLLECTION_NAME";
/// Env var: search service hostname.
pub const ENV_SEARCH_HOSTNAME: &str = "OPEN_SEARCH_HOSTNAME";
/// Env var: search basic auth username.
pub const ENV_SEARCH_USERNAME: &str = "OPENSEARCH_USERNAME";
/// Env var: search basic auth password (secret).
// gitleaks:allow
pub const ENV_SEARCH_PASSWORD: &str = "OPENSEARCH_PASSWORD";
/// Env var: search request timeout in milliseconds.
pub const ENV_SEARCH_TIMEOUT_MS: &str = "PREFLIGHT_SEARCH_TIMEOUT_MS";
/// Env var: embedding model identifier.
pub const ENV_EMBEDDING_MODEL_ID: &str = "BEDROCK_EMBEDDING_MODEL_ID";
/// Env var: embedding output vector size.
pub const ENV_EMBEDDING_OUTPUT_VECTOR_SIZE: &str = "BEDROCK_EMBEDDING_MODEL_OUTPUT_VECTOR_SIZE";
/// Env var: model registry base URL override.
pub const ENV_REGISTRY_BASE_URL: &str = "PREFLIGHT_REGISTRY_BASE_URL";
/// Env var: model registry bearer token (secret).
// gitleaks:allow
pub const ENV_REGISTRY_TOKEN: &str = "AWS_BEARER_TOKEN_BEDROCK";
/// Env var: model registry request timeout in milliseconds.
pub const ENV_REGISTRY_TIMEOUT_MS: &str = "PREFLIGHT_REGISTRY_TIMEOUT_MS";
/// Env var: document data directory.
pub const ENV_DATA_DIRECTORY: &str = "DATA_DIRECTORY";
/// Env var: internal database path.
pub const ENV_INTERNAL_DB: &str = "INTERNAL_DB";
/// Env var: text splitter chunk size.
pub const ENV_TEXT_SPLITTER_CHUNK_SIZE: &str = "TEXT_SPLITTER_CHUNK_SIZE";
/// Env var: text splitter chunk overlap.
pub const ENV_TEXT_SPLITTER_CHUNK_OVERLAP: &str = "TEXT_SPLITTER_CHUNK_OVERLAP";
/// Env var: concurrent file readers.
pub const ENV_FILES_PROCESSING_CONCURRENCY: &str = "FILES_PROCESSING_CONCURRENCY";
/// Env var: scanner interval.
pub const ENV_SCANNER_INTERVAL: &str = "SCANNER_INTERVAL";
/// Env var: concurrent document indexing tasks.
pub const ENV_DOCUMENTS_INDEXING_CONCURRENCY: &str = "DOCUMENTS_INDEXING_CONCURRENCY";
/// Env var: concurrent embedding requests.
pub const ENV_EMBEDDING_CONCURRENCY: &str = "EMBEDDING_CONCURRENCY";

const BASE_ENV_VARS: [&str; 20] = [
    ENV_PROFILE,
    ENV_REGION,
    ENV_COLLECTION_NAME,
    ENV_SEARCH_HOSTNAME,
    ENV_SEARCH_USERNAME,
    ENV_SEARCH_PASSWORD,
    ENV_SEARCH_TIMEOUT_MS,
    ENV_EMBEDDING_MODEL_ID,
    ENV_EMBEDDING_OUTPUT_VECTOR_SIZE,
    ENV_REGISTRY_BASE_URL,
    ENV_REGISTRY_TOKEN,
    ENV_REGISTRY_TIMEOUT_MS,
    ENV_DATA_DIRECTORY,
    ENV_INTERNAL_DB,
    ENV_TEXT_SPLITTER_CHUNK_SIZE,
    ENV_TEXT_SPLITTER_CHUNK_OVERLAP,
    ENV_FILES_PROCESSING_CONCURRENCY,
    ENV_SCANNER_INTERVAL,
    ENV_DOCUMENTS_INDEXING_CONCURRENCY,
    ENV_EMBEDDING_CONCURRENCY,
];

/// Typed values read from the base process environment.
///
/// These sit above the config file and below the `ENV_` overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineEnv {
    /// Value for `profile`.
    pub profile: Option<Box<str>>,
    /// Value for `region`.
    pub region: Option<Box<str>>,
    /// Value for `search.collectionName`.
    pub collection_name: Option<Box<str>>,
    /// Value for `search.hostname`.
    pub search_hostname: Option<Box<str>>,
    /// Value for `search.username`.
    pub search_username: Option<Box<str>>,
    /// Value for `search.password`.
    pub search_password: Option<SecretString>,
    /// Value for `search.timeoutMs`.
    pub search_timeout_ms: Option<u64>,
    /// Value for `embedding.modelId`.
    pub embedding_model_id: Option<Box<str>>,
    /// Value for `embedding.outputVectorSize`.
    pub embedding_output_vector_size: Option<Box<str>>,
    /// Value for `embedding.registryBaseUrl`.
    pub registry_base_url: Option<Box<str>>,
    /// Value for `embedding.registryToken`.
    pub registry_token: Option<SecretString>,
    /// Value for `embedding.registryTimeoutMs`.
    pub registry_timeout_ms: Option<u64>,
    /// Value for `storage.dataDirectory`.
    pub data_directory: Option<Box<str>>,
    /// Value for `storage.internalDb`.
    pub internal_db: Option<Box<str>>,
    /// Value for `pipeline.textSplitterChunkSize`.
    pub text_splitter_chunk_size: Option<Box<str>>,
    /// Value for `pipeline.textSplitterChunkOverlap`.
    pub text_splitter_chunk_overlap: Option<Box<str>>,
    /// Value for `pipeline.filesProcessingConcurrency`.
    pub files_processing_concurrency: Option<Box<str>>,
    /// Value for `pipeline.scannerInterval`.
    pub scanner_interval: Option<Box<str>>,
    /// Value for `pipeline.documentsIndexingConcurrency`.
    pub documents_indexing_concurrency: Option<Box<str>>,
    /// Value for `pipeline.embeddingConcurrency`.
    pub embedding_concurrency: Option<Box<str>>,
}

impl PipelineEnv {
    /// Parse env values from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            profile: parse_optional_trimmed_string(map, ENV_PROFILE),
            region: parse_optional_trimmed_string(map, ENV_REGION),
            collection_name: parse_optional_trimmed_string(map, ENV_COLLECTION_NAME),
            search_hostname: parse_optional_trimmed_string(map, ENV_SEARCH_HOSTNAME),
            search_username: parse_optional_trimmed_string(map, ENV_SEARCH_USERNAME),
            search_password: parse_optional_secret(map, ENV_SEARCH_PASSWORD),
            search_timeout_ms: parse_optional_u64(map, ENV_SEARCH_TIMEOUT_MS)?,
            embedding_model_id: parse_optional_trimmed_string(map, ENV_EMBEDDING_MODEL_ID),
            embedding_output_vector_size: parse_optional_verbatim(
                map,
                ENV_EMBEDDING_OUTPUT_VECTOR_SIZE,
            ),
            registry_base_url: parse_optional_url_string(map, ENV_REGISTRY_BASE_URL)?,
            registry_token: parse_optional_secret(map, ENV_REGISTRY_TOKEN),
            registry_timeout_ms: parse_optional_u64(map, ENV_REGISTRY_TIMEOUT_MS)?,
            data_directory: parse_optional_trimmed_string(map, ENV_DATA_DIRECTORY),
            internal_db: parse_optional_trimmed_string(map, ENV_INTERNAL_DB),
            text_splitter_chunk_size: parse_optional_verbatim(map, ENV_TEXT_SPLITTER_CHUNK_SIZE),
            text_splitter_chunk_overlap: parse_optional_verbatim(
                map,
                ENV_TEXT_SPLITTER_CHUNK_OVERLAP,
            ),
            files_processing_concurrency: parse_optional_verbatim(
                map,
                ENV_FILES_PROCESSING_CONCURRENCY,
            ),
            scanner_interval: parse_optional_verbatim(map, ENV_SCANNER_INTERVAL),
            documents_indexing_concurrency: parse_optional_verbatim(
                map,
                ENV_DOCUMENTS_INDEXING_CONCURRENCY,
            ),
            embedding_concurrency: parse_optional_verbatim(map, ENV_EMBEDDING_CONCURRENCY),
        })
    }

    /// Parse env values from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in BASE_ENV_VARS {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }

        Self::from_map(&map)
    }
}

/// Apply base env values to a config (env wins over file/default values).
pub fn apply_pipeline_env(
    base: PipelineConfig,
    env: &PipelineEnv,
) -> Result<ValidatedPipelineConfig, ErrorEnvelope> {
    let mut config = base;

    set_string(&mut config.profile, env.profile.as_deref());
    set_string(&mut config.region, env.region.as_deref());

    set_string(&mut config.search.hostname, env.search_hostname.as_deref());
    set_string(
        &mut config.search.collection_name,
        env.collection_name.as_deref(),
    );
    set_string(&mut config.search.username, env.search_username.as_deref());
    set_secret(&mut config.search.password, env.search_password.as_ref());
    set_value(&mut config.search.timeout_ms, env.search_timeout_ms);

    set_string(
        &mut config.embedding.model_id,
        env.embedding_model_id.as_deref(),
    );
    set_string(
        &mut config.embedding.output_vector_size,
        env.embedding_output_vector_size.as_deref(),
    );
    set_string(
        &mut config.embedding.registry_base_url,
        env.registry_base_url.as_deref(),
    );
    set_secret(
        &mut config.embedding.registry_token,
        env.registry_token.as_ref(),
    );
    set_value(
        &mut config.embedding.registry_timeout_ms,
        env.registry_timeout_ms,
    );

    set_string(
        &mut config.storage.data_directory,
        env.data_directory.as_deref(),
    );
    set_string(&mut config.storage.internal_db, env.internal_db.as_deref());

    let pipeline = &mut config.pipeline;
    set_string(
        &mut pipeline.text_splitter_chunk_size,
        env.text_splitter_chunk_size.as_deref(),
    );
    set_string(
        &mut pipeline.text_splitter_chunk_overlap,
        env.text_splitter_chunk_overlap.as_deref(),
    );
    set_string(
        &mut pipeline.files_processing_concurrency,
        env.files_processing_concurrency.as_deref(),
    );
    set_string(
        &mut pipeline.scanner_interval,
        env.scanner_interval.as_deref(),
    );
    set_string(
        &mut pipeline.documents_indexing_concurrency,
        env.documents_indexing_concurrency.as_deref(),
    );
    set_string(
        &mut pipeline.embedding_concurrency,
        env.embedding_concurrency.as_deref(),
    );

    config.validate_and_normalize().map_err(Into::into)
}

fn set_string(target: &mut Option<Box<str>>, value: Option<&str>) {
    if let Some(value) = value {
        *target = Some(value.into());
    }
}

fn set_secret(target: &mut Option<SecretString>, value: Option<&SecretString>) {
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}

const fn set_value<T: Copy>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// URL env var had an invalid value.
    InvalidUrl {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_env_url"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
            Self::InvalidUrl { var, .. } => write!(formatter, "{var} must be a valid URL"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::InvalidInt { var, value } | EnvParseError::InvalidUrl { var, value } => {
                envelope
                    .with_metadata("env_var", var)
                    .with_metadata("value", redact_value(var, &value))
            },
        }
    }
}

pub(crate) fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Option<Box<str>> {
    let trimmed = map.get(var)?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_owned().into_boxed_str())
}

/// Returns the raw value unless it is blank.
fn parse_optional_verbatim(map: &BTreeMap<String, String>, var: &'static str) -> Option<Box<str>> {
    let raw = map.get(var)?;
    if raw.trim().is_empty() {
        return None;
    }
    Some(raw.clone().into_boxed_str())
}

pub(crate) fn parse_optional_secret(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Option<SecretString> {
    parse_optional_verbatim(map, var).map(SecretString::new)
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: raw.clone(),
        })
}

fn parse_optional_url_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(trimmed) = parse_optional_trimmed_string(map, var) else {
        return Ok(None);
    };

    let invalid = || EnvParseError::InvalidUrl {
        var,
        value: trimmed.to_string(),
    };
    let parsed = Url::parse(&trimmed).map_err(|_| invalid())?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(invalid());
    }

    Ok(Some(trimmed))
}

fn redact_value(var: &str, value: &str) -> String {
    if is_secret_key(var) {
        REDACTED_VALUE.to_string()
    } else {
        value.to_string()
    }
}
