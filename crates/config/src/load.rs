//! Config loading helpers (file + env).
//!
//! The loader is responsible for deterministic merge order and surfacing
//! user-facing errors as typed `ErrorEnvelope`s.

use crate::{PipelineConfig, PipelineEnv, ValidatedPipelineConfig, apply_pipeline_env};
use embed_preflight_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Load the pipeline config from sources using a deterministic precedence order.
///
/// Precedence (highest wins):
/// - base env values (`PipelineEnv`)
/// - config JSON (file content)
/// - defaults (`PipelineConfig::default()`)
///
/// `ENV_*` overrides are applied later by `resolve_overrides`.
pub fn load_pipeline_config_from_sources(
    config_json: Option<&str>,
    env: &PipelineEnv,
) -> Result<ValidatedPipelineConfig, ErrorEnvelope> {
    let config = match config_json {
        None => PipelineConfig::default(),
        Some(input) => parse_config_unvalidated(input, ConfigFormat::Json)?,
    };

    // env is applied last and also validates/normalizes the resulting config.
    apply_pipeline_env(config, env)
}

/// Load the pipeline config from an optional file path.
pub fn load_pipeline_config_from_path(
    config_path: Option<&Path>,
    env: &PipelineEnv,
) -> Result<ValidatedPipelineConfig, ErrorEnvelope> {
    let config = match config_path {
        None => PipelineConfig::default(),
        Some(path) => {
            let config_text = read_config_file(path)?;
            let format = detect_config_format(path)?;
            parse_config_unvalidated(&config_text, format)
                .map_err(|error| error.with_metadata("path", path.to_string_lossy()))?
        },
    };

    apply_pipeline_env(config, env)
}

/// Load the pipeline config from std env and an optional file path.
pub fn load_pipeline_config_std_env(
    config_path: Option<&Path>,
) -> Result<ValidatedPipelineConfig, ErrorEnvelope> {
    let env = PipelineEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_pipeline_config_from_path(config_path, &env)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
///
/// Secrets serialize as a redaction marker.
pub fn to_pretty_json(config: &PipelineConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<PipelineConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}
