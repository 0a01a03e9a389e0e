//! Config loading helpers for CLI surfaces.

use crate::InfraResult;
use embed_preflight_app::PreflightInput;
use embed_preflight_config::{
    EffectiveConfig, EnvOverrides, PipelineEnv, ValidatedPipelineConfig,
    load_pipeline_config_from_path, resolve_overrides, to_pretty_json,
};
use embed_preflight_shared::ErrorEnvelope;
use std::collections::BTreeMap;
use std::path::Path;

/// Base config plus the `ENV_*` overrides read from the same environment.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Defaults, file, and base env merged and validated.
    pub base: ValidatedPipelineConfig,
    /// `ENV_*` overrides.
    pub overrides: EnvOverrides,
}

impl LoadedConfig {
    /// Apply the overrides.
    #[must_use]
    pub fn effective(&self) -> EffectiveConfig {
        resolve_overrides(&self.base, &self.overrides)
    }

    /// Input for a preflight run.
    #[must_use]
    pub fn into_preflight_input(self) -> PreflightInput {
        PreflightInput {
            base: self.base,
            overrides: self.overrides,
        }
    }
}

/// Load the base config and overrides from an env snapshot and optional file.
pub fn load_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> InfraResult<LoadedConfig> {
    let parsed = PipelineEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    let base = load_pipeline_config_from_path(config_path, &parsed)?;
    let overrides = EnvOverrides::from_map(env);
    tracing::debug!(
        config_path = ?config_path,
        overrides = ?overrides.applied_vars(),
        "loaded pipeline config"
    );
    Ok(LoadedConfig { base, overrides })
}

/// Load the effective config, returning deterministic pretty JSON with secrets redacted.
pub fn load_effective_config_json(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> InfraResult<String> {
    let loaded = load_config(env, config_path)?;
    to_pretty_json(loaded.effective().as_config())
}

/// Snapshot of the process environment; non-UTF-8 entries are skipped.
#[must_use]
pub fn std_env_snapshot() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}
