//! # embed-preflight-config
//!
//! Configuration schema, env parsing, `ENV_*` override resolution, and
//! loading for the preflight validator. This crate depends on `shared` only.

/// Base environment variable parsing and merging.
pub mod env;
/// Config loading helpers (file + env).
pub mod load;
/// `ENV_*` override resolution and the effective config.
pub mod resolve;
/// Configuration schema types and helpers.
pub mod schema;

pub use env::{EnvParseError, PipelineEnv, apply_pipeline_env};
pub use load::{
    load_pipeline_config_from_path, load_pipeline_config_from_sources,
    load_pipeline_config_std_env, to_pretty_json,
};
pub use resolve::{ConfigKey, EffectiveConfig, EnvOverrides, resolve_overrides};
pub use schema::{
    CURRENT_CONFIG_VERSION, ConfigSchemaError, EmbeddingModelConfig, PipelineConfig,
    PipelineTuningConfig, SearchConfig, StorageConfig, ValidatedPipelineConfig,
    parse_pipeline_config_json, parse_pipeline_config_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
