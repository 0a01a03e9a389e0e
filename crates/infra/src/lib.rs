//! # embed-preflight-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, `ports`, and `shared`.

/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Standalone registry and search queries for operators.
pub mod diagnostics;
/// Infra error aliases.
pub mod error;
/// Adapter construction from the effective config.
mod factory;
/// Full preflight run wired to real adapters.
pub mod preflight_run;
/// Blocking runtime helper.
pub mod runtime;

pub use config_check::{LoadedConfig, load_config, load_effective_config_json, std_env_snapshot};
pub use diagnostics::{run_get_collection, run_list_collections, run_model_check};
pub use error::{InfraError, InfraResult};
pub use factory::{build_model_registry, build_preflight_deps, build_search_service};
pub use preflight_run::run_preflight_with_env;
pub use runtime::block_on;

// Re-export redaction utilities for CLI boundary sanitization
pub use embed_preflight_shared::{is_secret_key, redact_if_secret};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
