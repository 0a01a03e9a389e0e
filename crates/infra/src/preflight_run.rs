//! Preflight run over the process environment.

use crate::{InfraResult, build_preflight_deps, load_config};
use embed_preflight_app::{ValidationOutcome, run_preflight};
use embed_preflight_ports::LoggerPort;
use embed_preflight_shared::RequestContext;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Load config from `env` (and an optional file), wire real adapters, and run
/// every preflight check.
///
/// Errors are setup failures (unreadable config, adapter construction); check
/// failures are reported in the returned outcome.
pub async fn run_preflight_with_env(
    ctx: &RequestContext,
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    logger: Option<Arc<dyn LoggerPort>>,
) -> InfraResult<ValidationOutcome> {
    let loaded = load_config(env, config_path)?;
    let deps = build_preflight_deps(&loaded.effective(), logger)?;
    Ok(run_preflight(ctx, &deps, loaded.into_preflight_input()).await)
}
