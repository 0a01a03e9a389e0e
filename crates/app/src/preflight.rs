//! Preflight orchestrator: ordered, fail-fast dependency checks.
//!
//! Checks run strictly in sequence; each one starts only after the previous
//! one passed. The first failure ends the run and is the last entry of the
//! outcome. Nothing is retried.

use crate::collections::{CollectionsDeps, SearchTarget, list_collections};
use crate::model_check::{ModelCheckInput, check_model_exists};
use embed_preflight_config::{
    ConfigKey, EffectiveConfig, EnvOverrides, ValidatedPipelineConfig, resolve_overrides,
};
use embed_preflight_ports::{
    LoggerPort, ModelRegistryPort, PathProbePort, SearchServicePort, log_fields,
};
use embed_preflight_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Preflight checks, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckName {
    /// Apply `ENV_*` overrides.
    ResolveOverrides,
    /// Data directory exists and is a directory.
    DataDirectory,
    /// Parent of the internal database path exists and is a directory.
    InternalDbDirectory,
    /// Embedding model is retrievable in the region.
    EmbeddingModel,
    /// Collection is present at the search endpoint.
    Collection,
}

impl CheckName {
    /// All checks in execution order.
    pub const ALL: [Self; 5] = [
        Self::ResolveOverrides,
        Self::DataDirectory,
        Self::InternalDbDirectory,
        Self::EmbeddingModel,
        Self::Collection,
    ];

    /// Stable snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResolveOverrides => "resolve_overrides",
            Self::DataDirectory => "data_directory",
            Self::InternalDbDirectory => "internal_db_directory",
            Self::EmbeddingModel => "embedding_model",
            Self::Collection => "collection",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Which check ran.
    pub check: CheckName,
    /// Whether it passed.
    pub passed: bool,
    /// Diagnostic message.
    pub message: Box<str>,
}

/// Ordered results of a preflight run.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Results of the checks that ran, in order.
    pub checks: Vec<CheckResult>,
    /// Error of the failing check, if any.
    pub error: Option<ErrorEnvelope>,
    /// Config the checks ran against.
    pub effective: EffectiveConfig,
}

impl ValidationOutcome {
    /// True when every check ran and passed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.checks.len() == CheckName::ALL.len()
    }

    /// The failing check, if any.
    #[must_use]
    pub fn failed_check(&self) -> Option<&CheckResult> {
        self.checks.iter().find(|result| !result.passed)
    }

    /// Convert into a `Result`, keeping the effective config on success.
    pub fn into_result(self) -> Result<EffectiveConfig> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.effective),
        }
    }
}

/// Dependencies required by the preflight run.
#[derive(Clone)]
pub struct PreflightDeps {
    /// Model registry adapter.
    pub registry: Arc<dyn ModelRegistryPort>,
    /// Search service adapter.
    pub search: Arc<dyn SearchServicePort>,
    /// Filesystem status adapter.
    pub probe: Arc<dyn PathProbePort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

impl PreflightDeps {
    fn collections(&self) -> CollectionsDeps {
        CollectionsDeps {
            search: Arc::clone(&self.search),
            logger: self.logger.clone(),
        }
    }
}

/// Base config plus the overrides to apply.
#[derive(Debug, Clone)]
pub struct PreflightInput {
    /// Config from defaults, file, and base env.
    pub base: ValidatedPipelineConfig,
    /// `ENV_*` overrides.
    pub overrides: EnvOverrides,
}

/// Run every check in order, stopping at the first failure.
#[tracing::instrument(name = "preflight", skip_all, fields(correlation_id = %ctx.correlation_id()))]
pub async fn run_preflight(
    ctx: &RequestContext,
    deps: &PreflightDeps,
    input: PreflightInput,
) -> ValidationOutcome {
    let effective = resolve_overrides(&input.base, &input.overrides);
    let mut checks = vec![CheckResult {
        check: CheckName::ResolveOverrides,
        passed: true,
        message: overrides_message(&input.overrides).into_boxed_str(),
    }];

    let error = run_checks(ctx, deps, &effective, &mut checks).await.err();
    match (&error, deps.logger.as_ref()) {
        (Some(error), Some(logger)) => {
            let check = checks.last().map_or("unknown", |result| result.check.as_str());
            logger.error(
                "preflight.check.failed",
                error,
                Some(log_fields([("check", check)])),
            );
        },
        (None, Some(logger)) => {
            logger.info("preflight.completed", "Preflight validation passed", None);
        },
        (_, None) => {},
    }

    ValidationOutcome {
        checks,
        error,
        effective,
    }
}

async fn run_checks(
    ctx: &RequestContext,
    deps: &PreflightDeps,
    config: &EffectiveConfig,
    checks: &mut Vec<CheckResult>,
) -> Result<()> {
    let result = check_data_directory(ctx, deps, config).await;
    record(deps, checks, CheckName::DataDirectory, result)?;

    let result = check_internal_db_directory(ctx, deps, config).await;
    record(deps, checks, CheckName::InternalDbDirectory, result)?;

    let result = check_embedding_model(ctx, deps, config).await;
    record(deps, checks, CheckName::EmbeddingModel, result)?;

    let result = check_collection(ctx, deps, config).await;
    record(deps, checks, CheckName::Collection, result)
}

fn record(
    deps: &PreflightDeps,
    checks: &mut Vec<CheckResult>,
    check: CheckName,
    result: Result<String>,
) -> Result<()> {
    match result {
        Ok(message) => {
            if let Some(logger) = deps.logger.as_ref() {
                logger.debug(
                    "preflight.check.passed",
                    &message,
                    Some(log_fields([("check", check.as_str())])),
                );
            }
            checks.push(CheckResult {
                check,
                passed: true,
                message: message.into_boxed_str(),
            });
            Ok(())
        },
        Err(error) => {
            checks.push(CheckResult {
                check,
                passed: false,
                message: error.message.clone().into_boxed_str(),
            });
            Err(error)
        },
    }
}

fn overrides_message(overrides: &EnvOverrides) -> String {
    let applied = overrides.applied_vars();
    if applied.is_empty() {
        "No environment overrides set".to_string()
    } else {
        format!("Applied environment overrides: {}", applied.join(", "))
    }
}

async fn check_data_directory(
    ctx: &RequestContext,
    deps: &PreflightDeps,
    config: &EffectiveConfig,
) -> Result<String> {
    let path = Path::new(config.require(ConfigKey::DataDirectory)?);
    ensure_directory(ctx, deps.probe.as_ref(), path, "data directory").await?;
    Ok(format!("Data directory {} is a directory", path.display()))
}

async fn check_internal_db_directory(
    ctx: &RequestContext,
    deps: &PreflightDeps,
    config: &EffectiveConfig,
) -> Result<String> {
    let internal_db = config.require(ConfigKey::InternalDb)?;
    let parent = parent_directory(Path::new(internal_db));
    ensure_directory(ctx, deps.probe.as_ref(), &parent, "internal db")
        .await
        .map_err(|error| error.with_metadata("internalDb", internal_db))?;
    Ok(format!(
        "Internal db directory {} is a directory",
        parent.display()
    ))
}

async fn check_embedding_model(
    ctx: &RequestContext,
    deps: &PreflightDeps,
    config: &EffectiveConfig,
) -> Result<String> {
    let region = config.require(ConfigKey::Region)?;
    let model_id = config.require(ConfigKey::EmbeddingModelId)?;
    check_model_exists(
        ctx,
        deps.registry.as_ref(),
        ModelCheckInput {
            region: Box::from(region),
            model_id: Box::from(model_id),
        },
    )
    .await?;
    Ok(format!("Embedding model {model_id} found in region {region}"))
}

async fn check_collection(
    ctx: &RequestContext,
    deps: &PreflightDeps,
    config: &EffectiveConfig,
) -> Result<String> {
    let region = config.require(ConfigKey::Region)?;
    let name = config.require(ConfigKey::CollectionName)?;
    let target = SearchTarget::from_config(config)?;

    let names = list_collections(ctx, &deps.collections(), &target).await?;
    if !names.iter().any(|existing| &**existing == name) {
        return Err(ErrorEnvelope::expected(
            ErrorCode::collection_not_found(),
            format!("Unable to find collection {name} in region {region}"),
        )
        .with_metadata("collection", name)
        .with_metadata("region", region)
        .with_metadata("endpoint", &*target.endpoint));
    }

    let message = format!("Collection {name} in region {region} found successfully.");
    if let Some(logger) = deps.logger.as_ref() {
        logger.info(
            "preflight.collection.found",
            &message,
            Some(log_fields([("collection", name), ("region", region)])),
        );
    }
    Ok(message)
}

/// Stat `path` without following symlinks and require a directory.
async fn ensure_directory(
    ctx: &RequestContext,
    probe: &dyn PathProbePort,
    path: &Path,
    label: &str,
) -> Result<()> {
    let failure = format!("Failed to get {label} status {}", path.display());
    let kind = probe
        .stat(ctx, path.to_path_buf())
        .await
        .map_err(|error| error.with_context(failure.clone()))?;
    if kind.is_directory() {
        return Ok(());
    }
    Err(ErrorEnvelope::expected(ErrorCode::not_a_directory(), failure)
        .with_metadata("path", path.to_string_lossy())
        .with_metadata("kind", kind.as_str()))
}

/// Parent directory of a file path; a bare file name resolves to `.`.
fn parent_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_of_bare_file_name_is_current_dir() {
        assert_eq!(parent_directory(Path::new("internal.db")), PathBuf::from("."));
        assert_eq!(
            parent_directory(Path::new("/var/lib/pipeline/internal.db")),
            PathBuf::from("/var/lib/pipeline")
        );
        assert_eq!(parent_directory(Path::new("/")), PathBuf::from("."));
    }

    #[test]
    fn check_names_are_ordered() {
        let mut sorted = CheckName::ALL;
        sorted.sort();
        assert_eq!(sorted, CheckName::ALL);
        assert_eq!(CheckName::InternalDbDirectory.to_string(), "internal_db_directory");
    }

    #[test]
    fn overrides_message_lists_applied_vars() {
        assert_eq!(
            overrides_message(&EnvOverrides::default()),
            "No environment overrides set"
        );
        let overrides = EnvOverrides {
            region: Some("us-west-2".into()),
            ..EnvOverrides::default()
        };
        assert_eq!(
            overrides_message(&overrides),
            "Applied environment overrides: ENV_REGION"
        );
    }
}
