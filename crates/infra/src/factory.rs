//! Adapter selection and initialization.

use crate::InfraResult;
use embed_preflight_adapters::bedrock::{BedrockModelRegistry, BedrockRegistryConfig};
use embed_preflight_adapters::fs::LocalPathProbe;
use embed_preflight_adapters::opensearch::{OpenSearchConfig, OpenSearchService};
use embed_preflight_app::PreflightDeps;
use embed_preflight_config::EffectiveConfig;
use embed_preflight_ports::{LoggerPort, ModelRegistryPort, SearchServicePort};
use std::sync::Arc;

/// Build the Bedrock model registry adapter.
pub fn build_model_registry(config: &EffectiveConfig) -> InfraResult<Arc<dyn ModelRegistryPort>> {
    let adapter = BedrockModelRegistry::new(&BedrockRegistryConfig::from_effective_config(config))?;
    Ok(Arc::new(adapter))
}

/// Build the OpenSearch search service adapter.
pub fn build_search_service(config: &EffectiveConfig) -> InfraResult<Arc<dyn SearchServicePort>> {
    let adapter = OpenSearchService::new(OpenSearchConfig::from_effective_config(config))?;
    Ok(Arc::new(adapter))
}

/// Build every dependency of a preflight run.
pub fn build_preflight_deps(
    config: &EffectiveConfig,
    logger: Option<Arc<dyn LoggerPort>>,
) -> InfraResult<PreflightDeps> {
    Ok(PreflightDeps {
        registry: build_model_registry(config)?,
        search: build_search_service(config)?,
        probe: Arc::new(LocalPathProbe::new()),
        logger,
    })
}
