//! Single-check entry points for operators debugging a failed preflight.

use crate::{InfraResult, build_model_registry, build_search_service, load_config};
use embed_preflight_app::{
    CollectionsDeps, ModelCheckInput, SearchTarget, check_model_exists, get_collection,
    list_collections,
};
use embed_preflight_config::ConfigKey;
use embed_preflight_ports::{CollectionRecord, LoggerPort, ModelDescriptor};
use embed_preflight_shared::RequestContext;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Look up the configured embedding model in the configured region.
pub async fn run_model_check(
    ctx: &RequestContext,
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> InfraResult<ModelDescriptor> {
    let config = load_config(env, config_path)?.effective();
    let input = ModelCheckInput {
        region: Box::from(config.require(ConfigKey::Region)?),
        model_id: Box::from(config.require(ConfigKey::EmbeddingModelId)?),
    };
    let registry = build_model_registry(&config)?;
    check_model_exists(ctx, registry.as_ref(), input).await
}

/// List every collection at the configured search endpoint.
pub async fn run_list_collections(
    ctx: &RequestContext,
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    logger: Option<Arc<dyn LoggerPort>>,
) -> InfraResult<Vec<Box<str>>> {
    let config = load_config(env, config_path)?.effective();
    let target = SearchTarget::from_config(&config)?;
    let deps = CollectionsDeps {
        search: build_search_service(&config)?,
        logger,
    };
    list_collections(ctx, &deps, &target).await
}

/// Fetch the first page of a collection's documents; defaults to the
/// configured collection.
pub async fn run_get_collection(
    ctx: &RequestContext,
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    name: Option<&str>,
    logger: Option<Arc<dyn LoggerPort>>,
) -> InfraResult<Vec<CollectionRecord>> {
    let config = load_config(env, config_path)?.effective();
    let name = match name {
        Some(name) => name,
        None => config.require(ConfigKey::CollectionName)?,
    };
    let target = SearchTarget::from_config(&config)?;
    let deps = CollectionsDeps {
        search: build_search_service(&config)?,
        logger,
    };
    get_collection(ctx, &deps, &target, name).await
}
