//! Collection lister: index names and match-all document fetch.

use embed_preflight_config::{ConfigKey, EffectiveConfig};
use embed_preflight_ports::{
    CollectionRecord, LoggerPort, SearchCredentials, SearchServicePort, log_fields,
};
use embed_preflight_shared::{RequestContext, Result};
use std::sync::Arc;

/// Dependencies required by the collection lister.
#[derive(Clone)]
pub struct CollectionsDeps {
    /// Search service adapter.
    pub search: Arc<dyn SearchServicePort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

/// Where and as whom to query the search service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    /// Search hostname or base URL.
    pub endpoint: Box<str>,
    /// Basic-auth credentials.
    pub credentials: SearchCredentials,
}

impl SearchTarget {
    /// Build a target from the effective config; the hostname is required.
    pub fn from_config(config: &EffectiveConfig) -> Result<Self> {
        let endpoint = config.require(ConfigKey::SearchHostname)?;
        Ok(Self {
            endpoint: Box::from(endpoint),
            credentials: SearchCredentials::new(
                config.value(ConfigKey::SearchUsername),
                config.search_password(),
            ),
        })
    }
}

/// List the names of every collection at the endpoint.
///
/// One attempt; on failure the message names the endpoint and carries the
/// service's own message.
pub async fn list_collections(
    ctx: &RequestContext,
    deps: &CollectionsDeps,
    target: &SearchTarget,
) -> Result<Vec<Box<str>>> {
    let endpoint = &target.endpoint;
    deps.search
        .list_indices(ctx, endpoint.clone(), target.credentials.clone())
        .await
        .map_err(|error| {
            let message = format!(
                "Failed to list collections from endpoint {endpoint}: {}",
                error.message
            );
            error.with_context(message).with_metadata("endpoint", &**endpoint)
        })
}

/// Fetch the first page of a collection's documents with a match-all query.
///
/// The page size is the search service default (10 hits on OpenSearch).
///
/// An existing but empty collection yields an empty vector and an info log.
pub async fn get_collection(
    ctx: &RequestContext,
    deps: &CollectionsDeps,
    target: &SearchTarget,
    name: &str,
) -> Result<Vec<CollectionRecord>> {
    let endpoint = &target.endpoint;
    let records = deps
        .search
        .search_all(
            ctx,
            endpoint.clone(),
            Box::from(name),
            target.credentials.clone(),
        )
        .await
        .map_err(|error| {
            let message = format!(
                "Failed to get collection {name} from endpoint {endpoint}: {}",
                error.message
            );
            error
                .with_context(message)
                .with_metadata("endpoint", &**endpoint)
                .with_metadata("collection", name)
        })?;

    if records.is_empty()
        && let Some(logger) = deps.logger.as_ref()
    {
        logger.info(
            "collections.get.empty",
            &format!("Collection {name} exists on endpoint {endpoint} but is empty."),
            Some(log_fields([("collection", name), ("endpoint", &**endpoint)])),
        );
    }
    Ok(records)
}
