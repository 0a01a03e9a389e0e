//! Fixed in-memory adapters with call counters.
//!
//! These answer from data supplied up front and never touch the network or
//! the filesystem, so use cases can be exercised deterministically.

use embed_preflight_ports::{
    BoxFuture, CollectionRecord, ModelDescriptor, ModelRegistryPort, PathKind, PathProbePort,
    SearchCredentials, SearchServicePort,
};
use embed_preflight_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Model registry answering from a fixed set of `(region, model id)` pairs.
#[derive(Debug, Default)]
pub struct FixedModelRegistry {
    models: BTreeSet<(Box<str>, Box<str>)>,
    failure: Option<ErrorEnvelope>,
    calls: AtomicUsize,
}

impl FixedModelRegistry {
    /// Empty registry: every lookup is `model_not_found`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model as available in a region.
    #[must_use]
    pub fn with_model(mut self, region: &str, model_id: &str) -> Self {
        self.models.insert((Box::from(region), Box::from(model_id)));
        self
    }

    /// Fail every lookup with the given error.
    #[must_use]
    pub fn failing(error: ErrorEnvelope) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Number of lookups made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelRegistryPort for FixedModelRegistry {
    fn get_model(
        &self,
        _ctx: &RequestContext,
        region: Box<str>,
        model_id: Box<str>,
    ) -> BoxFuture<'_, Result<ModelDescriptor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = if let Some(error) = &self.failure {
            Err(error.clone())
        } else if self.models.contains(&(region.clone(), model_id.clone())) {
            Ok(ModelDescriptor::from_id(model_id))
        } else {
            Err(ErrorEnvelope::expected(
                ErrorCode::model_not_found(),
                format!("model {model_id} is not available in {region}"),
            ))
        };
        Box::pin(async move { result })
    }
}

/// Search service answering from fixed indices and documents.
#[derive(Debug, Default)]
pub struct FixedSearchService {
    indices: Vec<Box<str>>,
    documents: BTreeMap<Box<str>, Vec<CollectionRecord>>,
    failure: Option<ErrorEnvelope>,
    list_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

impl FixedSearchService {
    /// Service exposing the given (empty) indices.
    #[must_use]
    pub fn with_indices<'a>(indices: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            indices: indices.into_iter().map(Box::from).collect(),
            ..Self::default()
        }
    }

    /// Add documents to an index, registering the index when new.
    #[must_use]
    pub fn with_documents(mut self, index: &str, sources: Vec<serde_json::Value>) -> Self {
        if !self.indices.iter().any(|existing| &**existing == index) {
            self.indices.push(Box::from(index));
        }
        let records = self.documents.entry(Box::from(index)).or_default();
        for source in sources {
            let id = format!("{index}-{}", records.len() + 1);
            records.push(CollectionRecord {
                id: id.into_boxed_str(),
                index: Box::from(index),
                source,
            });
        }
        self
    }

    /// Fail every call with the given error.
    #[must_use]
    pub fn failing(error: ErrorEnvelope) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Number of `list_indices` calls made so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `search_all` calls made so far.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

impl SearchServicePort for FixedSearchService {
    fn list_indices(
        &self,
        _ctx: &RequestContext,
        _endpoint: Box<str>,
        _credentials: SearchCredentials,
    ) -> BoxFuture<'_, Result<Vec<Box<str>>>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .failure
            .clone()
            .map_or_else(|| Ok(self.indices.clone()), Err);
        Box::pin(async move { result })
    }

    fn search_all(
        &self,
        _ctx: &RequestContext,
        _endpoint: Box<str>,
        index: Box<str>,
        _credentials: SearchCredentials,
    ) -> BoxFuture<'_, Result<Vec<CollectionRecord>>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let result = if let Some(error) = &self.failure {
            Err(error.clone())
        } else if self.indices.contains(&index) {
            Ok(self.documents.get(&index).cloned().unwrap_or_default())
        } else {
            Err(ErrorEnvelope::expected(
                ErrorCode::collection_not_found(),
                format!("no such index [{index}]"),
            ))
        };
        Box::pin(async move { result })
    }
}

/// Path probe answering from a fixed map; unknown paths are `core:not_found`.
#[derive(Debug, Default)]
pub struct FixedPathProbe {
    entries: BTreeMap<PathBuf, PathKind>,
    calls: AtomicUsize,
}

impl FixedPathProbe {
    /// Empty probe.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path with its kind.
    #[must_use]
    pub fn with_entry(mut self, path: impl AsRef<Path>, kind: PathKind) -> Self {
        self.entries.insert(path.as_ref().to_path_buf(), kind);
        self
    }

    /// Number of status calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PathProbePort for FixedPathProbe {
    fn stat(&self, _ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<PathKind>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.entries.get(&path).copied().ok_or_else(|| {
            ErrorEnvelope::expected(ErrorCode::not_found(), "No such file or directory")
                .with_metadata("path", path.to_string_lossy())
        });
        Box::pin(async move { result })
    }
}
