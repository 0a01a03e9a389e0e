//! Model registry boundary contract.

use crate::BoxFuture;
use embed_preflight_shared::{RequestContext, Result};

/// Foundation model details returned by the registry.
///
/// Only existence matters to the preflight; the remaining fields are kept for
/// operator output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Model identifier, e.g. `amazon.titan-embed-text-v1`.
    pub model_id: Box<str>,
    /// Model ARN, when the registry reports one.
    pub model_arn: Option<Box<str>>,
    /// Provider name, e.g. `Amazon`.
    pub provider_name: Option<Box<str>>,
    /// Output modalities, e.g. `EMBEDDING`.
    pub output_modalities: Vec<Box<str>>,
}

impl ModelDescriptor {
    /// Descriptor carrying only an id.
    #[must_use]
    pub fn from_id(model_id: impl Into<Box<str>>) -> Self {
        Self {
            model_id: model_id.into(),
            model_arn: None,
            provider_name: None,
            output_modalities: Vec::new(),
        }
    }
}

/// Boundary contract for the foundation model registry.
pub trait ModelRegistryPort: Send + Sync {
    /// Fetch a model by id in a region.
    ///
    /// An unknown model fails with `preflight:model_not_found`; any other
    /// registry or transport failure keeps its own code.
    fn get_model(
        &self,
        ctx: &RequestContext,
        region: Box<str>,
        model_id: Box<str>,
    ) -> BoxFuture<'_, Result<ModelDescriptor>>;
}
