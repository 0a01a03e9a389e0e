//! Model existence check.

use embed_preflight_ports::{ModelDescriptor, ModelRegistryPort};
use embed_preflight_shared::{RequestContext, Result};

/// Model to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCheckInput {
    /// Region to query.
    pub region: Box<str>,
    /// Foundation model id.
    pub model_id: Box<str>,
}

/// Confirm that a model is retrievable in a region.
///
/// Inputs are passed through as-is; the registry rejects malformed ids. Any
/// failure is reported under a message naming the model and region, and the
/// registry's own message is kept as `cause`.
pub async fn check_model_exists(
    ctx: &RequestContext,
    registry: &dyn ModelRegistryPort,
    input: ModelCheckInput,
) -> Result<ModelDescriptor> {
    let ModelCheckInput { region, model_id } = input;
    registry
        .get_model(ctx, region.clone(), model_id.clone())
        .await
        .map_err(|error| {
            error
                .with_context(format!(
                    "Embedding model {model_id} not found in region {region}"
                ))
                .with_metadata("modelId", &*model_id)
                .with_metadata("region", &*region)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use embed_preflight_adapters::fixed::FixedModelRegistry;
    use embed_preflight_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

    fn input(region: &str, model_id: &str) -> ModelCheckInput {
        ModelCheckInput {
            region: region.into(),
            model_id: model_id.into(),
        }
    }

    #[tokio::test]
    async fn known_model_passes() -> Result<()> {
        let registry = FixedModelRegistry::new().with_model("us-east-1", "amazon.titan-embed-text-v1");
        let model = check_model_exists(
            &RequestContext::new_run(),
            &registry,
            input("us-east-1", "amazon.titan-embed-text-v1"),
        )
        .await?;
        assert_eq!(&*model.model_id, "amazon.titan-embed-text-v1");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_model_names_model_and_region() {
        let registry = FixedModelRegistry::new();
        let error = check_model_exists(
            &RequestContext::new_run(),
            &registry,
            input("us-east-1", "amazon.nope"),
        )
        .await
        .err();

        assert!(matches!(
            error,
            Some(ref envelope) if envelope.code == ErrorCode::model_not_found()
                && envelope.message == "Embedding model amazon.nope not found in region us-east-1"
                && envelope.metadata.contains_key("cause")
        ));
    }

    #[tokio::test]
    async fn transport_failure_keeps_its_code() {
        let registry = FixedModelRegistry::failing(ErrorEnvelope::unexpected(
            ErrorCode::io(),
            "connection refused",
            ErrorClass::Retriable,
        ));
        let error = check_model_exists(
            &RequestContext::new_run(),
            &registry,
            input("us-east-1", "amazon.titan-embed-text-v1"),
        )
        .await
        .err();

        assert!(matches!(
            error,
            Some(ref envelope) if envelope.code == ErrorCode::io()
                && envelope.metadata.get("cause").map(String::as_str) == Some("connection refused")
        ));
        assert_eq!(registry.calls(), 1);
    }
}
