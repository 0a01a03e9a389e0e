//! Bedrock foundation model registry adapter.

use crate::http::{build_client, map_decode_error, map_reqwest_error, status_error};
use embed_preflight_config::EffectiveConfig;
use embed_preflight_ports::{BoxFuture, ModelDescriptor, ModelRegistryPort};
use embed_preflight_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result, SecretString};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

const NAMESPACE: &str = "registry";
const LABEL: &str = "model registry";

/// Bedrock registry adapter configuration.
#[derive(Debug, Clone)]
pub struct BedrockRegistryConfig {
    /// Base URL override (defaults to `https://bedrock.{region}.amazonaws.com`).
    pub base_url: Option<Box<str>>,
    /// Optional bearer token sent as `Authorization: Bearer`.
    pub token: Option<SecretString>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl BedrockRegistryConfig {
    /// Build from the effective pipeline config.
    #[must_use]
    pub fn from_effective_config(config: &EffectiveConfig) -> Self {
        Self {
            base_url: config.embedding.registry_base_url.clone(),
            token: config.embedding.registry_token.clone(),
            timeout_ms: config.embedding.registry_timeout_ms,
        }
    }
}

/// Model registry backed by the Bedrock control-plane `GetFoundationModel` call.
pub struct BedrockModelRegistry {
    client: reqwest::Client,
    base_url: Option<Box<str>>,
}

impl BedrockModelRegistry {
    /// Create a new registry adapter.
    pub fn new(config: &BedrockRegistryConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let token = config
            .token
            .as_ref()
            .map(SecretString::expose)
            .map(str::trim)
            .filter(|token| !token.is_empty());
        if let Some(token) = token {
            let mut auth_header =
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                    ErrorEnvelope::expected(
                        ErrorCode::invalid_input(),
                        "registry token contains invalid header characters",
                    )
                })?;
            auth_header.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_header);
        }

        let client = build_client(NAMESPACE, config.timeout_ms, headers)?;
        let base_url = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(Box::from);

        Ok(Self { client, base_url })
    }

    fn model_url(&self, region: &str, model_id: &str) -> Result<Url> {
        let base = self.base_url.as_deref().map_or_else(
            || format!("https://bedrock.{region}.amazonaws.com"),
            str::to_owned,
        );
        let mut url = Url::parse(&base).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                format!("invalid model registry url: {error}"),
            )
            .with_metadata("region", region)
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                ErrorEnvelope::expected(
                    ErrorCode::invalid_input(),
                    "model registry url cannot be a base",
                )
            })?
            .pop_if_empty()
            .push("foundation-models")
            .push(model_id);
        Ok(url)
    }

    async fn fetch(
        &self,
        ctx: &RequestContext,
        region: &str,
        model_id: &str,
    ) -> Result<ModelDescriptor> {
        let url = self.model_url(region, model_id)?;
        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            %url,
            model_id,
            region,
            "fetching foundation model"
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| map_reqwest_error(NAMESPACE, LABEL, &error))?;
        let status = response.status();
        let payload = response
            .bytes()
            .await
            .map_err(|error| map_reqwest_error(NAMESPACE, LABEL, &error))?;

        if !status.is_success() {
            return Err(map_registry_http_error(status, &payload, model_id, region));
        }

        let parsed: GetFoundationModelResponse = serde_json::from_slice(&payload)
            .map_err(|error| map_decode_error(NAMESPACE, LABEL, &error))?;
        Ok(parsed.model_details.into_descriptor(model_id))
    }
}

impl ModelRegistryPort for BedrockModelRegistry {
    fn get_model(
        &self,
        ctx: &RequestContext,
        region: Box<str>,
        model_id: Box<str>,
    ) -> BoxFuture<'_, Result<ModelDescriptor>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.fetch(&ctx, &region, &model_id).await })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetFoundationModelResponse {
    model_details: FoundationModelDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoundationModelDetails {
    model_id: Option<String>,
    model_arn: Option<String>,
    provider_name: Option<String>,
    #[serde(default)]
    output_modalities: Vec<String>,
}

impl FoundationModelDetails {
    fn into_descriptor(self, requested_id: &str) -> ModelDescriptor {
        ModelDescriptor {
            model_id: self
                .model_id
                .map_or_else(|| Box::from(requested_id), String::into_boxed_str),
            model_arn: self.model_arn.map(String::into_boxed_str),
            provider_name: self.provider_name.map(String::into_boxed_str),
            output_modalities: self
                .output_modalities
                .into_iter()
                .map(String::into_boxed_str)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegistryErrorResponse {
    #[serde(alias = "Message")]
    message: Option<String>,
}

fn map_registry_http_error(
    status: StatusCode,
    payload: &[u8],
    model_id: &str,
    region: &str,
) -> ErrorEnvelope {
    let message = serde_json::from_slice::<RegistryErrorResponse>(payload)
        .ok()
        .and_then(|parsed| parsed.message)
        .unwrap_or_else(|| format!("model registry returned status {}", status.as_u16()));

    let envelope = if status == StatusCode::NOT_FOUND {
        ErrorEnvelope::expected(ErrorCode::model_not_found(), message).with_metadata("status", "404")
    } else {
        status_error(NAMESPACE, status, message)
    };
    envelope
        .with_metadata("modelId", model_id)
        .with_metadata("region", region)
}
