//! OpenSearch-compatible search service adapter.

use crate::http::{build_client, map_decode_error, map_reqwest_error, status_error};
use embed_preflight_config::EffectiveConfig;
use embed_preflight_ports::{BoxFuture, CollectionRecord, SearchCredentials, SearchServicePort};
use embed_preflight_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result, SecretString};
use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};

const NAMESPACE: &str = "search";
const LABEL: &str = "search service";

/// Search adapter configuration.
#[derive(Debug, Clone, Copy)]
pub struct OpenSearchConfig {
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl OpenSearchConfig {
    /// Build from the effective pipeline config.
    #[must_use]
    pub fn from_effective_config(config: &EffectiveConfig) -> Self {
        Self {
            timeout_ms: config.search.timeout_ms,
        }
    }
}

/// Normalize a search hostname into a base URL.
///
/// A missing scheme defaults to `https://`; trailing slashes are dropped.
pub fn normalize_endpoint(hostname: &str) -> Result<Box<str>> {
    let trimmed = hostname.trim();
    if trimmed.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "search hostname is required",
        ));
    }

    let mut processed = trimmed.to_owned();
    if !processed.starts_with("http://") && !processed.starts_with("https://") {
        processed = format!("https://{processed}");
    }
    let trimmed_len = processed.trim_end_matches('/').len();
    processed.truncate(trimmed_len);
    Ok(processed.into_boxed_str())
}

/// Search service client speaking the OpenSearch REST API.
///
/// Each call makes a single request; nothing is retried.
pub struct OpenSearchService {
    client: reqwest::Client,
}

impl OpenSearchService {
    /// Create a new search adapter.
    pub fn new(config: OpenSearchConfig) -> Result<Self> {
        let client = build_client(NAMESPACE, config.timeout_ms, HeaderMap::new())?;
        Ok(Self { client })
    }

    async fn cat_indices(
        &self,
        ctx: &RequestContext,
        endpoint: &str,
        credentials: &SearchCredentials,
    ) -> Result<Vec<Box<str>>> {
        let mut url = endpoint_url(endpoint, &["_cat", "indices"])?;
        url.set_query(Some("format=json"));
        tracing::debug!(correlation_id = %ctx.correlation_id(), %url, "listing indices");

        let request = with_credentials(self.client.get(url), credentials);
        let (status, payload) = send(request).await?;
        if !status.is_success() {
            return Err(map_search_http_error(status, &payload, None));
        }

        let entries: Vec<CatIndexEntry> = serde_json::from_slice(&payload)
            .map_err(|error| map_decode_error(NAMESPACE, LABEL, &error))?;
        Ok(entries
            .into_iter()
            .map(|entry| entry.index.into_boxed_str())
            .collect())
    }

    async fn match_all(
        &self,
        ctx: &RequestContext,
        endpoint: &str,
        index: &str,
        credentials: &SearchCredentials,
    ) -> Result<Vec<CollectionRecord>> {
        let url = endpoint_url(endpoint, &[index, "_search"])?;
        tracing::debug!(correlation_id = %ctx.correlation_id(), %url, index, "searching collection");

        // No size: the service default page (10 hits) is returned.
        let body = json!({ "query": { "match_all": {} } });
        let request = with_credentials(self.client.post(url).json(&body), credentials);
        let (status, payload) = send(request).await?;
        if !status.is_success() {
            return Err(map_search_http_error(status, &payload, Some(index)));
        }

        let parsed: SearchResponse = serde_json::from_slice(&payload)
            .map_err(|error| map_decode_error(NAMESPACE, LABEL, &error))?;
        Ok(parsed.into_records(index))
    }
}

impl SearchServicePort for OpenSearchService {
    fn list_indices(
        &self,
        ctx: &RequestContext,
        endpoint: Box<str>,
        credentials: SearchCredentials,
    ) -> BoxFuture<'_, Result<Vec<Box<str>>>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.cat_indices(&ctx, &endpoint, &credentials).await })
    }

    fn search_all(
        &self,
        ctx: &RequestContext,
        endpoint: Box<str>,
        index: Box<str>,
        credentials: SearchCredentials,
    ) -> BoxFuture<'_, Result<Vec<CollectionRecord>>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.match_all(&ctx, &endpoint, &index, &credentials).await })
    }
}

fn endpoint_url(endpoint: &str, segments: &[&str]) -> Result<Url> {
    let base = normalize_endpoint(endpoint)?;
    let mut url = Url::parse(&base).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!("invalid search endpoint: {error}"),
        )
        .with_metadata("endpoint", endpoint)
    })?;
    url.path_segments_mut()
        .map_err(|()| {
            ErrorEnvelope::expected(ErrorCode::invalid_input(), "search endpoint cannot be a base")
                .with_metadata("endpoint", endpoint)
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn with_credentials(request: RequestBuilder, credentials: &SearchCredentials) -> RequestBuilder {
    match credentials.username.as_deref() {
        Some(username) => request.basic_auth(
            username,
            credentials.password.as_ref().map(SecretString::expose),
        ),
        None => request,
    }
}

async fn send(request: RequestBuilder) -> Result<(StatusCode, Vec<u8>)> {
    let response = request
        .send()
        .await
        .map_err(|error| map_reqwest_error(NAMESPACE, LABEL, &error))?;
    let status = response.status();
    let payload = response
        .bytes()
        .await
        .map_err(|error| map_reqwest_error(NAMESPACE, LABEL, &error))?;
    Ok((status, payload.to_vec()))
}

#[derive(Debug, Deserialize)]
struct CatIndexEntry {
    index: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Option<SearchHits>,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

impl TotalHits {
    const fn value(&self) -> u64 {
        match self {
            Self::Count(value) | Self::Object { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_index")]
    index: Option<String>,
    #[serde(rename = "_source", default)]
    source: Value,
}

impl SearchResponse {
    fn into_records(self, requested_index: &str) -> Vec<CollectionRecord> {
        let Some(hits) = self.hits else {
            return Vec::new();
        };
        if hits.total.as_ref().is_some_and(|total| total.value() == 0) {
            return Vec::new();
        }
        hits.hits
            .into_iter()
            .map(|hit| CollectionRecord {
                id: hit.id.into_boxed_str(),
                index: hit
                    .index
                    .map_or_else(|| Box::from(requested_index), String::into_boxed_str),
                source: hit.source,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct SearchErrorResponse {
    error: SearchErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchErrorDetail {
    Structured {
        #[serde(rename = "type")]
        error_type: Option<String>,
        reason: Option<String>,
    },
    Plain(String),
}

fn map_search_http_error(status: StatusCode, payload: &[u8], index: Option<&str>) -> ErrorEnvelope {
    let (error_type, reason) = match serde_json::from_slice::<SearchErrorResponse>(payload) {
        Ok(SearchErrorResponse {
            error: SearchErrorDetail::Structured { error_type, reason },
        }) => (error_type, reason),
        Ok(SearchErrorResponse {
            error: SearchErrorDetail::Plain(reason),
        }) => (None, Some(reason)),
        Err(_) => (None, None),
    };
    let message =
        reason.unwrap_or_else(|| format!("search service returned status {}", status.as_u16()));

    let mut envelope = match index {
        Some(index) if status == StatusCode::NOT_FOUND => {
            ErrorEnvelope::expected(ErrorCode::collection_not_found(), message)
                .with_metadata("status", "404")
                .with_metadata("collection", index)
        },
        _ => status_error(NAMESPACE, status, message),
    };
    if let Some(error_type) = error_type {
        envelope = envelope.with_metadata("error_type", error_type);
    }
    envelope
}
