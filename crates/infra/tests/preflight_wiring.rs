//! End-to-end preflight wiring against mock registry and search servers.

use embed_preflight_app::CheckName;
use embed_preflight_config::ConfigKey;
use embed_preflight_infra::{run_get_collection, run_model_check, run_preflight_with_env};
use embed_preflight_shared::{ErrorCategory, ErrorCode, ErrorEnvelope, RequestContext, Result};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_ID: &str = "amazon.titan-embed-text-v1";

struct Scratch {
    root: PathBuf,
}

impl Scratch {
    fn new(name: &str) -> Result<Self> {
        let root = std::env::temp_dir().join(format!(
            "embed_preflight_infra_{name}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("data")).map_err(ErrorEnvelope::from)?;
        fs::create_dir_all(root.join("db")).map_err(ErrorEnvelope::from)?;
        Ok(Self { root })
    }

    fn path(&self, relative: &str) -> String {
        self.root.join(relative).to_string_lossy().into_owned()
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

async fn mount_model(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/foundation-models/{MODEL_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "modelDetails": {
                "modelId": MODEL_ID,
                "providerName": "Amazon",
                "outputModalities": ["EMBEDDING"]
            }
        })))
        .mount(server)
        .await;
}

async fn mount_indices(server: &MockServer, names: &[&str]) {
    let body: Vec<_> = names.iter().map(|name| json!({ "index": name })).collect();
    Mock::given(method("GET"))
        .and(path("/_cat/indices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn env(server: &MockServer, scratch: &Scratch) -> BTreeMap<String, String> {
    [
        ("REGION", "us-east-1".to_string()),
        ("BEDROCK_EMBEDDING_MODEL_ID", MODEL_ID.to_string()),
        ("PREFLIGHT_REGISTRY_BASE_URL", server.uri()),
        ("OPEN_SEARCH_HOSTNAME", server.uri()),
        ("OPEN_SEARCH_SERVERLESS_COLLECTION_NAME", "docs".to_string()),
        ("DATA_DIRECTORY", scratch.path("data")),
        ("INTERNAL_DB", scratch.path("db/state.sqlite")),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

#[tokio::test]
async fn all_checks_pass_against_live_endpoints() -> Result<()> {
    let scratch = Scratch::new("pass")?;
    let server = MockServer::start().await;
    mount_model(&server).await;
    mount_indices(&server, &["docs", "other"]).await;

    let outcome =
        run_preflight_with_env(&RequestContext::new_run(), &env(&server, &scratch), None, None)
            .await?;

    assert!(outcome.is_success(), "unexpected failure: {:?}", outcome.error);
    assert_eq!(outcome.checks.len(), CheckName::ALL.len());
    Ok(())
}

#[tokio::test]
async fn missing_collection_fails_the_last_check() -> Result<()> {
    let scratch = Scratch::new("missing_collection")?;
    let server = MockServer::start().await;
    mount_model(&server).await;
    mount_indices(&server, &["other"]).await;

    let outcome =
        run_preflight_with_env(&RequestContext::new_run(), &env(&server, &scratch), None, None)
            .await?;

    assert_eq!(
        outcome.failed_check().map(|result| result.check),
        Some(CheckName::Collection)
    );
    let error = outcome.error.as_ref();
    assert_eq!(
        error.map(|error| error.code.clone()),
        Some(ErrorCode::collection_not_found())
    );
    assert_eq!(
        error.map(ErrorEnvelope::category),
        Some(ErrorCategory::DependencyNotFound)
    );
    Ok(())
}

#[tokio::test]
async fn pipeline_settings_do_not_affect_the_outcome() -> Result<()> {
    let scratch = Scratch::new("pipeline_settings")?;
    let server = MockServer::start().await;
    mount_model(&server).await;
    mount_indices(&server, &["docs"]).await;

    let mut vars = env(&server, &scratch);
    for (key, value) in [
        ("SCANNER_INTERVAL", "5m"),
        ("TEXT_SPLITTER_CHUNK_SIZE", "100"),
        ("TEXT_SPLITTER_CHUNK_OVERLAP", "200"),
        ("EMBEDDING_CONCURRENCY", "lots"),
    ] {
        vars.insert(key.to_string(), value.to_string());
    }
    let outcome = run_preflight_with_env(&RequestContext::new_run(), &vars, None, None).await?;

    assert!(outcome.is_success(), "unexpected failure: {:?}", outcome.error);
    assert_eq!(outcome.checks.len(), CheckName::ALL.len());
    Ok(())
}

#[tokio::test]
async fn env_override_redirects_the_collection() -> Result<()> {
    let scratch = Scratch::new("override")?;
    let server = MockServer::start().await;
    mount_model(&server).await;
    mount_indices(&server, &["docs-staging"]).await;

    let mut vars = env(&server, &scratch);
    vars.insert(
        "ENV_OPEN_SEARCH_SERVERLESS_COLLECTION_NAME".to_string(),
        "docs-staging".to_string(),
    );
    let outcome = run_preflight_with_env(&RequestContext::new_run(), &vars, None, None).await?;

    assert!(outcome.is_success(), "unexpected failure: {:?}", outcome.error);
    assert_eq!(
        outcome.effective.value(ConfigKey::CollectionName),
        Some("docs-staging")
    );
    Ok(())
}

#[tokio::test]
async fn model_check_reports_unknown_model() -> Result<()> {
    let scratch = Scratch::new("model_check")?;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let error = run_model_check(&RequestContext::new_run(), &env(&server, &scratch), None)
        .await
        .err();

    assert_eq!(
        error.map(|error| error.code),
        Some(ErrorCode::model_not_found())
    );
    Ok(())
}

#[tokio::test]
async fn get_collection_defaults_to_configured_name() -> Result<()> {
    let scratch = Scratch::new("get_collection")?;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/docs/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": {
                "total": { "value": 1, "relation": "eq" },
                "hits": [{ "_index": "docs", "_id": "a", "_source": { "title": "A" } }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = run_get_collection(
        &RequestContext::new_run(),
        &env(&server, &scratch),
        None,
        None,
        None,
    )
    .await?;

    assert_eq!(records.len(), 1);
    assert_eq!(&*records[0].id, "a");
    Ok(())
}
