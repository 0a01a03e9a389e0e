//! CLI integration tests.

use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_ID: &str = "amazon.titan-embed-text-v1";
const UNREACHABLE: &str = "http://127.0.0.1:1";

struct Scratch {
    root: PathBuf,
}

impl Scratch {
    fn new(name: &str) -> std::io::Result<Self> {
        let root = std::env::temp_dir().join(format!(
            "embed_preflight_cli_{name}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("data"))?;
        fs::create_dir_all(root.join("db"))?;
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

fn base_env(scratch: &Scratch, registry: &str, search: &str) -> Vec<(&'static str, String)> {
    vec![
        ("REGION", "us-east-1".to_string()),
        ("BEDROCK_EMBEDDING_MODEL_ID", MODEL_ID.to_string()),
        ("PREFLIGHT_REGISTRY_BASE_URL", registry.to_string()),
        ("OPEN_SEARCH_HOSTNAME", search.to_string()),
        ("OPEN_SEARCH_SERVERLESS_COLLECTION_NAME", "docs".to_string()),
        ("DATA_DIRECTORY", scratch.path("data")),
        ("INTERNAL_DB", scratch.path("db/state.sqlite")),
    ]
}

fn run_cli(args: &[&str], env: &[(&str, String)]) -> std::io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_embed-preflight"));
    command.args(args).env_clear();
    for (key, value) in env {
        command.env(key, value);
    }
    command.output()
}

async fn mock_endpoints(indices: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/foundation-models/{MODEL_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "modelDetails": { "modelId": MODEL_ID, "outputModalities": ["EMBEDDING"] }
        })))
        .mount(&server)
        .await;
    let body: Vec<_> = indices.iter().map(|name| json!({ "index": name })).collect();
    Mock::given(method("GET"))
        .and(path("/_cat/indices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

#[test]
fn cli_version_runs() -> std::io::Result<()> {
    let output = run_cli(&["--version"], &[])?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.starts_with("embed-preflight "));
    Ok(())
}

#[test]
fn config_show_redacts_secrets() -> std::io::Result<()> {
    let env = [
        ("REGION", "us-east-1".to_string()),
        ("OPENSEARCH_USERNAME", "admin".to_string()),
        ("OPENSEARCH_PASSWORD", "hunter2".to_string()), // pragma: allowlist secret
        ("ENV_REGION", "eu-west-1".to_string()),
    ];
    let output = run_cli(&["config", "show", "--output", "json"], &env)?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "config show failed: {stdout}");
    assert!(!stdout.contains("hunter2"));
    assert!(stdout.contains("[REDACTED]"));
    assert!(stdout.contains("eu-west-1"));
    Ok(())
}

#[test]
fn invalid_env_value_exits_with_configuration_code() -> std::io::Result<()> {
    let env = [("PREFLIGHT_SEARCH_TIMEOUT_MS", "soon".to_string())];
    let output = run_cli(&["config", "show"], &env)?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout.contains("status: error"));
    assert!(stdout.contains("config:invalid_env_int"));
    Ok(())
}

#[test]
fn validate_fails_before_network_when_data_directory_is_a_file() -> std::io::Result<()> {
    let scratch = Scratch::new("data_file")?;
    let file = scratch.path("data.txt");
    fs::write(&file, "not a directory")?;
    let mut env = base_env(&scratch, UNREACHABLE, UNREACHABLE);
    env.retain(|(key, _)| *key != "DATA_DIRECTORY");
    env.push(("DATA_DIRECTORY", file));

    let output = run_cli(&["validate"], &env)?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(2), "stdout: {stdout}");
    assert!(stdout.contains("fail data_directory"));
    assert!(stdout.contains("preflight:not_a_directory"));
    assert!(!stdout.contains("embedding_model"));
    Ok(())
}

#[test]
fn validate_reports_missing_region() -> std::io::Result<()> {
    let scratch = Scratch::new("no_region")?;
    let mut env = base_env(&scratch, UNREACHABLE, UNREACHABLE);
    env.retain(|(key, _)| *key != "REGION");

    let output = run_cli(&["validate", "--output", "json"], &env)?;
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error"]["code"], "preflight:missing_config");
    assert_eq!(payload["error"]["metadata"]["envVar"], "REGION");
    Ok(())
}

#[test]
fn unreachable_search_endpoint_exits_with_transport_code() -> std::io::Result<()> {
    let scratch = Scratch::new("unreachable")?;
    let env = base_env(&scratch, UNREACHABLE, UNREACHABLE);

    let output = run_cli(&["collections", "list"], &env)?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(5), "stdout: {stdout}");
    assert!(stdout.contains(UNREACHABLE));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn validate_succeeds_when_everything_is_present() -> std::io::Result<()> {
    let scratch = Scratch::new("scenario_a")?;
    let server = mock_endpoints(&["docs", "other"]).await;
    let env = base_env(&scratch, &server.uri(), &server.uri());

    let output = run_cli(&["validate"], &env)?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "validate failed: {stdout}{stderr}");
    assert!(stdout.contains("status: ok"));
    assert!(stderr.contains("Collection docs in region us-east-1 found successfully."));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn validate_fails_when_collection_is_missing() -> std::io::Result<()> {
    let scratch = Scratch::new("scenario_b")?;
    let server = mock_endpoints(&["other"]).await;
    let env = base_env(&scratch, &server.uri(), &server.uri());

    let output = run_cli(&["validate", "--output", "json"], &env)?;
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    assert_eq!(output.status.code(), Some(4));
    assert_eq!(payload["error"]["code"], "preflight:collection_not_found");
    assert_eq!(
        payload["error"]["message"],
        "Unable to find collection docs in region us-east-1"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn model_check_reports_unknown_model() -> std::io::Result<()> {
    let scratch = Scratch::new("model_check")?;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let env = base_env(&scratch, &server.uri(), UNREACHABLE);

    let output = run_cli(&["model", "check"], &env)?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(4), "stdout: {stdout}");
    assert!(stdout.contains(&format!("Embedding model {MODEL_ID} not found in region us-east-1")));
    Ok(())
}
