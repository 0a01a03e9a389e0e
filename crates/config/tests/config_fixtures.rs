//! Integration tests for parsing pipeline config fixtures.

use embed_preflight_config::{
    CURRENT_CONFIG_VERSION, PipelineEnv, load_pipeline_config_from_path,
    parse_pipeline_config_json, parse_pipeline_config_toml, to_pretty_json,
};
use embed_preflight_shared::{ErrorCode, REDACTED, SecretString};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

fn read_fixture(relative: &str) -> Result<String, Box<dyn Error>> {
    Ok(fs::read_to_string(fixture_path(relative))?)
}

#[test]
fn parses_valid_toml_fixture_and_normalizes() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/pipeline-config.valid.toml")?;
    let config = parse_pipeline_config_toml(&contents)?;

    assert_eq!(config.version, CURRENT_CONFIG_VERSION);
    assert_eq!(
        config.region.as_deref(),
        Some("us-east-1"),
        "region should be trimmed"
    );
    assert_eq!(config.profile.as_deref(), Some("staging"));
    assert_eq!(config.search.timeout_ms, 20_000);
    assert_eq!(config.embedding.registry_timeout_ms, 15_000);
    assert_eq!(config.embedding.output_vector_size.as_deref(), Some("1536"));
    assert_eq!(config.pipeline.embedding_concurrency.as_deref(), Some("8"));
    assert_eq!(
        config.search.password.as_ref().map(SecretString::expose),
        Some("fixture-password")
    );
    Ok(())
}

#[test]
fn parses_valid_json_fixture() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/pipeline-config.valid.json")?;
    let config = parse_pipeline_config_json(&contents)?;

    assert_eq!(config.region.as_deref(), Some("eu-west-1"));
    assert_eq!(
        config.embedding.registry_base_url.as_deref(),
        Some("http://localhost:4566")
    );
    assert_eq!(config.storage.internal_db.as_deref(), Some("internal.db"));
    Ok(())
}

#[test]
fn rejects_invalid_fixtures_with_stable_codes() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/pipeline-config.invalid_timeout.json")?;
    let error = parse_pipeline_config_json(&contents).err();
    assert!(matches!(
        error,
        Some(ref envelope) if envelope.code == ErrorCode::new("config", "invalid_timeout")
    ));

    let contents = read_fixture("config/pipeline-config.unknown_field.json")?;
    let error = parse_pipeline_config_json(&contents).err();
    assert!(matches!(
        error,
        Some(ref envelope) if envelope.code == ErrorCode::new("config", "invalid_json")
    ));
    Ok(())
}

#[test]
fn loads_toml_by_extension_and_redacts_secrets_in_json() -> Result<(), Box<dyn Error>> {
    let path = fixture_path("config/pipeline-config.valid.toml");
    let config = load_pipeline_config_from_path(Some(&path), &PipelineEnv::default())?;

    let json = to_pretty_json(&config)?;
    assert!(!json.contains("fixture-password"));
    assert!(json.contains(REDACTED));
    assert!(json.contains("\"collectionName\": \"docs\""));
    Ok(())
}
