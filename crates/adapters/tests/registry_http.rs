//! Model registry adapter tests against a mock server.

#[cfg(feature = "bedrock")]
mod bedrock {
    use embed_preflight_adapters::bedrock::{BedrockModelRegistry, BedrockRegistryConfig};
    use embed_preflight_ports::ModelRegistryPort;
    use embed_preflight_shared::{ErrorCode, RequestContext, Result, SecretString};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry(server: &MockServer, timeout_ms: u64) -> Result<BedrockModelRegistry> {
        BedrockModelRegistry::new(&BedrockRegistryConfig {
            base_url: Some(server.uri().into()),
            token: Some(SecretString::new("example")), // pragma: allowlist secret
            timeout_ms,
        })
    }

    #[tokio::test]
    async fn known_model_is_returned() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/foundation-models/amazon.titan-embed-text-v1"))
            .and(header("authorization", "Bearer example"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "modelDetails": {
                    "modelId": "amazon.titan-embed-text-v1",
                    "modelArn": "arn:aws:bedrock:us-east-1::foundation-model/amazon.titan-embed-text-v1",
                    "providerName": "Amazon",
                    "outputModalities": ["EMBEDDING"]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = registry(&server, 5_000)?
            .get_model(
                &RequestContext::new_run(),
                "us-east-1".into(),
                "amazon.titan-embed-text-v1".into(),
            )
            .await?;

        assert_eq!(&*model.model_id, "amazon.titan-embed-text-v1");
        assert_eq!(model.provider_name.as_deref(), Some("Amazon"));
        assert_eq!(model.output_modalities, vec![Box::<str>::from("EMBEDDING")]);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_model_is_model_not_found() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/foundation-models/amazon.unknown"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Could not resolve the foundation model from the provided model identifier."
            })))
            .mount(&server)
            .await;

        let error = registry(&server, 5_000)?
            .get_model(
                &RequestContext::new_run(),
                "us-east-1".into(),
                "amazon.unknown".into(),
            )
            .await
            .err();

        assert!(matches!(
            error,
            Some(ref envelope) if envelope.code == ErrorCode::model_not_found()
                && envelope.metadata.get("modelId").map(String::as_str) == Some("amazon.unknown")
        ));
        Ok(())
    }

    #[tokio::test]
    async fn slow_registry_times_out_once() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .expect(1)
            .mount(&server)
            .await;

        let error = registry(&server, 200)?
            .get_model(
                &RequestContext::new_run(),
                "us-east-1".into(),
                "amazon.titan-embed-text-v1".into(),
            )
            .await
            .err();

        assert!(matches!(
            error,
            Some(ref envelope) if envelope.code == ErrorCode::timeout()
        ));
        Ok(())
    }
}
