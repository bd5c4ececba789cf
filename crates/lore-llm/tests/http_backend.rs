#![cfg(feature = "http-llm")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the OpenAI-compatible HTTP generation backend,
//! run against a local wiremock server.

use lore_core::LoreError;
use lore_llm::{GenerationConfig, GenerationProvider, HttpGeneration};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> GenerationConfig {
    GenerationConfig {
        model_id: "test-model".to_string(),
        api_key: "test-key".to_string(),
        api_base_url: Some(server.uri()),
        temperature: 0.2,
        max_tokens: 128,
    }
}

#[tokio::test]
async fn invoke_returns_completion_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({ "model": "test-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "grounded answer" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpGeneration::new(config_for(&server));
    let answer = backend.invoke("question with context").await.unwrap();
    assert_eq!(answer, "grounded answer");
}

#[tokio::test]
async fn invoke_maps_api_error_to_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": { "message": "rate limited" }
        })))
        .mount(&server)
        .await;

    let backend = HttpGeneration::new(config_for(&server));
    let err = backend.invoke("p").await.unwrap_err();
    assert!(matches!(err, LoreError::Provider(_)));
    assert!(err.to_string().contains("429"));
}

#[tokio::test]
async fn invoke_rejects_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
        )
        .mount(&server)
        .await;

    let backend = HttpGeneration::new(config_for(&server));
    let err = backend.invoke("p").await.unwrap_err();
    assert!(matches!(err, LoreError::Provider(_)));
}
