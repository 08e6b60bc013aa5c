use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use study_material_builder::external::{ChatMessage, ExternalError, HttpLLMClient, LLMClient, LLMConfig, LLMEngine};
use study_material_builder::Interpretation;

fn config(server: &MockServer) -> LLMConfig {
    LLMConfig {
        endpoint: server.uri(),
        model: "test-model".to_string(),
        timeout_secs: 5,
        ..LLMConfig::default()
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
}

fn messages() -> Vec<ChatMessage> {
    vec![ChatMessage::system("You teach."), ChatMessage::user("Explain ATP")]
}

#[tokio::test]
async fn test_completion_content_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"model": "test-model", "max_tokens": 300})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ATP stores energy.")))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpLLMClient::new(&config(&server)).unwrap();
    let text = client.complete(messages(), 300, 0.7).await.unwrap();
    assert_eq!(text, "ATP stores energy.");
}

#[tokio::test]
async fn test_api_key_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let config = LLMConfig {
        api_key: Some("secret-key".to_string()),
        ..config(&server)
    };
    let client = HttpLLMClient::new(&config).unwrap();
    assert_eq!(client.complete(messages(), 100, 0.7).await.unwrap(), "ok");
}

#[tokio::test]
async fn test_error_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = HttpLLMClient::new(&config(&server)).unwrap();
    let err = client.complete(messages(), 100, 0.7).await.unwrap_err();
    match err {
        ExternalError::ApiError { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_choices_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = HttpLLMClient::new(&config(&server)).unwrap();
    let err = client.complete(messages(), 100, 0.7).await.unwrap_err();
    assert!(matches!(err, ExternalError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_engine_interprets_http_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("Here it is:\n```json\n{\"topics\": [\"ATP\"]}\n```")),
        )
        .mount(&server)
        .await;

    let engine = LLMEngine::from_config(config(&server)).unwrap();
    let reply = engine.generate_json("sys", "Extract topics", None).await;
    assert_eq!(reply, Interpretation::Parsed(json!({"topics": ["ATP"]})));
}

#[tokio::test]
async fn test_engine_reports_server_errors_as_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = Arc::new(HttpLLMClient::new(&config(&server)).unwrap());
    let engine = LLMEngine::new(client, config(&server));
    let reply = engine.generate_json("sys", "Extract topics", None).await;
    assert!(!reply.is_success());
}
