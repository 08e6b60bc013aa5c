use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::external::error::ExternalError;
use crate::interpreter::{interpret_json, Interpretation, InterpreterFailure};

const JSON_ONLY_SUFFIX: &str = "\n\nPlease respond with valid JSON only.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl LLMConfig {
    /// Get the chat completions URL for the configured endpoint
    pub fn get_url(&self) -> Result<String> {
        let base = if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")
        {
            self.endpoint.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", self.endpoint.trim_end_matches('/'))
        };
        let url = format!("{}/v1/chat/completions", base);

        // Validate the URL
        Url::parse(&url).map_err(|e| ExternalError::ConfigError(format!("Invalid URL: {}", e)))?;

        Ok(url)
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.mistral.ai".to_string(),
            api_key: None,
            model: "mistral-large-latest".to_string(),
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 2000,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The opaque completion capability every agent ultimately calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
        temperature: f32,
    ) -> std::result::Result<String, ExternalError>;
}

/// Client for OpenAI-compatible chat completion endpoints
pub struct HttpLLMClient {
    url: String,
    api_key: Option<String>,
    model: String,
    top_p: f32,
    client: Client,
}

impl HttpLLMClient {
    pub fn new(config: &LLMConfig) -> Result<Self> {
        let url = config.get_url()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| ExternalError::ConfigError(e.to_string()))?;

        Ok(Self {
            url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            top_p: config.top_p,
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[async_trait]
impl LLMClient for HttpLLMClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
        temperature: f32,
    ) -> std::result::Result<String, ExternalError> {
        let mut request = self.client.post(&self.url).json(&serde_json::json!({
            "model": &self.model,
            "messages": messages,
            "max_tokens": max_tokens,
            "temperature": temperature,
            "top_p": self.top_p,
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(model = %self.model, max_tokens, "sending chat completion request");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExternalError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ExternalError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ExternalError::MalformedResponse("no message content".to_string()))
    }
}

/// Wrapper around an [`LLMClient`] that applies the configured sampling
/// parameters and a hard deadline to every call.
pub struct LLMEngine {
    client: Arc<dyn LLMClient>,
    config: LLMConfig,
}

impl LLMEngine {
    pub fn new(client: Arc<dyn LLMClient>, config: LLMConfig) -> Self {
        Self { client, config }
    }

    /// Build an engine backed by the HTTP client
    pub fn from_config(config: LLMConfig) -> Result<Self> {
        let client = HttpLLMClient::new(&config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }

    /// Generate a plain-text completion
    pub async fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
        max_tokens: Option<u32>,
    ) -> std::result::Result<String, ExternalError> {
        let messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(prompt)];
        let max_tokens = max_tokens.unwrap_or(self.config.max_tokens);
        let deadline = Duration::from_secs(self.config.timeout_secs);

        match tokio::time::timeout(
            deadline,
            self.client
                .complete(messages, max_tokens, self.config.temperature),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ExternalError::Timeout(self.config.timeout_secs)),
        }
    }

    /// Generate a completion and interpret it as JSON. Transport failures
    /// and timeouts come back as [`Interpretation::Failed`].
    pub async fn generate_json(
        &self,
        system_prompt: &str,
        prompt: &str,
        max_tokens: Option<u32>,
    ) -> Interpretation {
        let prompt = format!("{}{}", prompt, JSON_ONLY_SUFFIX);
        match self.generate(system_prompt, &prompt, max_tokens).await {
            Ok(text) => interpret_json(&text),
            Err(e) => {
                warn!(error = %e, "LLM call failed");
                Interpretation::Failed(InterpreterFailure::new(e.to_string(), String::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate;
    use serde_json::json;

    fn test_config() -> LLMConfig {
        LLMConfig {
            endpoint: "http://localhost:8080".to_string(),
            timeout_secs: 1,
            ..LLMConfig::default()
        }
    }

    #[test]
    fn test_url_generation() {
        // Test with plain hostname
        let config = LLMConfig {
            endpoint: "localhost:11434".to_string(),
            ..LLMConfig::default()
        };
        assert_eq!(
            config.get_url().unwrap(),
            "http://localhost:11434/v1/chat/completions"
        );

        // Test with https:// prefix and trailing slash
        let config = LLMConfig {
            endpoint: "https://example.com/".to_string(),
            ..LLMConfig::default()
        };
        assert_eq!(
            config.get_url().unwrap(),
            "https://example.com/v1/chat/completions"
        );

        // Test with an unparseable host
        let config = LLMConfig {
            endpoint: "http://exa mple.com".to_string(),
            ..LLMConfig::default()
        };
        assert!(config.get_url().is_err());
    }

    #[tokio::test]
    async fn test_generate_sends_system_and_user_messages() {
        let mut mock = MockLLMClient::new();
        mock.expect_complete()
            .with(
                predicate::function(|messages: &Vec<ChatMessage>| {
                    messages.len() == 2
                        && messages[0].role == Role::System
                        && messages[1].content == "Explain Rust"
                }),
                predicate::eq(2000),
                predicate::always(),
            )
            .times(1)
            .returning(|_, _, _| Ok("Rust is a systems language.".to_string()));

        let engine = LLMEngine::new(Arc::new(mock), test_config());
        let text = engine.generate("You teach.", "Explain Rust", None).await.unwrap();
        assert_eq!(text, "Rust is a systems language.");
    }

    #[tokio::test]
    async fn test_generate_json_asks_for_json() {
        let mut mock = MockLLMClient::new();
        mock.expect_complete()
            .with(
                predicate::function(|messages: &Vec<ChatMessage>| {
                    messages[1].content.ends_with("Please respond with valid JSON only.")
                }),
                predicate::always(),
                predicate::always(),
            )
            .times(1)
            .returning(|_, _, _| Ok("Sure! {\"topics\": [\"Cells\"]}".to_string()));

        let engine = LLMEngine::new(Arc::new(mock), test_config());
        let result = engine.generate_json("sys", "Extract topics", None).await;
        assert_eq!(result, Interpretation::Parsed(json!({"topics": ["Cells"]})));
    }

    #[tokio::test]
    async fn test_transport_error_becomes_failure() {
        let mut mock = MockLLMClient::new();
        mock.expect_complete().times(1).returning(|_, _, _| {
            Err(ExternalError::ApiError {
                status: 503,
                message: "overloaded".to_string(),
            })
        });

        let engine = LLMEngine::new(Arc::new(mock), test_config());
        let result = engine.generate_json("sys", "prompt", None).await;
        match result {
            Interpretation::Failed(failure) => assert!(failure.error.contains("503")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    struct StalledClient;

    #[async_trait]
    impl LLMClient for StalledClient {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _max_tokens: u32,
            _temperature: f32,
        ) -> std::result::Result<String, ExternalError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("{}".to_string())
        }
    }

    #[tokio::test]
    async fn test_timeout_becomes_failure() {
        let engine = LLMEngine::new(Arc::new(StalledClient), test_config());
        let result = engine.generate("sys", "prompt", None).await;
        assert!(matches!(result, Err(ExternalError::Timeout(1))));
    }
}
