//! LLM provider trait and implementations

use crate::{LlmError, LlmResult};
use async_trait::async_trait;
use patchwright_config::LlmConfig;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Optional system framing
    pub system: Option<String>,
    /// The user prompt
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
        }
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Trait for LLM inference providers
///
/// Implement this trait to add support for different LLM backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// The name of this provider (for logging/identification)
    fn name(&self) -> &str;

    /// Perform one completion
    async fn complete(&self, request: CompletionRequest) -> LlmResult<String>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Chat-completions HTTP provider
pub struct HttpLlmProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpLlmProvider {
    /// Create a provider from configuration
    ///
    /// # Errors
    /// Returns `LlmError::Config` if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    fn name(&self) -> &str {
        "http-chat"
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider(format!(
                "LLM API returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Provider(format!("Malformed completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Provider("Empty completion response".to_string()))
    }
}

/// Scriptable mock provider for tests
///
/// Responses are returned in FIFO order; when the queue runs dry the mock
/// errors, which surfaces tests that consume more completions than scripted.
#[derive(Default)]
pub struct MockLlm {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a scripted response
    pub fn push_response(&self, response: impl Into<String>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response.into());
        }
    }

    /// Every request seen so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        self.responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front())
            .ok_or_else(|| LlmError::Provider("mock response queue exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn http_provider_round_trips_chat_completions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "hello back"}}]
            })))
            .mount(&server)
            .await;

        let config = LlmConfig {
            api_url: format!("{}/v1/chat/completions", server.uri()),
            api_key: "key".to_string(),
            model: "test-model".to_string(),
            timeout_seconds: 5,
            max_iterations: 3,
        };
        let provider = HttpLlmProvider::new(&config).unwrap();

        let content = provider
            .complete(CompletionRequest::new("hello").with_system("be brief"))
            .await
            .unwrap();
        assert_eq!(content, "hello back");
    }

    #[tokio::test]
    async fn http_provider_surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let config = LlmConfig {
            api_url: server.uri(),
            api_key: "key".to_string(),
            model: "m".to_string(),
            timeout_seconds: 5,
            max_iterations: 3,
        };
        let provider = HttpLlmProvider::new(&config).unwrap();

        assert!(matches!(
            provider.complete(CompletionRequest::new("x")).await,
            Err(LlmError::Provider(_))
        ));
    }

    #[tokio::test]
    async fn mock_returns_scripted_responses_in_order() {
        let mock = MockLlm::new();
        mock.push_response("first");
        mock.push_response("second");

        assert_eq!(mock.complete(CompletionRequest::new("a")).await.unwrap(), "first");
        assert_eq!(mock.complete(CompletionRequest::new("b")).await.unwrap(), "second");
        assert!(mock.complete(CompletionRequest::new("c")).await.is_err());
        assert_eq!(mock.requests().len(), 3);
    }
}
