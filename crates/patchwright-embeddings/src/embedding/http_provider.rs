//! Remote HTTP embedding provider

use crate::{EmbeddingError, EmbeddingProvider, EmbeddingResult};
use async_trait::async_trait;
use patchwright_config::EmbeddingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Embedding provider backed by a remote embeddings API
///
/// Speaks the common `{model, input}` / `{data: [{embedding}]}` wire shape.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl HttpEmbeddingProvider {
    /// Create a provider from configuration
    ///
    /// # Errors
    /// Returns `EmbeddingError::Config` if the HTTP client cannot be built.
    pub fn new(config: &EmbeddingConfig) -> EmbeddingResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| EmbeddingError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Provider(format!(
                "Embedding API returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Provider(format!("Malformed embedding response: {e}")))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::Provider("Empty embedding response".to_string()))?;

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::Provider(format!(
                "Expected dimension {}, got {}",
                self.dimension,
                embedding.len()
            )));
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(url: &str, dimension: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            api_url: format!("{url}/v1/embeddings"),
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            dimension,
            batch_size: 10,
            batch_delay_ms: 0,
            timeout_seconds: 5,
        }
    }

    #[tokio::test]
    async fn embeds_via_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.1, 0.2, 0.3]}]
            })))
            .mount(&server)
            .await;

        let provider = HttpEmbeddingProvider::new(&test_config(&server.uri(), 3)).unwrap();
        let embedding = provider.embed("fn main() {}").await.unwrap();

        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn rejects_dimension_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.1, 0.2]}]
            })))
            .mount(&server)
            .await;

        let provider = HttpEmbeddingProvider::new(&test_config(&server.uri(), 3)).unwrap();
        let result = provider.embed("text").await;

        assert!(matches!(result, Err(EmbeddingError::Provider(_))));
    }

    #[tokio::test]
    async fn surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let provider = HttpEmbeddingProvider::new(&test_config(&server.uri(), 3)).unwrap();
        let result = provider.embed("text").await;

        assert!(matches!(result, Err(EmbeddingError::Provider(_))));
    }
}
