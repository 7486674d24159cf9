//! GitHub REST implementation of the forge contract

use crate::client::{CreatedPullRequest, ForgeClient, PullRequestSpec};
use crate::{ForgeError, ForgeResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use patchwright_config::ForgeConfig;
use serde::Deserialize;

/// Renew tokens with this much lifetime left
const TOKEN_RENEWAL_MARGIN_MINUTES: i64 = 5;

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RepoResponse {
    default_branch: String,
}

#[derive(Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
}

/// Thin GitHub REST client
///
/// Installation tokens are cached in memory per installation id and renewed
/// on use when within the renewal margin of expiry.
pub struct GithubClient {
    client: reqwest::Client,
    api_url: String,
    app_token: String,
    tokens: DashMap<i64, CachedToken>,
}

impl GithubClient {
    /// Create a client from configuration
    ///
    /// # Errors
    /// Returns `ForgeError::Other` if the HTTP client cannot be built.
    pub fn new(config: &ForgeConfig) -> ForgeResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent("patchwright")
            .build()
            .map_err(|e| ForgeError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            app_token: config.app_token.clone(),
            tokens: DashMap::new(),
        })
    }

    async fn check_status(response: reqwest::Response) -> ForgeResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(ForgeError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl ForgeClient for GithubClient {
    async fn installation_token(&self, installation_id: i64) -> ForgeResult<String> {
        if self.app_token.is_empty() {
            return Err(ForgeError::Auth(
                "No forge app credential configured".to_string(),
            ));
        }

        // Reuse a cached token unless it's close to expiry
        if let Some(cached) = self.tokens.get(&installation_id) {
            let margin = Duration::minutes(TOKEN_RENEWAL_MARGIN_MINUTES);
            if cached.expires_at - Utc::now() > margin {
                return Ok(cached.token.clone());
            }
        }

        tracing::debug!(installation_id, "Minting installation token");
        let response = self
            .client
            .post(format!(
                "{}/app/installations/{installation_id}/access_tokens",
                self.api_url
            ))
            .bearer_auth(&self.app_token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| ForgeError::Other(format!("Malformed token response: {e}")))?;

        self.tokens.insert(
            installation_id,
            CachedToken {
                token: parsed.token.clone(),
                expires_at: parsed.expires_at,
            },
        );

        Ok(parsed.token)
    }

    async fn default_branch(&self, repo_full_name: &str, token: &str) -> ForgeResult<String> {
        let response = self
            .client
            .get(format!("{}/repos/{repo_full_name}", self.api_url))
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let parsed: RepoResponse = response
            .json()
            .await
            .map_err(|e| ForgeError::Other(format!("Malformed repo response: {e}")))?;
        Ok(parsed.default_branch)
    }

    async fn create_pull_request(
        &self,
        spec: &PullRequestSpec,
        token: &str,
    ) -> ForgeResult<CreatedPullRequest> {
        let body = serde_json::json!({
            "title": spec.title,
            "head": spec.head,
            "base": spec.base,
            "body": spec.body,
        });

        let response = self
            .client
            .post(format!("{}/repos/{}/pulls", self.api_url, spec.repo_full_name))
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let parsed: PullResponse = response
            .json()
            .await
            .map_err(|e| ForgeError::Other(format!("Malformed pull response: {e}")))?;

        Ok(CreatedPullRequest {
            number: parsed.number,
            url: parsed.html_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: &str) -> ForgeConfig {
        ForgeConfig {
            api_url: url.to_string(),
            app_token: "app-jwt".to_string(),
        }
    }

    #[tokio::test]
    async fn mints_and_caches_installation_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/app/installations/42/access_tokens"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "token": "ghs_fresh",
                "expires_at": (Utc::now() + Duration::hours(1)).to_rfc3339(),
            })))
            .expect(1) // Second call must come from the cache
            .mount(&server)
            .await;

        let client = GithubClient::new(&config(&server.uri())).unwrap();
        assert_eq!(client.installation_token(42).await.unwrap(), "ghs_fresh");
        assert_eq!(client.installation_token(42).await.unwrap(), "ghs_fresh");
    }

    #[tokio::test]
    async fn expiring_tokens_are_renewed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/app/installations/7/access_tokens"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "token": "ghs_short",
                "expires_at": (Utc::now() + Duration::minutes(1)).to_rfc3339(),
            })))
            .expect(2) // Near-expiry tokens are re-minted on use
            .mount(&server)
            .await;

        let client = GithubClient::new(&config(&server.uri())).unwrap();
        client.installation_token(7).await.unwrap();
        client.installation_token(7).await.unwrap();
    }

    #[tokio::test]
    async fn creates_pull_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/owner/repo/pulls"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "number": 5,
                "html_url": "https://github.com/owner/repo/pull/5",
            })))
            .mount(&server)
            .await;

        let client = GithubClient::new(&config(&server.uri())).unwrap();
        let pr = client
            .create_pull_request(
                &PullRequestSpec {
                    repo_full_name: "owner/repo".to_string(),
                    head: "feat/rename-x1y2z3".to_string(),
                    base: "main".to_string(),
                    title: "AI: Rename foo".to_string(),
                    body: "Renamed foo to bar".to_string(),
                },
                "ghs_token",
            )
            .await
            .unwrap();

        assert_eq!(pr.number, 5);
        assert_eq!(pr.url, "https://github.com/owner/repo/pull/5");
    }

    #[tokio::test]
    async fn missing_app_credential_is_an_auth_error() {
        let client = GithubClient::new(&ForgeConfig {
            api_url: "https://api.github.com".to_string(),
            app_token: String::new(),
        })
        .unwrap();

        assert!(matches!(
            client.installation_token(1).await,
            Err(ForgeError::Auth(_))
        ));
    }
}
