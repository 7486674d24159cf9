//! Mock forge for tests

use crate::client::{CreatedPullRequest, ForgeClient, PullRequestSpec};
use crate::ForgeResult;
use async_trait::async_trait;
use std::sync::Mutex;

/// In-memory forge double
///
/// Hands out a fixed token, reports a configurable default branch, and
/// records every pull request it's asked to open.
pub struct MockForge {
    default_branch: String,
    pulls: Mutex<Vec<PullRequestSpec>>,
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new("main")
    }
}

impl MockForge {
    pub fn new(default_branch: &str) -> Self {
        Self {
            default_branch: default_branch.to_string(),
            pulls: Mutex::new(Vec::new()),
        }
    }

    /// Pull requests opened so far
    pub fn created_pulls(&self) -> Vec<PullRequestSpec> {
        self.pulls
            .lock()
            .map(|pulls| pulls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ForgeClient for MockForge {
    async fn installation_token(&self, installation_id: i64) -> ForgeResult<String> {
        Ok(format!("ghs_mock_{installation_id}"))
    }

    async fn default_branch(&self, _repo_full_name: &str, _token: &str) -> ForgeResult<String> {
        Ok(self.default_branch.clone())
    }

    async fn create_pull_request(
        &self,
        spec: &PullRequestSpec,
        _token: &str,
    ) -> ForgeResult<CreatedPullRequest> {
        let number = {
            let mut pulls = self
                .pulls
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            pulls.push(spec.clone());
            pulls.len() as u64
        };

        Ok(CreatedPullRequest {
            number,
            url: format!("https://github.com/{}/pull/{number}", spec.repo_full_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_created_pulls_with_sequential_numbers() {
        let forge = MockForge::default();
        let spec = PullRequestSpec {
            repo_full_name: "owner/repo".to_string(),
            head: "feat/x".to_string(),
            base: "main".to_string(),
            title: "AI: do thing".to_string(),
            body: "did thing".to_string(),
        };

        let first = forge.create_pull_request(&spec, "t").await.unwrap();
        let second = forge.create_pull_request(&spec, "t").await.unwrap();

        assert_eq!(first.number, 1);
        assert_eq!(second.number, 2);
        assert_eq!(forge.created_pulls().len(), 2);
    }
}
