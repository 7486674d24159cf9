//! Repository trait for metadata access

use crate::MetaDataResult;
use crate::models::{IndexMeta, Installation, RepositoryRecord};
use async_trait::async_trait;

/// Metadata operations the core depends on
///
/// The webhook installation handler writes installations/repositories; the
/// pipelines read `installation_for_repo` and maintain index meta. BM25 state
/// persistence backs the lexical registry across restarts.
#[async_trait]
pub trait MetaRepository: Send + Sync {
    /// Insert or refresh an installation record
    async fn upsert_installation(&self, installation: &Installation) -> MetaDataResult<()>;

    /// Soft-delete an installation
    async fn delete_installation(&self, installation_id: i64) -> MetaDataResult<()>;

    /// Insert or refresh a repository record
    async fn upsert_repository(&self, repository: &RepositoryRecord) -> MetaDataResult<()>;

    /// Soft-delete a repository by full name
    async fn remove_repository(&self, full_name: &str) -> MetaDataResult<()>;

    /// `repo full name -> installation id` lookup (active records only)
    async fn installation_for_repo(&self, full_name: &str) -> MetaDataResult<Option<i64>>;

    /// Read per-repository/branch index state
    async fn get_index_meta(&self, repo_id: &str, branch: &str) -> MetaDataResult<Option<IndexMeta>>;

    /// Write per-repository/branch index state (upsert)
    async fn set_index_meta(&self, meta: &IndexMeta) -> MetaDataResult<()>;

    /// The indexed invariant: meta exists and carries a non-empty sha
    async fn is_repo_indexed(&self, repo_id: &str, branch: &str) -> MetaDataResult<bool> {
        Ok(self
            .get_index_meta(repo_id, branch)
            .await?
            .is_some_and(|meta| meta.marks_indexed()))
    }

    /// Load persisted BM25 state
    async fn load_bm25_state(
        &self,
        repo_id: &str,
        branch: &str,
    ) -> MetaDataResult<Option<serde_json::Value>>;

    /// Persist BM25 state (upsert)
    async fn save_bm25_state(
        &self,
        repo_id: &str,
        branch: &str,
        state: &serde_json::Value,
    ) -> MetaDataResult<()>;

    /// Drop persisted BM25 state
    async fn delete_bm25_state(&self, repo_id: &str, branch: &str) -> MetaDataResult<()>;
}
