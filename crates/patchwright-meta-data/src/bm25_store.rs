//! Metadata-backed persistence for the lexical registry

use crate::traits::MetaRepository;
use async_trait::async_trait;
use patchwright_lexical::{Bm25Index, Bm25StateStore, LexicalError, LexicalResult};
use std::sync::Arc;

/// Adapts the metadata repository to the lexical registry's store contract
///
/// BM25 indexes serialize to JSONB per repository/branch, so a restarted
/// process lazily reloads what the last indexing run built.
pub struct MetaBm25Store {
    repository: Arc<dyn MetaRepository>,
}

impl MetaBm25Store {
    pub fn new(repository: Arc<dyn MetaRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Bm25StateStore for MetaBm25Store {
    async fn load(&self, repo_id: &str, branch: &str) -> LexicalResult<Option<Bm25Index>> {
        let state = self
            .repository
            .load_bm25_state(repo_id, branch)
            .await
            .map_err(|e| LexicalError::Storage(e.to_string()))?;

        match state {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, repo_id: &str, branch: &str, index: &Bm25Index) -> LexicalResult<()> {
        let value = serde_json::to_value(index)?;
        self.repository
            .save_bm25_state(repo_id, branch, &value)
            .await
            .map_err(|e| LexicalError::Storage(e.to_string()))
    }

    async fn delete(&self, repo_id: &str, branch: &str) -> LexicalResult<()> {
        self.repository
            .delete_bm25_state(repo_id, branch)
            .await
            .map_err(|e| LexicalError::Storage(e.to_string()))
    }
}
