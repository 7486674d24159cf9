//! Mock implementation of `MetaRepository` for testing

// Allow test-specific patterns in mock implementation
#![allow(clippy::unwrap_used)] // Mocks can panic on lock poisoning

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::MetaDataResult;
use crate::models::{IndexMeta, Installation, RepositoryRecord};
use crate::traits::MetaRepository;

// Type aliases to simplify complex types
type InstallationMap = Arc<Mutex<HashMap<i64, Installation>>>;
type RepositoryMap = Arc<Mutex<HashMap<String, RepositoryRecord>>>;
type IndexMetaMap = Arc<Mutex<HashMap<(String, String), IndexMeta>>>;
type Bm25StateMap = Arc<Mutex<HashMap<(String, String), serde_json::Value>>>;

/// Mock repository for testing
#[derive(Clone, Default)]
pub struct MockMetaRepository {
    pub installations: InstallationMap,
    pub repositories: RepositoryMap,
    pub index_meta: IndexMetaMap,
    pub bm25_states: Bm25StateMap,
}

impl MockMetaRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetaRepository for MockMetaRepository {
    async fn upsert_installation(&self, installation: &Installation) -> MetaDataResult<()> {
        self.installations
            .lock()
            .unwrap()
            .insert(installation.installation_id, installation.clone());
        Ok(())
    }

    async fn delete_installation(&self, installation_id: i64) -> MetaDataResult<()> {
        if let Some(installation) = self.installations.lock().unwrap().get_mut(&installation_id) {
            installation.deleted_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn upsert_repository(&self, repository: &RepositoryRecord) -> MetaDataResult<()> {
        self.repositories
            .lock()
            .unwrap()
            .insert(repository.full_name.clone(), repository.clone());
        Ok(())
    }

    async fn remove_repository(&self, full_name: &str) -> MetaDataResult<()> {
        if let Some(repository) = self.repositories.lock().unwrap().get_mut(full_name) {
            repository.removed_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn installation_for_repo(&self, full_name: &str) -> MetaDataResult<Option<i64>> {
        let repositories = self.repositories.lock().unwrap();
        let Some(repository) = repositories.get(full_name) else {
            return Ok(None);
        };
        if repository.removed_at.is_some() {
            return Ok(None);
        }

        let installations = self.installations.lock().unwrap();
        let active = installations
            .get(&repository.installation_id)
            .is_some_and(|i| i.deleted_at.is_none());
        Ok(active.then_some(repository.installation_id))
    }

    async fn get_index_meta(
        &self,
        repo_id: &str,
        branch: &str,
    ) -> MetaDataResult<Option<IndexMeta>> {
        Ok(self
            .index_meta
            .lock()
            .unwrap()
            .get(&(repo_id.to_string(), branch.to_string()))
            .cloned())
    }

    async fn set_index_meta(&self, meta: &IndexMeta) -> MetaDataResult<()> {
        self.index_meta
            .lock()
            .unwrap()
            .insert((meta.repo_id.clone(), meta.branch.clone()), meta.clone());
        Ok(())
    }

    async fn load_bm25_state(
        &self,
        repo_id: &str,
        branch: &str,
    ) -> MetaDataResult<Option<serde_json::Value>> {
        Ok(self
            .bm25_states
            .lock()
            .unwrap()
            .get(&(repo_id.to_string(), branch.to_string()))
            .cloned())
    }

    async fn save_bm25_state(
        &self,
        repo_id: &str,
        branch: &str,
        state: &serde_json::Value,
    ) -> MetaDataResult<()> {
        self.bm25_states.lock().unwrap().insert(
            (repo_id.to_string(), branch.to_string()),
            state.clone(),
        );
        Ok(())
    }

    async fn delete_bm25_state(&self, repo_id: &str, branch: &str) -> MetaDataResult<()> {
        self.bm25_states
            .lock()
            .unwrap()
            .remove(&(repo_id.to_string(), branch.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IndexType;
    use chrono::Utc;

    fn installation(id: i64) -> Installation {
        Installation {
            installation_id: id,
            account_login: "octo".to_string(),
            account_type: "Organization".to_string(),
            installed_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn repository(full_name: &str, installation_id: i64) -> RepositoryRecord {
        RepositoryRecord {
            github_id: 1,
            name: full_name.rsplit('/').next().unwrap().to_string(),
            full_name: full_name.to_string(),
            private: false,
            installation_id,
            added_at: Utc::now(),
            removed_at: None,
        }
    }

    #[tokio::test]
    async fn installation_lookup_requires_active_records() {
        let mock = MockMetaRepository::new();
        mock.upsert_installation(&installation(9)).await.unwrap();
        mock.upsert_repository(&repository("octo/app", 9)).await.unwrap();

        assert_eq!(mock.installation_for_repo("octo/app").await.unwrap(), Some(9));

        mock.delete_installation(9).await.unwrap();
        assert_eq!(mock.installation_for_repo("octo/app").await.unwrap(), None);
    }

    #[tokio::test]
    async fn removed_repositories_resolve_to_nothing() {
        let mock = MockMetaRepository::new();
        mock.upsert_installation(&installation(3)).await.unwrap();
        mock.upsert_repository(&repository("octo/gone", 3)).await.unwrap();
        mock.remove_repository("octo/gone").await.unwrap();

        assert_eq!(mock.installation_for_repo("octo/gone").await.unwrap(), None);
    }

    #[tokio::test]
    async fn indexed_invariant_requires_non_empty_sha() {
        let mock = MockMetaRepository::new();
        assert!(!mock.is_repo_indexed("r", "main").await.unwrap());

        mock.set_index_meta(&IndexMeta {
            repo_id: "r".to_string(),
            branch: "main".to_string(),
            last_indexed_at: Utc::now(),
            last_index_type: IndexType::Full,
            last_indexed_sha: String::new(),
        })
        .await
        .unwrap();
        assert!(!mock.is_repo_indexed("r", "main").await.unwrap());

        mock.set_index_meta(&IndexMeta {
            repo_id: "r".to_string(),
            branch: "main".to_string(),
            last_indexed_at: Utc::now(),
            last_index_type: IndexType::Full,
            last_indexed_sha: "abc123".to_string(),
        })
        .await
        .unwrap();
        assert!(mock.is_repo_indexed("r", "main").await.unwrap());
    }
}
