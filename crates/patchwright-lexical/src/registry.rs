//! Per-repository index registry with lazy persistence

use crate::{Bm25Index, LexicalResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Persistence backend for serialized BM25 state
///
/// Implemented by the metadata store; a `MemoryBm25Store` is provided for
/// tests and single-process runs.
#[async_trait]
pub trait Bm25StateStore: Send + Sync {
    /// Load persisted index state, if any
    async fn load(&self, repo_id: &str, branch: &str) -> LexicalResult<Option<Bm25Index>>;

    /// Persist the current index state
    async fn save(&self, repo_id: &str, branch: &str, index: &Bm25Index) -> LexicalResult<()>;

    /// Drop persisted state (full reindex replaces it anyway; this is for cleanup)
    async fn delete(&self, repo_id: &str, branch: &str) -> LexicalResult<()>;
}

/// In-memory state store for tests
#[derive(Default)]
pub struct MemoryBm25Store {
    states: DashMap<String, String>,
}

impl MemoryBm25Store {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Bm25StateStore for MemoryBm25Store {
    async fn load(&self, repo_id: &str, branch: &str) -> LexicalResult<Option<Bm25Index>> {
        match self.states.get(&registry_key(repo_id, branch)) {
            Some(serialized) => Ok(Some(serde_json::from_str(serialized.value())?)),
            None => Ok(None),
        }
    }

    async fn save(&self, repo_id: &str, branch: &str, index: &Bm25Index) -> LexicalResult<()> {
        self.states
            .insert(registry_key(repo_id, branch), serde_json::to_string(index)?);
        Ok(())
    }

    async fn delete(&self, repo_id: &str, branch: &str) -> LexicalResult<()> {
        self.states.remove(&registry_key(repo_id, branch));
        Ok(())
    }
}

fn registry_key(repo_id: &str, branch: &str) -> String {
    format!("{repo_id}:{branch}")
}

/// Caches one BM25 index per repository/branch
///
/// Misses lazily reload persisted state through the store; writers call
/// `persist` after mutating so the on-disk state tracks the in-memory one.
/// Mutual exclusion between writers comes from the indexing queue running one
/// job at a time; the `RwLock` additionally lets concurrent queries read a
/// consistent snapshot.
pub struct LexicalRegistry {
    store: Arc<dyn Bm25StateStore>,
    indexes: DashMap<String, Arc<RwLock<Bm25Index>>>,
}

impl LexicalRegistry {
    pub fn new(store: Arc<dyn Bm25StateStore>) -> Self {
        Self {
            store,
            indexes: DashMap::new(),
        }
    }

    /// Get the cached index for a repository/branch, loading persisted state
    /// on first access
    pub async fn get_or_load(
        &self,
        repo_id: &str,
        branch: &str,
    ) -> LexicalResult<Arc<RwLock<Bm25Index>>> {
        let key = registry_key(repo_id, branch);

        if let Some(index) = self.indexes.get(&key) {
            return Ok(Arc::clone(index.value()));
        }

        let loaded = self.store.load(repo_id, branch).await?.unwrap_or_default();
        let index = Arc::new(RwLock::new(loaded));
        self.indexes.insert(key, Arc::clone(&index));
        Ok(index)
    }

    /// Persist the current in-memory state for a repository/branch
    pub async fn persist(&self, repo_id: &str, branch: &str) -> LexicalResult<()> {
        let key = registry_key(repo_id, branch);
        let Some(index) = self.indexes.get(&key).map(|e| Arc::clone(e.value())) else {
            return Ok(());
        };

        let snapshot = index.read().await;
        self.store.save(repo_id, branch, &snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwright_chunking::{Chunk, ChunkKind};

    fn chunk(id: &str, file_path: &str, content: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            repo_id: "repo-1".to_string(),
            file_path: file_path.to_string(),
            file_name: file_path.to_string(),
            file_type: "ts".to_string(),
            function_name: None,
            line_start: 1,
            line_end: 5,
            content: content.to_string(),
            kind: ChunkKind::Function,
        }
    }

    #[tokio::test]
    async fn registry_reloads_persisted_state() {
        let store = Arc::new(MemoryBm25Store::new());

        {
            let registry = LexicalRegistry::new(Arc::clone(&store) as Arc<dyn Bm25StateStore>);
            let index = registry.get_or_load("repo-1", "main").await.unwrap();
            index
                .write()
                .await
                .build(&[chunk("a.ts_fn_f", "a.ts", "function f() { return 42; }")]);
            registry.persist("repo-1", "main").await.unwrap();
        }

        // Fresh registry simulates a process restart
        let registry = LexicalRegistry::new(store as Arc<dyn Bm25StateStore>);
        let index = registry.get_or_load("repo-1", "main").await.unwrap();
        assert_eq!(index.read().await.doc_count(), 1);
    }

    #[tokio::test]
    async fn unknown_repo_starts_empty() {
        let registry = LexicalRegistry::new(Arc::new(MemoryBm25Store::new()));
        let index = registry.get_or_load("nope", "main").await.unwrap();
        assert_eq!(index.read().await.doc_count(), 0);
    }

    #[tokio::test]
    async fn branches_are_isolated() {
        let registry = LexicalRegistry::new(Arc::new(MemoryBm25Store::new()));

        let main = registry.get_or_load("repo-1", "main").await.unwrap();
        main.write()
            .await
            .build(&[chunk("a.ts_fn_f", "a.ts", "function f() {}")]);

        let develop = registry.get_or_load("repo-1", "develop").await.unwrap();
        assert_eq!(develop.read().await.doc_count(), 0);
    }
}
