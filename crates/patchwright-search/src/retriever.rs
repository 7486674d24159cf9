//! Hybrid retrieval service

use crate::fusion::{RankedEntry, fuse_rrf};
use crate::{SearchError, SearchResult};
use async_trait::async_trait;
use patchwright_common::CorrelationId;
use patchwright_embeddings::EmbeddingService;
use patchwright_lexical::LexicalRegistry;
use patchwright_vector_data::VectorStorage;
use std::collections::HashMap;
use std::sync::Arc;

/// A chunk surfaced by hybrid retrieval
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub file_path: String,
    /// Fused RRF score
    pub score: f32,
}

/// Retrieval interface consumed by the generation pipeline
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Rank candidate chunks for a natural-language task
    ///
    /// `top_k` caps the number of *chunks*; unique-file extraction downstream
    /// may yield fewer files.
    async fn retrieve(
        &self,
        repo_id: &str,
        branch: &str,
        query: &str,
        top_k: usize,
        correlation_id: &CorrelationId,
    ) -> SearchResult<Vec<RetrievedChunk>>;
}

/// Hybrid retriever combining BM25 and dense-vector rankings with RRF
pub struct HybridRetriever {
    embedding_service: Arc<dyn EmbeddingService>,
    vector_storage: Arc<dyn VectorStorage>,
    lexical: Arc<LexicalRegistry>,
}

impl HybridRetriever {
    pub fn new(
        embedding_service: Arc<dyn EmbeddingService>,
        vector_storage: Arc<dyn VectorStorage>,
        lexical: Arc<LexicalRegistry>,
    ) -> Self {
        Self {
            embedding_service,
            vector_storage,
            lexical,
        }
    }
}

#[async_trait]
impl Retriever for HybridRetriever {
    #[tracing::instrument(skip(self, query), fields(top_k))]
    async fn retrieve(
        &self,
        repo_id: &str,
        branch: &str,
        query: &str,
        top_k: usize,
        correlation_id: &CorrelationId,
    ) -> SearchResult<Vec<RetrievedChunk>> {
        // Lexical ranking
        let index = self.lexical.get_or_load(repo_id, branch).await?;
        let lexical_hits = index.read().await.query(query, top_k);
        let lexical_ranked: Vec<RankedEntry> = lexical_hits
            .into_iter()
            .map(|hit| RankedEntry {
                chunk_id: hit.chunk_id,
                file_path: hit.file_path,
            })
            .collect();

        // Dense ranking with the same model used at index time
        let query_vector = self.embedding_service.embed_query(query).await?;
        let vector_hits = self
            .vector_storage
            .query(repo_id, branch, query_vector, top_k, correlation_id)
            .await?;
        let vector_ranked: Vec<RankedEntry> = vector_hits
            .into_iter()
            .map(|hit| RankedEntry {
                chunk_id: hit.chunk_id,
                file_path: hit.metadata.file_path,
            })
            .collect();

        tracing::debug!(
            correlation_id = %correlation_id,
            lexical_hits = lexical_ranked.len(),
            vector_hits = vector_ranked.len(),
            "Fusing hybrid rankings"
        );

        let fused = fuse_rrf(&[lexical_ranked, vector_ranked], top_k);
        Ok(fused
            .into_iter()
            .map(|(entry, score)| RetrievedChunk {
                chunk_id: entry.chunk_id,
                file_path: entry.file_path,
                score,
            })
            .collect())
    }
}

/// Unique file paths in ranked order
pub fn unique_files_from_results(results: &[RetrievedChunk]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    results
        .iter()
        .filter(|chunk| seen.insert(chunk.file_path.as_str()))
        .map(|chunk| chunk.file_path.clone())
        .collect()
}

/// Group ranked chunks by their file path
pub fn group_by_file(results: &[RetrievedChunk]) -> HashMap<String, Vec<RetrievedChunk>> {
    let mut groups: HashMap<String, Vec<RetrievedChunk>> = HashMap::new();
    for chunk in results {
        groups
            .entry(chunk.file_path.clone())
            .or_default()
            .push(chunk.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwright_chunking::{Chunk, ChunkKind};
    use patchwright_embeddings::{BatchedEmbeddingService, MockEmbeddingProvider};
    use patchwright_lexical::MemoryBm25Store;
    use patchwright_vector_data::{ChunkMetadata, MockStorage, VectorRecord};
    use std::time::Duration;

    fn chunk(id: &str, file_path: &str, content: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            repo_id: "repo-1".to_string(),
            file_path: file_path.to_string(),
            file_name: file_path.to_string(),
            file_type: "ts".to_string(),
            function_name: None,
            line_start: 1,
            line_end: 10,
            content: content.to_string(),
            kind: ChunkKind::Function,
        }
    }

    async fn retriever_with_data() -> HybridRetriever {
        let provider = Arc::new(MockEmbeddingProvider::new(8));
        let embedding_service: Arc<dyn EmbeddingService> = Arc::new(BatchedEmbeddingService::new(
            Arc::clone(&provider) as Arc<dyn patchwright_embeddings::EmbeddingProvider>,
            10,
            Duration::ZERO,
        ));

        let chunks = vec![
            chunk("src/user.ts_fn_getUser", "src/user.ts", "function getUser(id) { return db.users.find(id); }"),
            chunk("src/pool.ts_class_Pool", "src/pool.ts", "class ConnectionPool { acquire() {} }"),
        ];

        // Lexical side
        let lexical = Arc::new(LexicalRegistry::new(Arc::new(MemoryBm25Store::new())));
        let index = lexical.get_or_load("repo-1", "main").await.unwrap();
        index.write().await.build(&chunks);

        // Vector side, embedded with the same mock model
        let storage = Arc::new(MockStorage::new());
        let correlation_id = CorrelationId::new();
        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let vectors = embedding_service.generate_embeddings(texts).await;
        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(c, vector)| VectorRecord {
                chunk_id: c.id.clone(),
                vector,
                metadata: ChunkMetadata {
                    repo_id: c.repo_id.clone(),
                    branch: "main".to_string(),
                    file_path: c.file_path.clone(),
                    line_start: c.line_start,
                    line_end: c.line_end,
                    chunk_type: c.kind.to_string(),
                    content_preview: ChunkMetadata::preview_of(&c.content),
                },
            })
            .collect();
        storage
            .upsert_vectors(&records, &correlation_id)
            .await
            .unwrap();

        HybridRetriever::new(embedding_service, storage, lexical)
    }

    #[tokio::test]
    async fn retrieval_surfaces_lexically_matching_chunk() {
        let retriever = retriever_with_data().await;
        let correlation_id = CorrelationId::new();

        let results = retriever
            .retrieve("repo-1", "main", "getUser lookup", 10, &correlation_id)
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert_eq!(results[0].chunk_id, "src/user.ts_fn_getUser");
    }

    #[tokio::test]
    async fn unknown_repo_returns_empty_ranking() {
        let retriever = retriever_with_data().await;
        let correlation_id = CorrelationId::new();

        let results = retriever
            .retrieve("ghost-repo", "main", "anything", 10, &correlation_id)
            .await
            .unwrap();

        assert!(results.is_empty());
    }

    #[test]
    fn unique_files_preserve_rank_order() {
        let results = vec![
            RetrievedChunk {
                chunk_id: "b.ts_fn_1".to_string(),
                file_path: "b.ts".to_string(),
                score: 0.9,
            },
            RetrievedChunk {
                chunk_id: "a.ts_fn_1".to_string(),
                file_path: "a.ts".to_string(),
                score: 0.8,
            },
            RetrievedChunk {
                chunk_id: "b.ts_fn_2".to_string(),
                file_path: "b.ts".to_string(),
                score: 0.7,
            },
        ];

        assert_eq!(unique_files_from_results(&results), vec!["b.ts", "a.ts"]);
    }

    #[test]
    fn grouping_collects_chunks_per_file() {
        let results = vec![
            RetrievedChunk {
                chunk_id: "a.ts_fn_1".to_string(),
                file_path: "a.ts".to_string(),
                score: 0.9,
            },
            RetrievedChunk {
                chunk_id: "a.ts_fn_2".to_string(),
                file_path: "a.ts".to_string(),
                score: 0.5,
            },
        ];

        let groups = group_by_file(&results);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get("a.ts").map(Vec::len), Some(2));
    }
}
