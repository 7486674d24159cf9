//! Full and incremental indexing pipelines

use crate::files::{REPO_DIR, enumerate_code_files, validate_repo_url};
use crate::{IndexingError, IndexingResult};
use chrono::Utc;
use patchwright_chunking::{Chunk, Chunker};
use patchwright_common::CorrelationId;
use patchwright_embeddings::EmbeddingService;
use patchwright_lexical::LexicalRegistry;
use patchwright_meta_data::{IndexMeta, IndexType, MetaRepository};
use patchwright_queue::{IncrementalIndexPayload, IndexRepoPayload, JobProgress};
use patchwright_sandbox::{Sandbox, SandboxManager};
use patchwright_vector_data::{ChunkMetadata, VectorRecord, VectorStorage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Result summary stored on the completed job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSummary {
    pub files_indexed: usize,
    pub chunks_created: usize,
    pub vectors_stored: usize,
    pub index_type: IndexType,
}

/// Orchestrates chunking, embedding, and index writes
pub struct IndexingPipeline {
    sandboxes: Arc<SandboxManager>,
    chunker: Chunker,
    embedding_service: Arc<dyn EmbeddingService>,
    lexical: Arc<LexicalRegistry>,
    vector_storage: Arc<dyn VectorStorage>,
    meta: Arc<dyn MetaRepository>,
    clone_timeout: Duration,
}

impl IndexingPipeline {
    pub fn new(
        sandboxes: Arc<SandboxManager>,
        embedding_service: Arc<dyn EmbeddingService>,
        lexical: Arc<LexicalRegistry>,
        vector_storage: Arc<dyn VectorStorage>,
        meta: Arc<dyn MetaRepository>,
        clone_timeout: Duration,
    ) -> Self {
        Self {
            sandboxes,
            chunker: Chunker::default(),
            embedding_service,
            lexical,
            vector_storage,
            meta,
            clone_timeout,
        }
    }

    /// Full index: clone, chunk everything, rebuild both indexes, write meta
    ///
    /// The sandbox is cleaned up at the end; failures before meta is written
    /// leave the previous index state untouched.
    ///
    /// # Errors
    /// Fatal on invalid URLs, clone failures, zero chunks, or zero stored
    /// vectors.
    #[tracing::instrument(skip(self, payload, progress), fields(repo_id = %payload.repo_id, branch = %payload.branch))]
    pub async fn full_index(
        &self,
        payload: &IndexRepoPayload,
        progress: &JobProgress,
        correlation_id: &CorrelationId,
    ) -> IndexingResult<IndexSummary> {
        validate_repo_url(payload.repo_url.trim_end_matches('/'))?;

        let result = self
            .full_index_inner(payload, progress, correlation_id)
            .await;

        // Full runs always release their sandbox, success or not
        self.sandboxes.cleanup(&payload.project_id).await;
        result
    }

    async fn full_index_inner(
        &self,
        payload: &IndexRepoPayload,
        progress: &JobProgress,
        correlation_id: &CorrelationId,
    ) -> IndexingResult<IndexSummary> {
        let repo_id = &payload.repo_id;
        let branch = &payload.branch;

        let sandbox = self.sandboxes.get_or_create(&payload.project_id).await?;
        progress.report(10).await;

        self.clone_fresh(&sandbox, &payload.repo_url, branch).await?;
        progress.report(25).await;

        let files = enumerate_code_files(&sandbox).await?;
        let chunks = self.chunk_files(&sandbox, repo_id, &files).await;
        progress.report(50).await;

        if chunks.is_empty() {
            return Err(IndexingError::Integrity(format!(
                "Full index of {repo_id}:{branch} produced zero chunks"
            )));
        }

        let records = self
            .embed_chunks(&chunks, branch)
            .await;
        progress.report(65).await;

        if records.is_empty() {
            return Err(IndexingError::Integrity(format!(
                "Full index of {repo_id}:{branch} produced zero vectors"
            )));
        }

        // Lexical rebuild
        let index = self.lexical.get_or_load(repo_id, branch).await?;
        index.write().await.build(&chunks);
        self.lexical.persist(repo_id, branch).await?;

        // Vector rebuild: initialize clears the partition first
        self.vector_storage.initialize(repo_id, branch).await?;
        let vectors_stored = self
            .vector_storage
            .upsert_vectors(&records, correlation_id)
            .await?;
        progress.report(90).await;

        // Meta is committed last so failures above never mark the repo indexed
        self.meta
            .set_index_meta(&IndexMeta {
                repo_id: repo_id.clone(),
                branch: branch.clone(),
                last_indexed_at: Utc::now(),
                last_index_type: IndexType::Full,
                last_indexed_sha: payload
                    .after_sha
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            })
            .await?;
        progress.report(100).await;

        tracing::info!(
            correlation_id = %correlation_id,
            files = files.len(),
            chunks = chunks.len(),
            vectors = vectors_stored,
            "Full index complete"
        );

        Ok(IndexSummary {
            files_indexed: files.len(),
            chunks_created: chunks.len(),
            vectors_stored,
            index_type: IndexType::Full,
        })
    }

    /// Incremental index: touch only the changed-file set
    ///
    /// The sandbox is retained for reuse across incremental runs.
    ///
    /// # Errors
    /// Returns sandbox/index/store failures; removed-only pushes are fine.
    #[tracing::instrument(skip(self, payload, progress), fields(repo_id = %payload.repo_id, branch = %payload.branch))]
    pub async fn incremental_index(
        &self,
        payload: &IncrementalIndexPayload,
        progress: &JobProgress,
        correlation_id: &CorrelationId,
    ) -> IndexingResult<IndexSummary> {
        validate_repo_url(payload.repo_url.trim_end_matches('/'))?;

        let repo_id = &payload.repo_id;
        let branch = &payload.branch;

        let sandbox = self.sandboxes.get_or_create(&payload.project_id).await?;
        progress.report(10).await;

        self.sync_working_tree(&sandbox, &payload.repo_url, branch)
            .await?;
        progress.report(25).await;

        let index = self.lexical.get_or_load(repo_id, branch).await?;

        // Removed files leave both indexes in one step per file
        for removed in &payload.changed_files.removed {
            index.write().await.remove_file(removed);
            self.vector_storage
                .delete_by_file_path(repo_id, branch, removed)
                .await?;
        }

        // Re-chunk only added and modified files
        let reindexable = payload.changed_files.reindexable();
        let chunks = self.chunk_files(&sandbox, repo_id, &reindexable).await;
        progress.report(50).await;

        let records = self.embed_chunks(&chunks, branch).await;
        progress.report(65).await;

        index.write().await.update_files(&chunks);
        self.lexical.persist(repo_id, branch).await?;

        let vectors_stored = if records.is_empty() {
            0
        } else {
            self.vector_storage
                .upsert_vectors(&records, correlation_id)
                .await?
        };
        progress.report(90).await;

        self.meta
            .set_index_meta(&IndexMeta {
                repo_id: repo_id.clone(),
                branch: branch.clone(),
                last_indexed_at: Utc::now(),
                last_index_type: IndexType::Incremental,
                last_indexed_sha: payload.after_sha.clone(),
            })
            .await?;
        progress.report(100).await;

        tracing::info!(
            correlation_id = %correlation_id,
            changed = payload.total_changed_files,
            chunks = chunks.len(),
            vectors = vectors_stored,
            "Incremental index complete"
        );

        Ok(IndexSummary {
            files_indexed: reindexable.len(),
            chunks_created: chunks.len(),
            vectors_stored,
            index_type: IndexType::Incremental,
        })
    }

    /// Clone into a fresh working tree, replacing any previous one
    async fn clone_fresh(
        &self,
        sandbox: &Sandbox,
        repo_url: &str,
        branch: &str,
    ) -> IndexingResult<()> {
        let command = format!(
            "rm -rf {REPO_DIR} && git clone --depth 1 --branch {branch} {repo_url} {REPO_DIR}"
        );
        let output = sandbox
            .run_command(&command, None, self.clone_timeout)
            .await?;

        if !output.success() {
            return Err(IndexingError::Sandbox(format!(
                "Clone failed: {}",
                output.combined()
            )));
        }
        Ok(())
    }

    /// Reuse the retained working tree when possible, otherwise clone
    async fn sync_working_tree(
        &self,
        sandbox: &Sandbox,
        repo_url: &str,
        branch: &str,
    ) -> IndexingResult<()> {
        if sandbox.file_exists(&format!("{REPO_DIR}/.git/HEAD")).await {
            let command =
                format!("git fetch origin {branch} && git reset --hard origin/{branch}");
            let output = sandbox
                .run_command(&command, Some(REPO_DIR), self.clone_timeout)
                .await?;
            if output.success() {
                return Ok(());
            }
            tracing::warn!(
                error = %output.combined(),
                "Working tree sync failed, falling back to fresh clone"
            );
        }
        self.clone_fresh(sandbox, repo_url, branch).await
    }

    /// Chunk the given repo-relative files; unreadable files are skipped
    async fn chunk_files(
        &self,
        sandbox: &Sandbox,
        repo_id: &str,
        files: &[String],
    ) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for file in files {
            match sandbox.read_file(&format!("{REPO_DIR}/{file}")).await {
                Ok(content) => {
                    chunks.extend(self.chunker.chunk_file(repo_id, file, &content));
                }
                Err(e) => {
                    tracing::warn!(file = %file, error = %e, "Skipping unreadable file");
                }
            }
        }
        chunks
    }

    /// Embed chunks into vector records (zero vectors included)
    async fn embed_chunks(&self, chunks: &[Chunk], branch: &str) -> Vec<VectorRecord> {
        if chunks.is_empty() {
            return Vec::new();
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedding_service.generate_embeddings(texts).await;

        chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, vector)| VectorRecord {
                chunk_id: chunk.id.clone(),
                vector,
                metadata: ChunkMetadata {
                    repo_id: chunk.repo_id.clone(),
                    branch: branch.to_string(),
                    file_path: chunk.file_path.clone(),
                    line_start: chunk.line_start,
                    line_end: chunk.line_end,
                    chunk_type: chunk.kind.to_string(),
                    content_preview: ChunkMetadata::preview_of(&chunk.content),
                },
            })
            .collect()
    }
}
