//! Storage abstraction traits for vector databases
//!
//! This module provides trait abstractions for vector storage backends,
//! enabling pluggable storage implementations and better testability.

use crate::VectorDataResult;
use async_trait::async_trait;
use patchwright_common::CorrelationId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How much chunk text is kept in the payload as a preview
pub const CONTENT_PREVIEW_CHARS: usize = 500;

/// Metadata stored alongside each vector
///
/// Carries enough context for search results to be useful without a second
/// lookup, and the partition keys (`repo_id`, `branch`) every query and
/// per-file delete filters on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Repository identifier (partition key)
    pub repo_id: String,
    /// Branch name (partition key)
    pub branch: String,
    /// Path of the source file relative to the repository root
    pub file_path: String,
    /// First line of the chunk (1-indexed)
    pub line_start: usize,
    /// Last line of the chunk (1-indexed)
    pub line_end: usize,
    /// Chunk kind ("function", "class", "lines")
    pub chunk_type: String,
    /// Truncated chunk content for result display
    pub content_preview: String,
}

impl ChunkMetadata {
    /// Truncate content to the preview length on a char boundary
    pub fn preview_of(content: &str) -> String {
        content.chars().take(CONTENT_PREVIEW_CHARS).collect()
    }
}

/// A chunk embedding ready for upsert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Stable chunk id (e.g. `src/util.ts_fn_parse`)
    pub chunk_id: String,
    /// Dense embedding of the chunk content
    pub vector: Vec<f32>,
    /// Payload metadata
    pub metadata: ChunkMetadata,
}

impl VectorRecord {
    /// Deterministic point id: UUID v5 of the partition-qualified chunk id
    ///
    /// Re-upserting the same chunk overwrites its previous point, which makes
    /// per-file replacement idempotent.
    pub fn point_id(&self) -> Uuid {
        point_id_for(&self.metadata.repo_id, &self.metadata.branch, &self.chunk_id)
    }
}

/// Compute the deterministic point id for a chunk in a repository/branch
pub fn point_id_for(repo_id: &str, branch: &str, chunk_id: &str) -> Uuid {
    let seed = format!("{repo_id}:{branch}:{chunk_id}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())
}

/// A ranked nearest-neighbour hit
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub chunk_id: String,
    pub score: f32,
    pub metadata: ChunkMetadata,
}

/// Trait for vector storage backends
///
/// This trait abstracts vector database operations, allowing different
/// implementations (Qdrant, in-memory mock) to be used interchangeably.
/// All operations are scoped to a repository/branch partition.
#[async_trait]
pub trait VectorStorage: Send + Sync {
    /// Prepare the partition for a full (re)index
    ///
    /// Ensures the collection exists and clears any previous records for the
    /// repository/branch so a full index replaces everything.
    async fn initialize(&self, repo_id: &str, branch: &str) -> VectorDataResult<()>;

    /// Upsert chunk embeddings
    ///
    /// Returns the number of records written. Records whose vector is empty
    /// are skipped.
    async fn upsert_vectors(
        &self,
        records: &[VectorRecord],
        correlation_id: &CorrelationId,
    ) -> VectorDataResult<usize>;

    /// Delete every record of one file in a repository/branch
    async fn delete_by_file_path(
        &self,
        repo_id: &str,
        branch: &str,
        file_path: &str,
    ) -> VectorDataResult<()>;

    /// Nearest-neighbour query within a repository/branch
    ///
    /// Returns hits ordered by descending similarity.
    async fn query(
        &self,
        repo_id: &str,
        branch: &str,
        vector: Vec<f32>,
        top_k: usize,
        correlation_id: &CorrelationId,
    ) -> VectorDataResult<Vec<VectorHit>>;

    /// Count records currently stored for a repository/branch
    async fn count(&self, repo_id: &str, branch: &str) -> VectorDataResult<usize>;
}
