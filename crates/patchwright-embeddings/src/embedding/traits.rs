//! Trait abstractions for embedding generation
//!
//! This module provides trait abstractions for embedding providers,
//! enabling pluggable implementations and better testability.

use crate::EmbeddingResult;
use async_trait::async_trait;

/// Trait for embedding generation providers
///
/// This trait abstracts a single remote (or mock) model endpoint. The service
/// layer on top handles batching, pacing, and failure substitution.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for one text
    ///
    /// The returned vector always has `dimension()` entries on success.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Get the dimensionality of embeddings produced by this provider
    fn dimension(&self) -> usize;

    /// Get the name of the embedding model
    fn model_name(&self) -> &str;
}

/// Service for managing embedding generation
///
/// This service coordinates embedding generation over many chunks: batching,
/// bounded fan-out, provider rate pacing, and zero-vector substitution for
/// per-item failures.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generate embeddings for chunk texts, in matching order
    ///
    /// Infallible at the collection level: an item whose provider call fails
    /// gets a zero vector of the model dimension in its slot (queryable but
    /// ranked low). The failure is logged at warn level.
    async fn generate_embeddings(&self, texts: Vec<&str>) -> Vec<Vec<f32>>;

    /// Embed a query string with the same model used for indexing
    async fn embed_query(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Get the embedding provider being used
    fn provider(&self) -> &dyn EmbeddingProvider;

    /// Get service statistics
    async fn get_stats(&self) -> EmbeddingStats;
}

/// Statistics about embedding generation
#[derive(Debug, Clone, Default)]
pub struct EmbeddingStats {
    /// Total number of embeddings generated
    pub total_embeddings: usize,

    /// Total number of batches processed
    pub total_batches: usize,

    /// Total items that failed and were substituted with zero vectors
    pub total_failures: usize,

    /// Model name being used
    pub model_name: String,

    /// Model dimension
    pub embedding_dimension: usize,
}
