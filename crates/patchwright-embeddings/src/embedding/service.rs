//! Batching embedding service

use crate::{EmbeddingProvider, EmbeddingResult, EmbeddingService, EmbeddingStats};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

/// Embedding service with batching and provider rate pacing
///
/// Chunks are embedded in batches: requests within a batch run concurrently,
/// and the service sleeps between batches to respect the provider's rate.
/// A per-item failure substitutes a zero vector of the model dimension so one
/// bad chunk never sinks a whole indexing run.
pub struct BatchedEmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    batch_delay: Duration,
    total_embeddings: AtomicUsize,
    total_batches: AtomicUsize,
    total_failures: AtomicUsize,
}

impl BatchedEmbeddingService {
    /// Create a service over the given provider
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            batch_delay,
            total_embeddings: AtomicUsize::new(0),
            total_batches: AtomicUsize::new(0),
            total_failures: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingService for BatchedEmbeddingService {
    async fn generate_embeddings(&self, texts: Vec<&str>) -> Vec<Vec<f32>> {
        let dimension = self.provider.dimension();
        let mut embeddings = Vec::with_capacity(texts.len());
        let batch_count = texts.len().div_ceil(self.batch_size);

        for (batch_index, batch) in texts.chunks(self.batch_size).enumerate() {
            let results = futures::future::join_all(
                batch.iter().map(|text| self.provider.embed(text)),
            )
            .await;

            for (offset, result) in results.into_iter().enumerate() {
                match result {
                    Ok(embedding) => embeddings.push(embedding),
                    Err(e) => {
                        // Zero vector keeps the slot queryable but ranked low
                        self.total_failures.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(
                            batch = batch_index,
                            item = offset,
                            error = %e,
                            "Embedding failed, substituting zero vector"
                        );
                        embeddings.push(vec![0.0; dimension]);
                    }
                }
            }

            self.total_batches.fetch_add(1, Ordering::Relaxed);
            self.total_embeddings.fetch_add(batch.len(), Ordering::Relaxed);

            // Pace requests between batches, but not after the last one
            if batch_index + 1 < batch_count && !self.batch_delay.is_zero() {
                sleep(self.batch_delay).await;
            }
        }

        embeddings
    }

    async fn embed_query(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.provider.embed(text).await
    }

    fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    async fn get_stats(&self) -> EmbeddingStats {
        EmbeddingStats {
            total_embeddings: self.total_embeddings.load(Ordering::Relaxed),
            total_batches: self.total_batches.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            model_name: self.provider.model_name().to_string(),
            embedding_dimension: self.provider.dimension(),
        }
    }
}
