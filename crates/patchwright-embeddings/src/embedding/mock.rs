//! Mock embedding provider for tests

use crate::{EmbeddingError, EmbeddingProvider, EmbeddingResult};
use async_trait::async_trait;
use std::collections::HashSet;

/// Deterministic embedding provider that doesn't require network access
///
/// Embeddings are derived from a simple hash of the text, so identical inputs
/// always produce identical vectors and different inputs (almost always)
/// differ. Texts registered with `failing_on` error out, which exercises the
/// zero-vector substitution path in the service layer.
pub struct MockEmbeddingProvider {
    dimension: usize,
    failing: HashSet<String>,
}

impl MockEmbeddingProvider {
    /// Create a mock producing vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            failing: HashSet::new(),
        }
    }

    /// Make the provider fail for a specific input text
    #[must_use]
    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if self.failing.contains(text) {
            return Err(EmbeddingError::Provider(format!(
                "mock failure for input of length {}",
                text.len()
            )));
        }

        // FNV-style rolling hash spread across the vector
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        let mut vector = Vec::with_capacity(self.dimension);
        for (i, byte) in text.bytes().enumerate() {
            hash ^= u64::from(byte).wrapping_add(i as u64);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        for slot in 0..self.dimension {
            let mixed = hash.wrapping_mul(slot as u64 + 1).rotate_left(slot as u32);
            // Map to [-1, 1]
            vector.push(((mixed % 2000) as f32 / 1000.0) - 1.0);
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embedding-model"
    }
}
