//! Embedding generation: provider trait, HTTP implementation, batching service

mod http_provider;
mod mock;
mod service;
mod traits;

pub use http_provider::HttpEmbeddingProvider;
pub use mock::MockEmbeddingProvider;
pub use service::BatchedEmbeddingService;
pub use traits::{EmbeddingProvider, EmbeddingService, EmbeddingStats};
