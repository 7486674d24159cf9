//! Patchwright embeddings crate
//!
//! This crate produces fixed-dimension dense vectors for chunk text through a
//! remote embedding provider, with bounded concurrency and batching. Query
//! embedding goes through the same model so index and query vectors live in
//! the same space.

pub mod embedding;
pub mod error;

pub use embedding::{
    BatchedEmbeddingService, EmbeddingProvider, EmbeddingService, EmbeddingStats,
    HttpEmbeddingProvider, MockEmbeddingProvider,
};
pub use error::{EmbeddingError, EmbeddingResult};
// Use unified configuration from patchwright-config
pub use patchwright_config::EmbeddingConfig;
