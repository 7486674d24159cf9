//! Patchwright vector data storage crate
//!
//! This crate provides vector database operations for storing and retrieving
//! chunk embeddings, logically partitioned by repository and branch. It ships
//! a Qdrant backend and a mock implementation for testing.

pub mod error;
pub mod storage;

pub use error::{VectorDataError, VectorDataResult};
pub use storage::{
    ChunkMetadata, MockStorage, QdrantStorage, VectorHit, VectorRecord, VectorStorage,
};
// Use unified configuration from patchwright-config
pub use patchwright_config::VectorStorageConfig;
