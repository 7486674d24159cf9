//! Patchwright hybrid search crate
//!
//! Combines the lexical BM25 index and the dense vector index through
//! Reciprocal Rank Fusion, producing the ranked candidate chunks the
//! generation pipeline starts from.

pub mod error;
pub mod fusion;
pub mod retriever;

pub use error::{SearchError, SearchResult};
pub use fusion::{RRF_K, RankedEntry, fuse_rrf};
pub use retriever::{
    HybridRetriever, RetrievedChunk, Retriever, group_by_file, unique_files_from_results,
};
