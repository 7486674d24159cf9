//! Patchwright indexing crate
//!
//! The pipeline that turns a repository into queryable indexes: clone into a
//! sandbox, enumerate code files, chunk, embed, and feed the BM25 and vector
//! indexes. Full runs rebuild everything for a repository/branch; incremental
//! runs touch only the changed-file set and keep the sandbox alive for the
//! next push.

pub mod error;
pub mod files;
pub mod handler;
pub mod pipeline;

pub use error::{IndexingError, IndexingResult};
pub use files::{REPO_DIR, enumerate_code_files, is_indexable_path, validate_repo_url};
pub use handler::IndexingJobHandler;
pub use pipeline::{IndexSummary, IndexingPipeline};
