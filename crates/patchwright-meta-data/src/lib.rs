//! Patchwright metadata crate
//!
//! PostgreSQL bookkeeping consumed by the pipelines: forge installations and
//! their repositories, per-repository index state (the `repoIndexed`
//! invariant lives here), and persisted BM25 state for the lexical registry.

pub mod bm25_store;
pub mod error;
pub mod migrations;
pub mod mock;
pub mod models;
pub mod pool;
pub mod repository;
pub mod traits;

pub use bm25_store::MetaBm25Store;
pub use error::{MetaDataError, MetaDataResult};
pub use migrations::run_migrations;
pub use mock::MockMetaRepository;
pub use models::{IndexMeta, IndexType, Installation, RepositoryRecord};
pub use pool::initialize_database;
pub use repository::DbMetaRepository;
pub use traits::MetaRepository;
