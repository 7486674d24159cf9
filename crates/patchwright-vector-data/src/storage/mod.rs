//! Vector storage backends

mod mock;
mod qdrant;
mod traits;

pub use mock::MockStorage;
pub use qdrant::QdrantStorage;
pub use traits::{ChunkMetadata, VectorHit, VectorRecord, VectorStorage};
