//! Patchwright queue crate
//!
//! Durable named job queues binding the webhook dispatcher to the indexing
//! pipeline and user tasks to the generation pipeline: retries with
//! exponential backoff, per-job progress, owner checks, bounded retention,
//! and one-job-at-a-time workers.

pub mod error;
pub mod memory;
pub mod models;
pub mod payloads;
pub mod postgres;
pub mod queue;
pub mod worker;

pub use error::{QueueError, QueueResult};
pub use memory::MemoryJobQueue;
pub use models::{Job, JobState, QueueName};
pub use payloads::{ChangedFiles, IncrementalIndexPayload, IndexRepoPayload, ProcessTaskPayload};
pub use postgres::PostgresJobQueue;
pub use queue::{EnqueueOptions, JobQueue, JobStatusLookup, RetryPolicy};
pub use worker::{JobHandler, JobProgress, Worker};
