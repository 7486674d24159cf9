//! Queue trait and retry policy

use crate::models::{Job, JobState, QueueName};
use crate::QueueResult;
use async_trait::async_trait;
use std::time::Duration;

/// Retry and retention policy shared by queue backends
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts before a job fails permanently
    pub max_attempts: i32,
    /// Exponential backoff base delay
    pub backoff_base: Duration,
    /// Completed/failed jobs retained per queue
    pub retention: i64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            retention: 100,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based)
    pub fn backoff_for(&self, attempt: i32) -> Duration {
        let shift = attempt.saturating_sub(1).clamp(0, 16) as u32;
        self.backoff_base.saturating_mul(2_u32.saturating_pow(shift))
    }
}

/// Options for enqueueing a job
#[derive(Debug, Clone, Default)]
pub struct EnqueueOptions {
    /// Caller-supplied id for idempotency; generated when absent
    pub job_id: Option<String>,
    /// Delay before the job becomes runnable
    pub delay: Option<Duration>,
    /// Owner checked on status lookups
    pub owner_user_id: Option<String>,
}

/// Durable job queue operations
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job
    ///
    /// Re-submitting with an existing caller-supplied id is a no-op returning
    /// the same id (queue-level idempotency).
    async fn enqueue(
        &self,
        queue: QueueName,
        payload: serde_json::Value,
        options: EnqueueOptions,
    ) -> QueueResult<String>;

    /// Claim the next runnable job of a queue, marking it active
    ///
    /// Honours backoff timestamps; returns `None` when nothing is runnable.
    async fn fetch_next(&self, queue: QueueName) -> QueueResult<Option<Job>>;

    /// Update a job's progress (0-100)
    async fn update_progress(&self, job_id: &str, progress: i32) -> QueueResult<()>;

    /// Mark a job completed with its result
    async fn complete(&self, job_id: &str, result: serde_json::Value) -> QueueResult<()>;

    /// Record a failure: requeue with backoff while attempts remain,
    /// otherwise fail permanently
    ///
    /// Returns the state the job ended up in.
    async fn fail_or_retry(&self, job_id: &str, reason: &str) -> QueueResult<JobState>;

    /// Fetch a job by id
    async fn get_job(&self, job_id: &str) -> QueueResult<Option<Job>>;

    /// Fetch a job on behalf of a user, enforcing ownership
    ///
    /// # Errors
    /// `QueueError::NotFound` for unknown ids, `QueueError::Unauthorized`
    /// when the requesting user doesn't own the job.
    async fn status_for_user(&self, job_id: &str, user_id: &str) -> QueueResult<Job>;
}

/// Read-only job state lookup
///
/// The generation worker waits on indexing jobs through this interface
/// instead of holding the indexing queue itself, which keeps the two queues
/// decoupled.
#[async_trait]
pub trait JobStatusLookup: Send + Sync {
    /// State and failure reason of a job, `None` when unknown
    async fn job_state(&self, job_id: &str) -> QueueResult<Option<(JobState, Option<String>)>>;
}

#[async_trait]
impl<T: JobQueue + ?Sized> JobStatusLookup for T {
    async fn job_state(&self, job_id: &str) -> QueueResult<Option<(JobState, Option<String>)>> {
        Ok(self
            .get_job(job_id)
            .await?
            .map(|job| (job.state, job.failed_reason)))
    }
}
