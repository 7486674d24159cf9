//! In-memory queue backend for tests and single-process runs

// Allow test-friendly patterns in the in-memory backend
#![allow(clippy::unwrap_used)]

use crate::models::{Job, JobState, QueueName};
use crate::queue::{EnqueueOptions, JobQueue, RetryPolicy};
use crate::{QueueError, QueueResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

struct StoredJob {
    job: Job,
    run_at: Instant,
    sequence: u64,
    finished_sequence: Option<u64>,
}

/// In-memory implementation of [`JobQueue`]
///
/// Same observable semantics as the PostgreSQL backend: idempotent enqueue by
/// caller id, backoff-delayed retries, FIFO claim order, retention trimming.
pub struct MemoryJobQueue {
    jobs: Mutex<HashMap<String, StoredJob>>,
    policy: RetryPolicy,
    sequence: Mutex<u64>,
}

impl Default for MemoryJobQueue {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl MemoryJobQueue {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            policy,
            sequence: Mutex::new(0),
        }
    }

    fn next_sequence(&self) -> u64 {
        let mut sequence = self.sequence.lock().unwrap();
        *sequence += 1;
        *sequence
    }

    /// Evict terminal jobs beyond the retention cap, oldest-finished first
    fn trim_retention(jobs: &mut HashMap<String, StoredJob>, retention: i64) {
        for (queue, state) in [
            (QueueName::Indexing, JobState::Completed),
            (QueueName::Indexing, JobState::Failed),
            (QueueName::Generation, JobState::Completed),
            (QueueName::Generation, JobState::Failed),
        ] {
            let mut finished: Vec<(String, u64)> = jobs
                .iter()
                .filter(|(_, stored)| stored.job.queue == queue && stored.job.state == state)
                .map(|(id, stored)| (id.clone(), stored.finished_sequence.unwrap_or(0)))
                .collect();

            if finished.len() as i64 <= retention {
                continue;
            }

            finished.sort_by_key(|(_, seq)| *seq);
            let excess = finished.len() - retention as usize;
            for (id, _) in finished.into_iter().take(excess) {
                jobs.remove(&id);
            }
        }
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(
        &self,
        queue: QueueName,
        payload: serde_json::Value,
        options: EnqueueOptions,
    ) -> QueueResult<String> {
        let id = options
            .job_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut jobs = self.jobs.lock().unwrap();
        if jobs.contains_key(&id) {
            // Idempotent: the earlier submission wins
            return Ok(id);
        }

        let run_at = options
            .delay
            .map_or_else(Instant::now, |delay| Instant::now() + delay);

        let job = Job {
            id: id.clone(),
            queue,
            payload,
            state: JobState::Waiting,
            attempts: 0,
            max_attempts: self.policy.max_attempts,
            progress: 0,
            result: None,
            failed_reason: None,
            owner_user_id: options.owner_user_id,
            created_at: Utc::now(),
        };

        jobs.insert(
            id.clone(),
            StoredJob {
                job,
                run_at,
                sequence: self.next_sequence(),
                finished_sequence: None,
            },
        );

        Ok(id)
    }

    async fn fetch_next(&self, queue: QueueName) -> QueueResult<Option<Job>> {
        let mut jobs = self.jobs.lock().unwrap();
        let now = Instant::now();

        let next_id = jobs
            .values()
            .filter(|stored| {
                stored.job.queue == queue
                    && stored.job.state == JobState::Waiting
                    && stored.run_at <= now
            })
            .min_by_key(|stored| stored.sequence)
            .map(|stored| stored.job.id.clone());

        let Some(id) = next_id else {
            return Ok(None);
        };

        let stored = jobs.get_mut(&id).unwrap();
        stored.job.state = JobState::Active;
        stored.job.attempts += 1;
        Ok(Some(stored.job.clone()))
    }

    async fn update_progress(&self, job_id: &str, progress: i32) -> QueueResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let stored = jobs
            .get_mut(job_id)
            .ok_or_else(|| QueueError::NotFound(job_id.to_string()))?;
        stored.job.progress = progress.clamp(0, 100);
        Ok(())
    }

    async fn complete(&self, job_id: &str, result: serde_json::Value) -> QueueResult<()> {
        let sequence = self.next_sequence();
        let mut jobs = self.jobs.lock().unwrap();
        let stored = jobs
            .get_mut(job_id)
            .ok_or_else(|| QueueError::NotFound(job_id.to_string()))?;

        stored.job.state = JobState::Completed;
        stored.job.progress = 100;
        stored.job.result = Some(result);
        stored.finished_sequence = Some(sequence);

        Self::trim_retention(&mut jobs, self.policy.retention);
        Ok(())
    }

    async fn fail_or_retry(&self, job_id: &str, reason: &str) -> QueueResult<JobState> {
        let sequence = self.next_sequence();
        let mut jobs = self.jobs.lock().unwrap();
        let stored = jobs
            .get_mut(job_id)
            .ok_or_else(|| QueueError::NotFound(job_id.to_string()))?;

        if stored.job.attempts < stored.job.max_attempts {
            let backoff = self.policy.backoff_for(stored.job.attempts);
            stored.job.state = JobState::Waiting;
            stored.run_at = Instant::now() + backoff;
            tracing::debug!(
                job_id = %job_id,
                attempt = stored.job.attempts,
                backoff_ms = backoff.as_millis() as u64,
                "Job requeued with backoff"
            );
            Ok(JobState::Waiting)
        } else {
            stored.job.state = JobState::Failed;
            stored.job.failed_reason = Some(reason.to_string());
            stored.finished_sequence = Some(sequence);
            Self::trim_retention(&mut jobs, self.policy.retention);
            Ok(JobState::Failed)
        }
    }

    async fn get_job(&self, job_id: &str) -> QueueResult<Option<Job>> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .get(job_id)
            .map(|stored| stored.job.clone()))
    }

    async fn status_for_user(&self, job_id: &str, user_id: &str) -> QueueResult<Job> {
        let job = self
            .get_job(job_id)
            .await?
            .ok_or_else(|| QueueError::NotFound(job_id.to_string()))?;

        if job.owner_user_id.as_deref() != Some(user_id) {
            return Err(QueueError::Unauthorized(job_id.to_string()));
        }
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn queue() -> MemoryJobQueue {
        MemoryJobQueue::default()
    }

    fn payload() -> serde_json::Value {
        serde_json::json!({"k": "v"})
    }

    #[tokio::test]
    async fn fifo_claim_order() {
        let queue = queue();
        let first = queue
            .enqueue(QueueName::Indexing, payload(), EnqueueOptions::default())
            .await
            .unwrap();
        let second = queue
            .enqueue(QueueName::Indexing, payload(), EnqueueOptions::default())
            .await
            .unwrap();

        assert_eq!(
            queue.fetch_next(QueueName::Indexing).await.unwrap().unwrap().id,
            first
        );
        assert_eq!(
            queue.fetch_next(QueueName::Indexing).await.unwrap().unwrap().id,
            second
        );
        assert!(queue.fetch_next(QueueName::Indexing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn queues_are_isolated() {
        let queue = queue();
        queue
            .enqueue(QueueName::Generation, payload(), EnqueueOptions::default())
            .await
            .unwrap();

        assert!(queue.fetch_next(QueueName::Indexing).await.unwrap().is_none());
        assert!(queue.fetch_next(QueueName::Generation).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn caller_supplied_id_is_idempotent() {
        let queue = queue();
        let options = || EnqueueOptions {
            job_id: Some("push-abc123".to_string()),
            ..EnqueueOptions::default()
        };

        queue
            .enqueue(QueueName::Indexing, payload(), options())
            .await
            .unwrap();
        queue
            .enqueue(QueueName::Indexing, payload(), options())
            .await
            .unwrap();

        assert!(queue.fetch_next(QueueName::Indexing).await.unwrap().is_some());
        // Second submission did not double-insert
        assert!(queue.fetch_next(QueueName::Indexing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failures_requeue_with_backoff_until_exhausted() {
        let queue = MemoryJobQueue::new(RetryPolicy {
            max_attempts: 2,
            backoff_base: Duration::from_millis(1),
            retention: 100,
        });
        let id = queue
            .enqueue(QueueName::Indexing, payload(), EnqueueOptions::default())
            .await
            .unwrap();

        queue.fetch_next(QueueName::Indexing).await.unwrap().unwrap();
        assert_eq!(
            queue.fail_or_retry(&id, "first failure").await.unwrap(),
            JobState::Waiting
        );

        // Wait out the backoff, then exhaust attempts
        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.fetch_next(QueueName::Indexing).await.unwrap().unwrap();
        assert_eq!(
            queue.fail_or_retry(&id, "second failure").await.unwrap(),
            JobState::Failed
        );

        let job = queue.get_job(&id).await.unwrap().unwrap();
        assert_eq!(job.failed_reason.as_deref(), Some("second failure"));
    }

    #[tokio::test]
    async fn backoff_delays_requeued_jobs() {
        let queue = MemoryJobQueue::new(RetryPolicy {
            max_attempts: 3,
            backoff_base: Duration::from_secs(60),
            retention: 100,
        });
        let id = queue
            .enqueue(QueueName::Indexing, payload(), EnqueueOptions::default())
            .await
            .unwrap();

        queue.fetch_next(QueueName::Indexing).await.unwrap().unwrap();
        queue.fail_or_retry(&id, "boom").await.unwrap();

        // Requeued but not yet runnable
        assert!(queue.fetch_next(QueueName::Indexing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn owner_checks_enforced_on_status() {
        let queue = queue();
        let id = queue
            .enqueue(
                QueueName::Generation,
                payload(),
                EnqueueOptions {
                    owner_user_id: Some("alice".to_string()),
                    ..EnqueueOptions::default()
                },
            )
            .await
            .unwrap();

        assert!(queue.status_for_user(&id, "alice").await.is_ok());
        assert!(matches!(
            queue.status_for_user(&id, "mallory").await,
            Err(QueueError::Unauthorized(_))
        ));
        assert!(matches!(
            queue.status_for_user("ghost", "alice").await,
            Err(QueueError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn retention_evicts_oldest_completed() {
        let queue = MemoryJobQueue::new(RetryPolicy {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            retention: 2,
        });

        let mut ids = Vec::new();
        for _ in 0..4 {
            let id = queue
                .enqueue(QueueName::Indexing, payload(), EnqueueOptions::default())
                .await
                .unwrap();
            queue.fetch_next(QueueName::Indexing).await.unwrap().unwrap();
            queue.complete(&id, serde_json::json!({})).await.unwrap();
            ids.push(id);
        }

        // Oldest two were evicted, newest two retained
        assert!(queue.get_job(&ids[0]).await.unwrap().is_none());
        assert!(queue.get_job(&ids[1]).await.unwrap().is_none());
        assert!(queue.get_job(&ids[2]).await.unwrap().is_some());
        assert!(queue.get_job(&ids[3]).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn progress_is_clamped() {
        let queue = queue();
        let id = queue
            .enqueue(QueueName::Indexing, payload(), EnqueueOptions::default())
            .await
            .unwrap();

        queue.update_progress(&id, 150).await.unwrap();
        assert_eq!(queue.get_job(&id).await.unwrap().unwrap().progress, 100);
    }
}
