//! Queue worker loop

use crate::models::{Job, QueueName};
use crate::queue::JobQueue;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::sleep;

/// Progress reporting handle given to handlers
///
/// Progress failures are logged, never propagated: a job must not fail
/// because a milestone write raced a backend hiccup.
pub struct JobProgress {
    queue: Arc<dyn JobQueue>,
    job_id: String,
}

impl JobProgress {
    pub fn new(queue: Arc<dyn JobQueue>, job_id: String) -> Self {
        Self { queue, job_id }
    }

    /// Report a progress milestone (0-100)
    pub async fn report(&self, progress: i32) {
        if let Err(e) = self.queue.update_progress(&self.job_id, progress).await {
            tracing::warn!(job_id = %self.job_id, error = %e, "Failed to update job progress");
        }
    }
}

/// Executes one kind of job
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Process a job to completion
    ///
    /// `Ok(result)` completes the job; `Err(reason)` triggers retry/failure
    /// handling in the queue.
    async fn handle(&self, job: &Job, progress: &JobProgress) -> Result<serde_json::Value, String>;
}

/// One queue's worker: claims and processes one job at a time
///
/// Concurrency is 1 per queue because each job owns an exclusive sandbox;
/// index writes for a repository are serialised by the same property.
pub struct Worker {
    queue: Arc<dyn JobQueue>,
    queue_name: QueueName,
    handler: Arc<dyn JobHandler>,
    poll_interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl Worker {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        queue_name: QueueName,
        handler: Arc<dyn JobHandler>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            queue_name,
            handler,
            poll_interval,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a handle for graceful shutdown
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Main worker loop; runs until the shutdown signal is set
    pub async fn run(&self) {
        tracing::info!(queue = %self.queue_name, "Worker started");

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }

            match self.process_one().await {
                Ok(Some(_)) => {} // Immediately look for the next job
                Ok(None) => sleep(self.poll_interval).await,
                Err(e) => {
                    tracing::error!(queue = %self.queue_name, error = %e, "Worker poll failed");
                    sleep(self.poll_interval.saturating_mul(5)).await;
                }
            }
        }

        tracing::info!(queue = %self.queue_name, "Worker stopped");
    }

    /// Claim and process a single job; returns its id when one ran
    ///
    /// # Errors
    /// Returns queue backend errors; handler failures are recorded on the
    /// job, not returned.
    pub async fn process_one(&self) -> crate::QueueResult<Option<String>> {
        let Some(job) = self.queue.fetch_next(self.queue_name).await? else {
            return Ok(None);
        };

        let job_id = job.id.clone();
        tracing::info!(
            queue = %self.queue_name,
            job_id = %job_id,
            attempt = job.attempts,
            "Processing job"
        );

        let progress = JobProgress::new(Arc::clone(&self.queue), job_id.clone());
        match self.handler.handle(&job, &progress).await {
            Ok(result) => {
                self.queue.complete(&job_id, result).await?;
                tracing::info!(job_id = %job_id, "Job completed");
            }
            Err(reason) => {
                let state = self.queue.fail_or_retry(&job_id, &reason).await?;
                tracing::warn!(job_id = %job_id, state = %state, reason = %reason, "Job failed");
            }
        }

        Ok(Some(job_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryJobQueue;
    use crate::models::JobState;
    use crate::queue::{EnqueueOptions, RetryPolicy};
    use std::sync::Mutex;

    struct ScriptedHandler {
        /// Outcomes consumed per call: Ok -> complete, Err -> fail
        outcomes: Mutex<Vec<Result<serde_json::Value, String>>>,
    }

    impl ScriptedHandler {
        fn new(outcomes: Vec<Result<serde_json::Value, String>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
            }
        }
    }

    #[async_trait]
    impl JobHandler for ScriptedHandler {
        async fn handle(
            &self,
            _job: &Job,
            progress: &JobProgress,
        ) -> Result<serde_json::Value, String> {
            progress.report(50).await;
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err("unscripted".to_string()))
        }
    }

    #[tokio::test]
    async fn successful_jobs_complete_with_result() {
        let queue: Arc<dyn JobQueue> = Arc::new(MemoryJobQueue::default());
        let handler = Arc::new(ScriptedHandler::new(vec![Ok(serde_json::json!({"ok": true}))]));
        let worker = Worker::new(
            Arc::clone(&queue),
            QueueName::Indexing,
            handler,
            Duration::from_millis(10),
        );

        let id = queue
            .enqueue(
                QueueName::Indexing,
                serde_json::json!({}),
                EnqueueOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(worker.process_one().await.unwrap(), Some(id.clone()));

        let job = queue.get_job(&id).await.unwrap().unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.result, Some(serde_json::json!({"ok": true})));
    }

    #[tokio::test]
    async fn failing_jobs_retry_then_fail_permanently() {
        let queue: Arc<dyn JobQueue> = Arc::new(MemoryJobQueue::new(RetryPolicy {
            max_attempts: 2,
            backoff_base: Duration::from_millis(1),
            retention: 100,
        }));
        let handler = Arc::new(ScriptedHandler::new(vec![
            Err("second".to_string()),
            Err("first".to_string()),
        ]));
        let worker = Worker::new(
            Arc::clone(&queue),
            QueueName::Generation,
            handler,
            Duration::from_millis(1),
        );

        let id = queue
            .enqueue(
                QueueName::Generation,
                serde_json::json!({}),
                EnqueueOptions::default(),
            )
            .await
            .unwrap();

        worker.process_one().await.unwrap();
        assert_eq!(
            queue.get_job(&id).await.unwrap().unwrap().state,
            JobState::Waiting
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        worker.process_one().await.unwrap();

        let job = queue.get_job(&id).await.unwrap().unwrap();
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.failed_reason.as_deref(), Some("second"));
        assert_eq!(job.attempts, 2);
    }

    #[tokio::test]
    async fn empty_queue_yields_none() {
        let queue: Arc<dyn JobQueue> = Arc::new(MemoryJobQueue::default());
        let handler = Arc::new(ScriptedHandler::new(Vec::new()));
        let worker = Worker::new(queue, QueueName::Indexing, handler, Duration::from_millis(1));

        assert_eq!(worker.process_one().await.unwrap(), None);
    }
}
