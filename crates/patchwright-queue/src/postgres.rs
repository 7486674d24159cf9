//! PostgreSQL-backed durable queue
//!
//! Uses the `jobs` table with `FOR UPDATE SKIP LOCKED` claims so multiple
//! worker processes never hand the same job to two workers. Delegates the
//! schema to the shared migrations.

use crate::models::{Job, JobState, QueueName};
use crate::queue::{EnqueueOptions, JobQueue, RetryPolicy};
use crate::{QueueError, QueueResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

/// Durable job queue over PostgreSQL
#[derive(Clone)]
pub struct PostgresJobQueue {
    pool: PgPool,
    policy: RetryPolicy,
}

impl PostgresJobQueue {
    pub fn new(pool: PgPool, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    fn row_to_job(row: &sqlx::postgres::PgRow) -> QueueResult<Job> {
        let queue: String = row.get("queue_name");
        let state: String = row.get("state");

        Ok(Job {
            id: row.get("id"),
            queue: queue
                .parse()
                .map_err(|e: String| QueueError::Backend(e))?,
            payload: row.get("payload"),
            state: state
                .parse()
                .map_err(|e: String| QueueError::Backend(e))?,
            attempts: row.get("attempts"),
            max_attempts: row.get("max_attempts"),
            progress: row.get("progress"),
            result: row.get("result"),
            failed_reason: row.get("failed_reason"),
            owner_user_id: row.get("owner_user_id"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }

    /// Keep only the newest `retention` terminal jobs per queue and state
    async fn trim_retention(&self, queue: QueueName) -> QueueResult<()> {
        for state in ["completed", "failed"] {
            sqlx::query(
                r"
                DELETE FROM jobs
                WHERE id IN (
                    SELECT id FROM jobs
                    WHERE queue_name = $1 AND state = $2
                    ORDER BY updated_at DESC
                    OFFSET $3
                )
                ",
            )
            .bind(queue.to_string())
            .bind(state)
            .bind(self.policy.retention)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl JobQueue for PostgresJobQueue {
    async fn enqueue(
        &self,
        queue: QueueName,
        payload: serde_json::Value,
        options: EnqueueOptions,
    ) -> QueueResult<String> {
        let id = options
            .job_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let delay_seconds = options.delay.map_or(0.0, |d| d.as_secs_f64());

        // ON CONFLICT DO NOTHING makes caller-supplied ids idempotent
        sqlx::query(
            r"
            INSERT INTO jobs (id, queue_name, payload, state, max_attempts, owner_user_id, run_at)
            VALUES ($1, $2, $3, 'waiting', $4, $5, NOW() + make_interval(secs => $6))
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(&id)
        .bind(queue.to_string())
        .bind(&payload)
        .bind(self.policy.max_attempts)
        .bind(options.owner_user_id)
        .bind(delay_seconds)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn fetch_next(&self, queue: QueueName) -> QueueResult<Option<Job>> {
        let row = sqlx::query(
            r"
            UPDATE jobs SET
                state = 'active',
                attempts = attempts + 1,
                updated_at = NOW()
            WHERE id = (
                SELECT id FROM jobs
                WHERE queue_name = $1 AND state = 'waiting' AND run_at <= NOW()
                ORDER BY created_at
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, queue_name, payload, state, attempts, max_attempts,
                      progress, result, failed_reason, owner_user_id, created_at
            ",
        )
        .bind(queue.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_job).transpose()
    }

    async fn update_progress(&self, job_id: &str, progress: i32) -> QueueResult<()> {
        let result = sqlx::query(
            "UPDATE jobs SET progress = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(job_id)
        .bind(progress.clamp(0, 100))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::NotFound(job_id.to_string()));
        }
        Ok(())
    }

    async fn complete(&self, job_id: &str, result: serde_json::Value) -> QueueResult<()> {
        let updated = sqlx::query(
            r"
            UPDATE jobs SET
                state = 'completed',
                progress = 100,
                result = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING queue_name
            ",
        )
        .bind(job_id)
        .bind(&result)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = updated else {
            return Err(QueueError::NotFound(job_id.to_string()));
        };

        let queue: String = row.get("queue_name");
        if let Ok(queue) = queue.parse::<QueueName>() {
            self.trim_retention(queue).await?;
        }
        Ok(())
    }

    async fn fail_or_retry(&self, job_id: &str, reason: &str) -> QueueResult<JobState> {
        let row = sqlx::query(
            "SELECT queue_name, attempts, max_attempts FROM jobs WHERE id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| QueueError::NotFound(job_id.to_string()))?;

        let attempts: i32 = row.get("attempts");
        let max_attempts: i32 = row.get("max_attempts");
        let queue: String = row.get("queue_name");

        if attempts < max_attempts {
            let backoff = self.policy.backoff_for(attempts).as_secs_f64();
            sqlx::query(
                r"
                UPDATE jobs SET
                    state = 'waiting',
                    run_at = NOW() + make_interval(secs => $2),
                    updated_at = NOW()
                WHERE id = $1
                ",
            )
            .bind(job_id)
            .bind(backoff)
            .execute(&self.pool)
            .await?;

            tracing::debug!(job_id = %job_id, attempt = attempts, "Job requeued with backoff");
            Ok(JobState::Waiting)
        } else {
            sqlx::query(
                r"
                UPDATE jobs SET
                    state = 'failed',
                    failed_reason = $2,
                    updated_at = NOW()
                WHERE id = $1
                ",
            )
            .bind(job_id)
            .bind(reason)
            .execute(&self.pool)
            .await?;

            if let Ok(queue) = queue.parse::<QueueName>() {
                self.trim_retention(queue).await?;
            }
            Ok(JobState::Failed)
        }
    }

    async fn get_job(&self, job_id: &str) -> QueueResult<Option<Job>> {
        let row = sqlx::query(
            r"
            SELECT id, queue_name, payload, state, attempts, max_attempts,
                   progress, result, failed_reason, owner_user_id, created_at
            FROM jobs WHERE id = $1
            ",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_job).transpose()
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
