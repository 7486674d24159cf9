//! Webhook dispatcher
//!
//! Routes verified deliveries: installation events update the bookkeeping
//! store, pushes go through the indexing decision and land on the indexing
//! queue, pull requests (opened/synchronize) trigger a full index of their
//! head branch, everything else is acknowledged but not handled.

use crate::decision::{IndexDecision, decide_index_kind};
use crate::events::{
    EventKind, InstallationPayload, PullRequestPayload, PushPayload, extract_changed_files,
};
use crate::WebhookResult;
use chrono::Utc;
use patchwright_meta_data::{Installation, MetaRepository, RepositoryRecord};
use patchwright_queue::{
    EnqueueOptions, IncrementalIndexPayload, IndexRepoPayload, JobQueue, QueueName,
};
use std::sync::Arc;

/// What the dispatcher did with a delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// An indexing job was enqueued
    Enqueued { job_id: String, full: bool },
    /// Installation bookkeeping was updated
    InstallationHandled,
    /// Event acknowledged without action (ping, repository, unknown)
    NotHandled,
}

/// Dispatches classified webhook events
pub struct WebhookDispatcher {
    queue: Arc<dyn JobQueue>,
    meta: Arc<dyn MetaRepository>,
    incremental_threshold: usize,
}

impl WebhookDispatcher {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        meta: Arc<dyn MetaRepository>,
        incremental_threshold: usize,
    ) -> Self {
        Self {
            queue,
            meta,
            incremental_threshold,
        }
    }

    /// Dispatch one verified delivery
    ///
    /// # Errors
    /// Returns payload parse failures and store/queue errors; unknown events
    /// are `Ok(NotHandled)`, not errors.
    pub async fn dispatch(&self, event_header: &str, body: &[u8]) -> WebhookResult<DispatchOutcome> {
        match EventKind::classify(event_header) {
            EventKind::Installation | EventKind::InstallationRepositories => {
                let payload: InstallationPayload = serde_json::from_slice(body)?;
                self.handle_installation(payload).await
            }
            EventKind::Push => {
                let payload: PushPayload = serde_json::from_slice(body)?;
                self.handle_push(payload).await
            }
            EventKind::PullRequest => {
                let payload: PullRequestPayload = serde_json::from_slice(body)?;
                self.handle_pull_request(payload).await
            }
            EventKind::Ping | EventKind::Repository | EventKind::Unknown(_) => {
                tracing::debug!(event = %event_header, "Webhook event not handled");
                Ok(DispatchOutcome::NotHandled)
            }
        }
    }

    async fn handle_installation(
        &self,
        payload: InstallationPayload,
    ) -> WebhookResult<DispatchOutcome> {
        let installation_id = payload.installation.id;

        match payload.action.as_str() {
            "deleted" => {
                self.meta.delete_installation(installation_id).await?;
            }
            _ => {
                let now = Utc::now();
                self.meta
                    .upsert_installation(&Installation {
                        installation_id,
                        account_login: payload.installation.account.login.clone(),
                        account_type: payload
                            .installation
                            .account
                            .account_type
                            .clone()
                            .unwrap_or_else(|| "User".to_string()),
                        installed_at: now,
                        updated_at: now,
                        deleted_at: None,
                    })
                    .await?;

                for repo in payload.repositories.iter().chain(&payload.repositories_added) {
                    self.meta
                        .upsert_repository(&RepositoryRecord {
                            github_id: repo.id,
                            name: repo.name.clone(),
                            full_name: repo.full_name.clone(),
                            private: repo.private,
                            installation_id,
                            added_at: now,
                            removed_at: None,
                        })
                        .await?;
                }
                for repo in &payload.repositories_removed {
                    self.meta.remove_repository(&repo.full_name).await?;
                }
            }
        }

        tracing::info!(
            installation_id,
            action = %payload.action,
            "Installation event handled"
        );
        Ok(DispatchOutcome::InstallationHandled)
    }

    async fn handle_push(&self, payload: PushPayload) -> WebhookResult<DispatchOutcome> {
        let repo_id = payload.repository.full_name.clone();
        let branch = payload.branch().to_string();
        let changed = extract_changed_files(&payload.commits);
        let total = changed.total();

        let is_indexed = self.meta.is_repo_indexed(&repo_id, &branch).await?;
        let decision = decide_index_kind(
            is_indexed,
            &payload.before,
            total,
            self.incremental_threshold,
        );

        let installation_id = self.meta.installation_for_repo(&repo_id).await?;
        let repo_url = payload
            .repository
            .clone_url
            .clone()
            .unwrap_or_else(|| format!("https://github.com/{repo_id}"));
        let pusher = payload
            .pusher
            .as_ref()
            .map_or_else(|| "webhook".to_string(), |p| p.name.clone());

        match decision {
            IndexDecision::Full(reason) => {
                tracing::info!(
                    repo_id = %repo_id,
                    branch = %branch,
                    reason = %reason,
                    "Push triggers full index"
                );
                let job_id = self
                    .enqueue_full_index(
                        &repo_id,
                        &branch,
                        &repo_url,
                        installation_id,
                        &pusher,
                        Some(payload.before.clone()),
                        Some(payload.after.clone()),
                    )
                    .await?;
                Ok(DispatchOutcome::Enqueued { job_id, full: true })
            }
            IndexDecision::Incremental => {
                tracing::info!(
                    repo_id = %repo_id,
                    branch = %branch,
                    total_changes = total,
                    "Push triggers incremental index"
                );
                let job_payload = IncrementalIndexPayload {
                    project_id: repo_id.clone(),
                    repo_url,
                    repo_id: repo_id.clone(),
                    branch,
                    installation_token: None,
                    installation_id,
                    user_id: pusher.clone(),
                    username: pusher,
                    timestamp: Utc::now().timestamp_millis(),
                    before_sha: payload.before.clone(),
                    after_sha: payload.after.clone(),
                    changed_files: changed,
                    total_changed_files: total,
                };

                let job_id = self
                    .queue
                    .enqueue(
                        QueueName::Indexing,
                        serde_json::to_value(&job_payload)?,
                        EnqueueOptions {
                            // Delivery retries must not double-index one push
                            job_id: Some(format!("incremental-{repo_id}-{}", payload.after)),
                            owner_user_id: Some(job_payload.user_id.clone()),
                            delay: None,
                        },
                    )
                    .await?;
                Ok(DispatchOutcome::Enqueued { job_id, full: false })
            }
        }
    }

    async fn handle_pull_request(
        &self,
        payload: PullRequestPayload,
    ) -> WebhookResult<DispatchOutcome> {
        if !matches!(payload.action.as_str(), "opened" | "synchronize") {
            tracing::debug!(action = %payload.action, "Pull request action not handled");
            return Ok(DispatchOutcome::NotHandled);
        }

        let repo_id = payload.repository.full_name.clone();
        let branch = payload.pull_request.head.git_ref.clone();
        let installation_id = self.meta.installation_for_repo(&repo_id).await?;
        let repo_url = payload
            .repository
            .clone_url
            .clone()
            .unwrap_or_else(|| format!("https://github.com/{repo_id}"));

        tracing::info!(
            repo_id = %repo_id,
            branch = %branch,
            pr = payload.number,
            "Pull request triggers full index of head branch"
        );

        let job_id = self
            .enqueue_full_index(
                &repo_id,
                &branch,
                &repo_url,
                installation_id,
                "webhook",
                None,
                Some(payload.pull_request.head.sha.clone()),
            )
            .await?;
        Ok(DispatchOutcome::Enqueued { job_id, full: true })
    }

    #[allow(clippy::too_many_arguments)]
    async fn enqueue_full_index(
        &self,
        repo_id: &str,
        branch: &str,
        repo_url: &str,
        installation_id: Option<i64>,
        user: &str,
        before_sha: Option<String>,
        after_sha: Option<String>,
    ) -> WebhookResult<String> {
        let job_payload = IndexRepoPayload {
            project_id: repo_id.to_string(),
            repo_url: repo_url.to_string(),
            repo_id: repo_id.to_string(),
            branch: branch.to_string(),
            installation_token: None,
            installation_id,
            user_id: user.to_string(),
            username: user.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            trigger: Some("webhook".to_string()),
            event: Some("push".to_string()),
            pusher: Some(user.to_string()),
            before_sha,
            after_sha: after_sha.clone(),
        };

        let idempotency_suffix = after_sha.unwrap_or_else(|| "baseline".to_string());
        Ok(self
            .queue
            .enqueue(
                QueueName::Indexing,
                serde_json::to_value(&job_payload)?,
                EnqueueOptions {
                    job_id: Some(format!("index-{repo_id}-{branch}-{idempotency_suffix}")),
                    owner_user_id: Some(user.to_string()),
                    delay: None,
                },
            )
            .await?)
    }

    /// The configured incremental threshold
    pub fn threshold(&self) -> usize {
        self.incremental_threshold
    }
}
