//! The generation pipeline
//!
//! Phases and progress milestones: 10 sandbox, 20 clone, 25 package manager,
//! 40 retrieval, 50 skeletons, 60 file contents, 70-95 iteration loop,
//! 100 pull request created.

use crate::branch::branch_name_for_task;
use crate::diff::{FileDiff, collect_file_diffs, detect_default_branch};
use crate::statemachine::{LoopState, LoopTransition, advance};
use crate::{GenerationError, GenerationResult};
use chrono::Utc;
use patchwright_common::CorrelationId;
use patchwright_forge::{ForgeClient, PullRequestSpec, authenticated_clone_url};
use patchwright_graph::{GraphBuilder, format_skeleton};
use patchwright_indexing::{REPO_DIR, validate_repo_url};
use patchwright_llm::{
    CompletionRequest, GenerateOutput, LlmProvider, build_generation_prompt,
    build_selection_prompt, parse_generate_output, parse_selected_paths, prompts,
};
use patchwright_meta_data::MetaRepository;
use patchwright_queue::{JobProgress, JobStatusLookup, ProcessTaskPayload};
use patchwright_sandbox::{
    FileOperation, Sandbox, SandboxManager, detect_package_manager, execute_file_operations,
};
use patchwright_search::{Retriever, unique_files_from_results};
use patchwright_validation::{ValidationOptions, Validator};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Lines read per candidate file
const MAX_FILE_LINES: usize = 1500;

/// Knobs the pipeline runs with
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub retrieval_top_k: usize,
    pub selection_fallback_limit: usize,
    pub max_iterations: u32,
    pub indexing_poll: Duration,
    pub indexing_wait_cap: Duration,
    pub clone_timeout: Duration,
    pub install_timeout: Duration,
    pub command_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            retrieval_top_k: 20,
            selection_fallback_limit: 5,
            max_iterations: 3,
            indexing_poll: Duration::from_secs(5),
            indexing_wait_cap: Duration::from_secs(10 * 60),
            clone_timeout: Duration::from_secs(5 * 60),
            install_timeout: Duration::from_secs(10 * 60),
            command_timeout: Duration::from_secs(3 * 60),
        }
    }
}

/// Job result of a successful generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub pr_url: String,
    pub pr_number: u64,
    pub branch: String,
    pub file_diffs: Vec<FileDiff>,
    pub operations: Vec<FileOperation>,
    pub explanation: String,
    pub iterations: u32,
}

/// Orchestrates retrieval, skeletons, the generate-validate loop, and PR
/// creation
pub struct GenerationPipeline {
    sandboxes: Arc<SandboxManager>,
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LlmProvider>,
    validator: Validator,
    forge: Arc<dyn ForgeClient>,
    meta: Arc<dyn MetaRepository>,
    indexing_jobs: Arc<dyn JobStatusLookup>,
    settings: PipelineSettings,
}

impl GenerationPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sandboxes: Arc<SandboxManager>,
        retriever: Arc<dyn Retriever>,
        llm: Arc<dyn LlmProvider>,
        validator: Validator,
        forge: Arc<dyn ForgeClient>,
        meta: Arc<dyn MetaRepository>,
        indexing_jobs: Arc<dyn JobStatusLookup>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            sandboxes,
            retriever,
            llm,
            validator,
            forge,
            meta,
            indexing_jobs,
            settings,
        }
    }

    /// Run one generation task end to end
    ///
    /// The sandbox is cleaned up on every exit path, success or failure.
    ///
    /// # Errors
    /// Returns the pipeline error; the handler maps it onto the job's
    /// `failed_reason`.
    #[tracing::instrument(skip(self, payload, progress), fields(repo_id = %payload.repo_id))]
    pub async fn run(
        &self,
        payload: &ProcessTaskPayload,
        progress: &JobProgress,
        correlation_id: &CorrelationId,
    ) -> GenerationResult<GenerationOutcome> {
        let result = self.run_inner(payload, progress, correlation_id).await;
        // Cleanup is idempotent and removes the reference before killing
        self.sandboxes.cleanup(&payload.repo_id).await;
        result
    }

    async fn run_inner(
        &self,
        payload: &ProcessTaskPayload,
        progress: &JobProgress,
        correlation_id: &CorrelationId,
    ) -> GenerationResult<GenerationOutcome> {
        // 1. Wait for the upstream indexing job, when one is attached
        if let Some(indexing_job_id) = &payload.indexing_job_id {
            self.wait_for_indexing(indexing_job_id).await?;
        }

        validate_repo_url(payload.repo_url.trim_end_matches('/'))
            .map_err(|_| GenerationError::InvalidRepoUrl(payload.repo_url.clone()))?;

        let branch = self.resolve_branch(payload).await;
        if !self.meta.is_repo_indexed(&payload.repo_id, &branch).await? {
            return Err(GenerationError::NotIndexed);
        }

        // 2. Sandbox + clone + package manager
        let sandbox = self.sandboxes.get_or_create(&payload.repo_id).await?;
        progress.report(10).await;

        self.clone_repo(&sandbox, &payload.repo_url, &branch).await?;
        progress.report(20).await;

        let package_manager = detect_package_manager(&sandbox, REPO_DIR).await;
        progress.report(25).await;

        // Dependencies are best-effort: a failed install surfaces later as
        // validator errors rather than aborting the task here
        let install = sandbox
            .run_command(
                package_manager.install_command(),
                Some(REPO_DIR),
                self.settings.install_timeout,
            )
            .await;
        match install {
            Ok(output) if !output.success() => {
                tracing::warn!(
                    manager = %package_manager,
                    stderr = %output.stderr,
                    "Dependency install failed, continuing"
                );
            }
            Err(e) => {
                tracing::warn!(manager = %package_manager, error = %e, "Dependency install errored, continuing");
            }
            Ok(_) => {}
        }

        // 3. Hybrid retrieval
        let retrieved = self
            .retriever
            .retrieve(
                &payload.repo_id,
                &branch,
                &payload.task,
                self.settings.retrieval_top_k,
                correlation_id,
            )
            .await?;
        if retrieved.is_empty() {
            return Err(GenerationError::NotIndexed);
        }
        let candidate_files = unique_files_from_results(&retrieved);
        progress.report(40).await;

        // 4. Candidate contents + skeletons
        let candidate_paths: Vec<String> = candidate_files
            .iter()
            .map(|f| format!("{REPO_DIR}/{f}"))
            .collect();
        let contents = sandbox.read_files(&candidate_paths, MAX_FILE_LINES).await;

        let graph_input: HashMap<String, String> = contents
            .iter()
            .map(|(path, content)| {
                let relative = path.strip_prefix(&format!("{REPO_DIR}/")).unwrap_or(path);
                (relative.to_string(), content.clone())
            })
            .collect();
        let graph = GraphBuilder::build(&graph_input);
        let skeletons: Vec<(String, String)> = candidate_files
            .iter()
            .map(|file| (file.clone(), format_skeleton(&graph, file)))
            .collect();
        progress.report(50).await;

        // 5. File selection from skeletons only
        let selected = self.select_files(payload, &skeletons, &candidate_files).await;
        let selected_contents = sandbox
            .read_files(
                &selected
                    .iter()
                    .map(|f| format!("{REPO_DIR}/{f}"))
                    .collect::<Vec<_>>(),
                MAX_FILE_LINES,
            )
            .await;
        let prompt_files: Vec<(String, String)> = selected_contents
            .iter()
            .map(|(path, content)| {
                let relative = path.strip_prefix(&format!("{REPO_DIR}/")).unwrap_or(path);
                (relative.to_string(), content.clone())
            })
            .collect();
        progress.report(60).await;

        // 6. The generate-validate loop
        let (output, iterations) = self
            .generation_loop(payload, &sandbox, package_manager, &prompt_files, progress)
            .await?;

        // 7. Commit, push, open the pull request
        let outcome = self
            .create_pull_request(payload, &sandbox, &output, iterations)
            .await?;
        progress.report(100).await;

        tracing::info!(
            correlation_id = %correlation_id,
            pr = outcome.pr_number,
            iterations,
            "Pull request created"
        );
        Ok(outcome)
    }

    /// Poll the indexing job until terminal, bounded by the wait cap
    async fn wait_for_indexing(&self, indexing_job_id: &str) -> GenerationResult<()> {
        let deadline = tokio::time::Instant::now() + self.settings.indexing_wait_cap;

        loop {
            match self.indexing_jobs.job_state(indexing_job_id).await? {
                Some((state, failed_reason)) if state.is_terminal() => {
                    return if state == patchwright_queue::JobState::Completed {
                        Ok(())
                    } else {
                        Err(GenerationError::IndexingFailed {
                            job_id: indexing_job_id.to_string(),
                            reason: failed_reason.unwrap_or_else(|| "unknown".to_string()),
                        })
                    };
                }
                _ => {
                    if tokio::time::Instant::now() >= deadline {
                        return Err(GenerationError::IndexingWaitTimeout(
                            indexing_job_id.to_string(),
                        ));
                    }
                    tokio::time::sleep(self.settings.indexing_poll).await;
                }
            }
        }
    }

    /// Default branch for the repository; falls back to "main" when the forge
    /// is unreachable
    async fn resolve_branch(&self, payload: &ProcessTaskPayload) -> String {
        let Some(token) = self.token_for(payload).await else {
            return "main".to_string();
        };
        self.forge
            .default_branch(&payload.repo_id, &token)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Default-branch lookup failed, assuming main");
                "main".to_string()
            })
    }

    /// Installation token from the payload or minted via the forge
    async fn token_for(&self, payload: &ProcessTaskPayload) -> Option<String> {
        if let Some(token) = &payload.installation_token {
            return Some(token.clone());
        }

        let installation_id = match payload.installation_id {
            Some(id) => Some(id),
            None => self
                .meta
                .installation_for_repo(&payload.repo_id)
                .await
                .ok()
                .flatten(),
        }?;

        match self.forge.installation_token(installation_id).await {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(error = %e, "Installation token unavailable");
                None
            }
        }
    }

    async fn clone_repo(
        &self,
        sandbox: &Sandbox,
        repo_url: &str,
        branch: &str,
    ) -> GenerationResult<()> {
        let command =
            format!("rm -rf {REPO_DIR} && git clone --branch {branch} {repo_url} {REPO_DIR}");
        let output = sandbox
            .run_command(&command, None, self.settings.clone_timeout)
            .await?;

        if !output.success() {
            return Err(GenerationError::Sandbox(format!(
                "Clone failed: {}",
                output.combined()
            )));
        }
        Ok(())
    }

    /// Ask the LLM which files to modify; fall back to the top ranked files
    /// when it returns nothing usable
    async fn select_files(
        &self,
        payload: &ProcessTaskPayload,
        skeletons: &[(String, String)],
        candidates: &[String],
    ) -> Vec<String> {
        let prompt = build_selection_prompt(&payload.task, skeletons);
        let request = CompletionRequest::new(prompt).with_system(prompts::SYSTEM_PROMPT);

        let selected = match self.llm.complete(request).await {
            Ok(response) => {
                let parsed = parse_selected_paths(&response, "");
                // Keep only paths that are actual candidates
                parsed
                    .into_iter()
                    .filter(|path| candidates.iter().any(|c| c == path))
                    .collect()
            }
            Err(e) => {
                tracing::warn!(error = %e, "File selection failed, using ranked fallback");
                Vec::new()
            }
        };

        if selected.is_empty() {
            let take = self.settings.selection_fallback_limit.min(candidates.len());
            tracing::info!(take, "Selection fallback to top ranked files");
            candidates.iter().take(take).cloned().collect()
        } else {
            selected
        }
    }

    /// Bounded generate -> apply -> validate loop
    async fn generation_loop(
        &self,
        payload: &ProcessTaskPayload,
        sandbox: &Sandbox,
        package_manager: patchwright_sandbox::PackageManager,
        files: &[(String, String)],
        progress: &JobProgress,
    ) -> GenerationResult<(GenerateOutput, u32)> {
        let mut state = LoopState::initial();

        loop {
            let milestone = 70 + i32::try_from(state.iteration).unwrap_or(0) * 8;
            progress.report(milestone.min(95)).await;

            // generate
            let prompt =
                build_generation_prompt(&payload.task, files, &state.validation_errors);
            let request = CompletionRequest::new(prompt).with_system(prompts::SYSTEM_PROMPT);
            let response = self.llm.complete(request).await?;
            let output = parse_generate_output(&response)?;

            // apply
            execute_file_operations(sandbox, &output.file_operations, REPO_DIR).await?;
            for command in &output.shell_commands {
                let result = sandbox
                    .run_command(command, Some(REPO_DIR), self.settings.command_timeout)
                    .await;
                match result {
                    Ok(out) if !out.success() => {
                        tracing::warn!(command = %command, stderr = %out.stderr, "Shell command failed, continuing");
                    }
                    Err(e) => {
                        tracing::warn!(command = %command, error = %e, "Shell command errored, continuing");
                    }
                    Ok(_) => {}
                }
            }

            // validate with the conservative check set
            let report = self
                .validator
                .validate(
                    sandbox,
                    REPO_DIR,
                    package_manager,
                    ValidationOptions::conservative(),
                )
                .await?;

            match advance(&state, &report, self.settings.max_iterations) {
                LoopTransition::CreatePr => return Ok((output, state.iteration + 1)),
                LoopTransition::Retry(next) => {
                    tracing::info!(
                        iteration = next.iteration,
                        errors = next.validation_errors.len(),
                        "Validation failed, regenerating with errors"
                    );
                    state = next;
                }
                LoopTransition::Failed { iterations, errors } => {
                    return Err(GenerationError::ValidationExhausted { iterations, errors });
                }
            }
        }
    }

    /// Commit on a feature branch, push with an authenticated URL, open the PR
    async fn create_pull_request(
        &self,
        payload: &ProcessTaskPayload,
        sandbox: &Sandbox,
        output: &GenerateOutput,
        iterations: u32,
    ) -> GenerationResult<GenerationOutcome> {
        let timestamp = Utc::now().timestamp_millis().unsigned_abs();
        let branch_name = branch_name_for_task(&payload.task, timestamp);
        let title = format!("AI: {}", payload.task);

        let token = self
            .token_for(payload)
            .await
            .ok_or_else(|| GenerationError::Forge("No installation token available".to_string()))?;
        let push_url = authenticated_clone_url(&payload.repo_url, &token);
        let default_branch = detect_default_branch(
            sandbox,
            REPO_DIR,
            self.settings.command_timeout,
        )
        .await;

        // Diffs are collected before the branch switch mutates git state
        let operated_paths: Vec<String> = output
            .file_operations
            .iter()
            .map(|op| format!("{REPO_DIR}/{}", op.path()))
            .collect();
        let file_diffs = collect_file_diffs(
            sandbox,
            REPO_DIR,
            &default_branch,
            &operated_paths,
            self.settings.command_timeout,
        )
        .await;

        let commit_command = format!(
            "git checkout -b {branch_name} && git add -A && \
             git -c user.name='patchwright-bot' -c user.email='bot@patchwright.dev' \
             commit -m '{title}' && \
             git push {push_url} HEAD:{branch_name}",
            title = title.replace('\'', ""),
        );
        let result = sandbox
            .run_command(&commit_command, Some(REPO_DIR), self.settings.clone_timeout)
            .await?;
        if !result.success() {
            return Err(GenerationError::Sandbox(format!(
                "Commit/push failed: {}",
                result.combined()
            )));
        }

        let pr = self
            .forge
            .create_pull_request(
                &PullRequestSpec {
                    repo_full_name: payload.repo_id.clone(),
                    head: branch_name.clone(),
                    base: default_branch,
                    title,
                    body: output.explanation.clone(),
                },
                &token,
            )
            .await?;

        Ok(GenerationOutcome {
            pr_url: pr.url,
            pr_number: pr.number,
            branch: branch_name,
            file_diffs,
            operations: output.file_operations.clone(),
            explanation: output.explanation.clone(),
            iterations,
        })
    }
}
