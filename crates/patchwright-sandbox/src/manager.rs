//! Sandbox lifecycle management

use crate::backend::{CommandOutput, SandboxBackend, SandboxHandle};
use crate::{SandboxError, SandboxResult};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An explicit sandbox handle
///
/// All cross-component passing uses this abstraction; nothing outside this
/// crate touches the backend handle directly.
pub struct Sandbox {
    project_id: String,
    handle: Box<dyn SandboxHandle>,
    created_at: Instant,
}

impl Sandbox {
    /// The sanitized project id this sandbox belongs to
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// How long this sandbox has existed
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Run a shell command bounded by a timeout
    ///
    /// # Errors
    /// Returns backend errors and `SandboxError::Timeout` on expiry.
    pub async fn run_command(
        &self,
        command: &str,
        cwd: Option<&str>,
        timeout: Duration,
    ) -> SandboxResult<CommandOutput> {
        self.handle.run_command(command, cwd, timeout).await
    }

    /// Read a file as UTF-8 text
    ///
    /// # Errors
    /// Returns `SandboxError::FileNotFound` when missing.
    pub async fn read_file(&self, path: &str) -> SandboxResult<String> {
        self.handle.read_file(path).await
    }

    /// Read multiple files, truncating each to `max_lines`
    ///
    /// Unreadable files are skipped with a warning rather than failing the
    /// whole read.
    pub async fn read_files(&self, paths: &[String], max_lines: usize) -> Vec<(String, String)> {
        let mut contents = Vec::with_capacity(paths.len());
        for path in paths {
            match self.handle.read_file(path).await {
                Ok(content) => {
                    let truncated: String = content
                        .lines()
                        .take(max_lines)
                        .collect::<Vec<_>>()
                        .join("\n");
                    contents.push((path.clone(), truncated));
                }
                Err(e) => {
                    tracing::warn!(file = %path, error = %e, "Skipping unreadable file");
                }
            }
        }
        contents
    }

    /// Write a file, creating parent directories as needed
    ///
    /// # Errors
    /// Returns I/O errors from the backend.
    pub async fn write_file(&self, path: &str, content: &str) -> SandboxResult<()> {
        self.handle.write_file(path, content).await
    }

    /// Delete a file (idempotent)
    ///
    /// # Errors
    /// Returns I/O errors from the backend.
    pub async fn delete_file(&self, path: &str) -> SandboxResult<()> {
        self.handle.delete_file(path).await
    }

    /// Whether a file exists
    pub async fn file_exists(&self, path: &str) -> bool {
        self.handle.file_exists(path).await
    }

    /// Recursively list files under a directory
    ///
    /// # Errors
    /// Returns I/O errors from the backend.
    pub async fn file_tree(&self, dir: &str) -> SandboxResult<Vec<String>> {
        self.handle.file_tree(dir).await
    }

    /// Destroy the backing environment
    ///
    /// # Errors
    /// Returns backend errors; callers treat failures as non-fatal after the
    /// manager reference is gone.
    pub async fn kill(&self) -> SandboxResult<()> {
        self.handle.kill().await
    }
}

/// Owns at most one sandbox per project id
pub struct SandboxManager {
    backend: Arc<dyn SandboxBackend>,
    sandboxes: DashMap<String, Arc<Sandbox>>,
    lifetime: Duration,
}

/// Canonical sandbox id for a project
///
/// One location for the working tree regardless of which pipeline asked.
pub(crate) fn sanitize_project_id(project_id: &str) -> String {
    project_id.replace('/', "_")
}

impl SandboxManager {
    pub fn new(backend: Arc<dyn SandboxBackend>, lifetime: Duration) -> Self {
        Self {
            backend,
            sandboxes: DashMap::new(),
            lifetime,
        }
    }

    /// Get the existing sandbox for a project or create one lazily
    ///
    /// # Errors
    /// Returns backend errors when creation fails.
    pub async fn get_or_create(&self, project_id: &str) -> SandboxResult<Arc<Sandbox>> {
        let key = sanitize_project_id(project_id);

        if let Some(existing) = self.sandboxes.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }

        tracing::info!(project_id = %key, "Creating sandbox");
        let handle = self.backend.create(&key).await?;
        let sandbox = Arc::new(Sandbox {
            project_id: key.clone(),
            handle,
            created_at: Instant::now(),
        });

        self.sandboxes.insert(key, Arc::clone(&sandbox));
        Ok(sandbox)
    }

    /// Look up a sandbox without creating one
    pub fn get(&self, project_id: &str) -> Option<Arc<Sandbox>> {
        self.sandboxes
            .get(&sanitize_project_id(project_id))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Destroy a project's sandbox
    ///
    /// The map entry is removed before kill is attempted: a kill failure must
    /// not retain a stale reference. Idempotent for unknown project ids.
    pub async fn cleanup(&self, project_id: &str) {
        let key = sanitize_project_id(project_id);
        let Some((_, sandbox)) = self.sandboxes.remove(&key) else {
            return;
        };

        if let Err(e) = sandbox.kill().await {
            // Entry is already gone; the provider's own GC collects the leak
            tracing::warn!(project_id = %key, error = %e, "Sandbox kill failed after cleanup");
        }
    }

    /// Kill every sandbox past the configured lifetime
    pub async fn reap_expired(&self) -> usize {
        let expired: Vec<String> = self
            .sandboxes
            .iter()
            .filter(|entry| entry.value().age() >= self.lifetime)
            .map(|entry| entry.key().clone())
            .collect();

        let reaped = expired.len();
        for project_id in expired {
            tracing::info!(project_id = %project_id, "Reaping expired sandbox");
            self.cleanup(&project_id).await;
        }
        reaped
    }

    /// Spawn the background reaper task
    pub fn spawn_reaper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let reaped = manager.reap_expired().await;
                if reaped > 0 {
                    tracing::debug!(reaped, "Sandbox reaper pass complete");
                }
            }
        })
    }
}
