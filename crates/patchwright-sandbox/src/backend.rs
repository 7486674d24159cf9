//! Sandbox backend abstraction

use crate::SandboxResult;
use async_trait::async_trait;
use std::time::Duration;

/// Captured result of one shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Combined output for error reporting
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Provider abstraction: creates isolated execution environments
#[async_trait]
pub trait SandboxBackend: Send + Sync {
    /// Create a new isolated environment for the given sandbox id
    async fn create(&self, sandbox_id: &str) -> SandboxResult<Box<dyn SandboxHandle>>;
}

/// One isolated environment
///
/// Paths are relative to the environment root. Commands run serialised by the
/// caller; the handle itself makes no concurrency promises.
#[async_trait]
pub trait SandboxHandle: Send + Sync {
    /// Run a shell command, optionally in a working directory, bounded by a timeout
    async fn run_command(
        &self,
        command: &str,
        cwd: Option<&str>,
        timeout: Duration,
    ) -> SandboxResult<CommandOutput>;

    /// Read a file as UTF-8 text
    async fn read_file(&self, path: &str) -> SandboxResult<String>;

    /// Write a file, creating parent directories as needed
    async fn write_file(&self, path: &str, content: &str) -> SandboxResult<()>;

    /// Delete a file (missing files are not an error)
    async fn delete_file(&self, path: &str) -> SandboxResult<()>;

    /// Whether a file exists
    async fn file_exists(&self, path: &str) -> bool;

    /// Recursively list files under a directory, relative paths, sorted
    async fn file_tree(&self, dir: &str) -> SandboxResult<Vec<String>>;

    /// Destroy the environment
    async fn kill(&self) -> SandboxResult<()>;
}
