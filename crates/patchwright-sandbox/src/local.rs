//! Process-backed sandbox running under a scoped workspace directory

use crate::backend::{CommandOutput, SandboxBackend, SandboxHandle};
use crate::{SandboxError, SandboxResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// Backend that executes commands as local processes, each sandbox confined
/// to its own workspace directory
pub struct LocalProcessBackend {
    root: PathBuf,
    // Owns the temp dir when the backend was created with `temporary()`
    _tempdir: Option<tempfile::TempDir>,
}

impl LocalProcessBackend {
    /// Use an existing directory as the sandbox root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            _tempdir: None,
        }
    }

    /// Back sandboxes with a temp dir removed when the backend drops
    ///
    /// # Errors
    /// Returns an error when the temp dir cannot be created.
    pub fn temporary() -> SandboxResult<Self> {
        let tempdir = tempfile::tempdir()?;
        Ok(Self {
            root: tempdir.path().to_path_buf(),
            _tempdir: Some(tempdir),
        })
    }
}

#[async_trait]
impl SandboxBackend for LocalProcessBackend {
    async fn create(&self, sandbox_id: &str) -> SandboxResult<Box<dyn SandboxHandle>> {
        let workspace = self.root.join(sandbox_id);
        tokio::fs::create_dir_all(&workspace).await?;
        Ok(Box::new(LocalSandboxHandle { workspace }))
    }
}

struct LocalSandboxHandle {
    workspace: PathBuf,
}

impl LocalSandboxHandle {
    fn resolve(&self, path: &str) -> SandboxResult<PathBuf> {
        // Reject traversal out of the workspace
        let trimmed = path.trim_start_matches('/');
        let joined = self.workspace.join(trimmed);
        if joined
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(SandboxError::Other(format!(
                "Path escapes sandbox workspace: {path}"
            )));
        }
        Ok(joined)
    }
}

#[async_trait]
impl SandboxHandle for LocalSandboxHandle {
    async fn run_command(
        &self,
        command: &str,
        cwd: Option<&str>,
        timeout: Duration,
    ) -> SandboxResult<CommandOutput> {
        let working_dir = match cwd {
            Some(dir) => self.resolve(dir)?,
            None => self.workspace.clone(),
        };

        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&working_dir)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(timeout, child)
            .await
            .map_err(|_| SandboxError::Timeout {
                command: command.to_string(),
                seconds: timeout.as_secs(),
            })??;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    async fn read_file(&self, path: &str) -> SandboxResult<String> {
        let resolved = self.resolve(path)?;
        tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => SandboxError::FileNotFound(path.to_string()),
                _ => SandboxError::Io(e),
            })
    }

    async fn write_file(&self, path: &str, content: &str) -> SandboxResult<()> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&resolved, content).await?;
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> SandboxResult<()> {
        let resolved = self.resolve(path)?;
        match tokio::fs::remove_file(&resolved).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SandboxError::Io(e)),
        }
    }

    async fn file_exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(resolved) => tokio::fs::try_exists(&resolved).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn file_tree(&self, dir: &str) -> SandboxResult<Vec<String>> {
        let base = self.resolve(dir)?;
        let root = base.clone();

        // walkdir is synchronous; the listing is small and bounded
        let paths = tokio::task::spawn_blocking(move || {
            let mut paths = Vec::new();
            for entry in walkdir::WalkDir::new(&root)
                .into_iter()
                .filter_map(Result::ok)
            {
                if entry.file_type().is_file()
                    && let Ok(relative) = entry.path().strip_prefix(&root)
                {
                    paths.push(relative.to_string_lossy().into_owned());
                }
            }
            paths.sort();
            paths
        })
        .await
        .map_err(|e| SandboxError::Other(format!("file tree task failed: {e}")))?;

        Ok(paths)
    }

    async fn kill(&self) -> SandboxResult<()> {
        match tokio::fs::remove_dir_all(&self.workspace).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SandboxError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn handle() -> (LocalProcessBackend, Box<dyn SandboxHandle>) {
        let backend = LocalProcessBackend::temporary().unwrap();
        let handle = backend.create("proj_test").await.unwrap();
        (backend, handle)
    }

    #[tokio::test]
    async fn write_read_round_trip_creates_parents() {
        let (_backend, sandbox) = handle().await;
        sandbox
            .write_file("src/deep/nested/file.ts", "content")
            .await
            .unwrap();

        assert_eq!(
            sandbox.read_file("src/deep/nested/file.ts").await.unwrap(),
            "content"
        );
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let (_backend, sandbox) = handle().await;
        let err = sandbox.read_file("nope.ts").await.unwrap_err();
        assert!(matches!(err, SandboxError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_backend, sandbox) = handle().await;
        sandbox.write_file("a.ts", "x").await.unwrap();
        sandbox.delete_file("a.ts").await.unwrap();
        sandbox.delete_file("a.ts").await.unwrap();
        assert!(!sandbox.file_exists("a.ts").await);
    }

    #[tokio::test]
    async fn commands_run_in_workspace() {
        let (_backend, sandbox) = handle().await;
        sandbox.write_file("hello.txt", "hi").await.unwrap();

        let output = sandbox
            .run_command("ls", None, Duration::from_secs(10))
            .await
            .unwrap();

        assert!(output.success());
        assert!(output.stdout.contains("hello.txt"));
    }

    #[tokio::test]
    async fn command_timeout_is_enforced() {
        let (_backend, sandbox) = handle().await;
        let err = sandbox
            .run_command("sleep 5", None, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, SandboxError::Timeout { .. }));
    }

    #[tokio::test]
    async fn file_tree_lists_relative_paths() {
        let (_backend, sandbox) = handle().await;
        sandbox.write_file("src/a.ts", "a").await.unwrap();
        sandbox.write_file("src/sub/b.ts", "b").await.unwrap();

        let tree = sandbox.file_tree(".").await.unwrap();
        assert_eq!(tree, vec!["src/a.ts", "src/sub/b.ts"]);
    }

    #[tokio::test]
    async fn traversal_outside_workspace_is_rejected() {
        let (_backend, sandbox) = handle().await;
        assert!(sandbox.read_file("../outside.txt").await.is_err());
    }
}
