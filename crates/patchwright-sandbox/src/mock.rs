//! In-memory mock backend for tests

use crate::backend::{CommandOutput, SandboxBackend, SandboxHandle};
use crate::{SandboxError, SandboxResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type SharedFiles = Arc<Mutex<HashMap<String, String>>>;
type ScriptedResponses = Arc<Mutex<Vec<(String, CommandOutput)>>>;
type CommandLog = Arc<Mutex<Vec<String>>>;

/// Scriptable in-memory sandbox backend
///
/// Files live in a map shared across handles so tests can seed content before
/// the pipeline creates its sandbox. Commands succeed with empty output
/// unless a scripted response matches (first substring match wins). Every
/// executed command is recorded for assertions.
#[derive(Default)]
pub struct MockBackend {
    files: SharedFiles,
    responses: ScriptedResponses,
    once_responses: ScriptedResponses,
    commands: CommandLog,
    fail_kills: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every kill fail, to exercise cleanup-before-kill handling
    #[must_use]
    pub fn failing_kills(mut self) -> Self {
        self.fail_kills = true;
        self
    }

    /// Seed a file visible to every sandbox created by this backend
    pub fn seed_file(&self, path: &str, content: &str) {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.to_string(), content.to_string());
        }
    }

    /// Script the output for commands containing `pattern`
    pub fn respond_to(&self, pattern: &str, output: CommandOutput) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push((pattern.to_string(), output));
        }
    }

    /// Script a one-shot output consumed by the first matching command
    ///
    /// One-shot responses take precedence over persistent ones and are
    /// checked in insertion order.
    pub fn respond_once(&self, pattern: &str, output: CommandOutput) {
        if let Ok(mut responses) = self.once_responses.lock() {
            responses.push((pattern.to_string(), output));
        }
    }

    /// Script a one-shot failure for commands containing `pattern`
    pub fn fail_command_once(&self, pattern: &str, stderr: &str) {
        self.respond_once(
            pattern,
            CommandOutput {
                stdout: String::new(),
                stderr: stderr.to_string(),
                exit_code: 1,
            },
        );
    }

    /// Script a failure (non-zero exit) for commands containing `pattern`
    pub fn fail_command(&self, pattern: &str, stderr: &str) {
        self.respond_to(
            pattern,
            CommandOutput {
                stdout: String::new(),
                stderr: stderr.to_string(),
                exit_code: 1,
            },
        );
    }

    /// Commands executed so far, in order
    pub fn executed_commands(&self) -> Vec<String> {
        self.commands.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Current content of a seeded or written file
    pub fn file_content(&self, path: &str) -> Option<String> {
        self.files.lock().ok()?.get(path).cloned()
    }
}

#[async_trait]
impl SandboxBackend for MockBackend {
    async fn create(&self, _sandbox_id: &str) -> SandboxResult<Box<dyn SandboxHandle>> {
        Ok(Box::new(MockHandle {
            files: Arc::clone(&self.files),
            responses: Arc::clone(&self.responses),
            once_responses: Arc::clone(&self.once_responses),
            commands: Arc::clone(&self.commands),
            fail_kill: self.fail_kills,
        }))
    }
}

struct MockHandle {
    files: SharedFiles,
    responses: ScriptedResponses,
    once_responses: ScriptedResponses,
    commands: CommandLog,
    fail_kill: bool,
}

#[async_trait]
impl SandboxHandle for MockHandle {
    async fn run_command(
        &self,
        command: &str,
        _cwd: Option<&str>,
        _timeout: Duration,
    ) -> SandboxResult<CommandOutput> {
        if let Ok(mut log) = self.commands.lock() {
            log.push(command.to_string());
        }

        let one_shot = self.once_responses.lock().ok().and_then(|mut responses| {
            responses
                .iter()
                .position(|(pattern, _)| command.contains(pattern.as_str()))
                .map(|index| responses.remove(index).1)
        });

        let scripted = one_shot.or_else(|| {
            self.responses.lock().ok().and_then(|responses| {
                responses
                    .iter()
                    .find(|(pattern, _)| command.contains(pattern.as_str()))
                    .map(|(_, output)| output.clone())
            })
        });

        Ok(scripted.unwrap_or(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
        }))
    }

    async fn read_file(&self, path: &str) -> SandboxResult<String> {
        self.files
            .lock()
            .ok()
            .and_then(|files| files.get(path).cloned())
            .ok_or_else(|| SandboxError::FileNotFound(path.to_string()))
    }

    async fn write_file(&self, path: &str, content: &str) -> SandboxResult<()> {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.to_string(), content.to_string());
        }
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> SandboxResult<()> {
        if let Ok(mut files) = self.files.lock() {
            files.remove(path);
        }
        Ok(())
    }

    async fn file_exists(&self, path: &str) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }

    async fn file_tree(&self, dir: &str) -> SandboxResult<Vec<String>> {
        let prefix = if dir == "." || dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir.trim_end_matches('/'))
        };

        let mut paths: Vec<String> = self
            .files
            .lock()
            .map(|files| {
                files
                    .keys()
                    .filter(|path| path.starts_with(&prefix))
                    .map(|path| path[prefix.len()..].to_string())
                    .collect()
            })
            .unwrap_or_default();
        paths.sort();
        Ok(paths)
    }

    async fn kill(&self) -> SandboxResult<()> {
        if self.fail_kill {
            return Err(SandboxError::Backend("scripted kill failure".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_responses_match_by_substring() {
        let backend = MockBackend::new();
        backend.fail_command("npm test", "2 tests failed");

        let handle = backend.create("p").await.unwrap();
        let failing = handle
            .run_command("npm test -- --ci", None, Duration::from_secs(1))
            .await
            .unwrap();
        let passing = handle
            .run_command("npm run build", None, Duration::from_secs(1))
            .await
            .unwrap();

        assert!(!failing.success());
        assert!(failing.stderr.contains("2 tests failed"));
        assert!(passing.success());
        assert_eq!(backend.executed_commands().len(), 2);
    }

    #[tokio::test]
    async fn seeded_files_are_visible() {
        let backend = MockBackend::new();
        backend.seed_file("package.json", "{}");

        let handle = backend.create("p").await.unwrap();
        assert!(handle.file_exists("package.json").await);
        assert_eq!(handle.read_file("package.json").await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn tree_strips_directory_prefix() {
        let backend = MockBackend::new();
        backend.seed_file("repo/src/a.ts", "a");
        backend.seed_file("repo/b.ts", "b");
        backend.seed_file("other/c.ts", "c");

        let handle = backend.create("p").await.unwrap();
        let tree = handle.file_tree("repo").await.unwrap();
        assert_eq!(tree, vec!["b.ts", "src/a.ts"]);
    }
}
