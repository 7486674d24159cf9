//! File-diff generation for successful runs
//!
//! Diffs are presentation data attached to the job result; they never gate
//! the pull request itself. Lock files are excluded from presentation but
//! not from the PR.

use patchwright_sandbox::Sandbox;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lock-file paths excluded from diff presentation
pub const LOCKFILE_DENYLIST: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    "Gemfile.lock",
    "go.sum",
    "poetry.lock",
];

/// One presented diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub diff: String,
}

fn is_denylisted(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    LOCKFILE_DENYLIST.contains(&file_name)
}

/// Synthesize a unified diff when git has nothing to compare against
/// (new file, or a deletion where only the old side exists)
pub fn synthesize_unified_diff(path: &str, old: Option<&str>, new: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- a/{path}\n+++ b/{path}\n"));

    match (old, new) {
        (None, Some(new)) => {
            let count = new.lines().count();
            out.push_str(&format!("@@ -0,0 +1,{count} @@\n"));
            for line in new.lines() {
                out.push_str(&format!("+{line}\n"));
            }
        }
        (Some(old), None) => {
            let count = old.lines().count();
            out.push_str(&format!("@@ -1,{count} +0,0 @@\n"));
            for line in old.lines() {
                out.push_str(&format!("-{line}\n"));
            }
        }
        _ => {}
    }

    out
}

/// Collect per-file diffs for the operated paths against the default branch
///
/// Diff failures are per-file non-fatal: a path whose diff cannot be read is
/// skipped with a warning.
pub async fn collect_file_diffs(
    sandbox: &Sandbox,
    repo_root: &str,
    default_branch: &str,
    paths: &[String],
    command_timeout: Duration,
) -> Vec<FileDiff> {
    let mut diffs = Vec::new();

    for path in paths {
        let repo_relative = path
            .strip_prefix(&format!("{repo_root}/"))
            .unwrap_or(path.as_str());

        if is_denylisted(repo_relative) {
            tracing::debug!(file = %repo_relative, "Lock file excluded from diff presentation");
            continue;
        }

        let command = format!("git diff origin/{default_branch} -- '{repo_relative}'");
        let output = match sandbox
            .run_command(&command, Some(repo_root), command_timeout)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(file = %repo_relative, error = %e, "Skipping diff");
                continue;
            }
        };

        if output.success() && !output.stdout.trim().is_empty() {
            diffs.push(FileDiff {
                path: repo_relative.to_string(),
                diff: output.stdout,
            });
            continue;
        }

        // Nothing from the SCM: synthesize from whichever side exists
        let current = sandbox.read_file(path).await.ok();
        let old_output = sandbox
            .run_command(
                &format!("git show origin/{default_branch}:'{repo_relative}'"),
                Some(repo_root),
                command_timeout,
            )
            .await
            .ok();
        let old = old_output
            .filter(patchwright_sandbox::CommandOutput::success)
            .map(|o| o.stdout);

        if current.is_none() && old.is_none() {
            continue;
        }
        diffs.push(FileDiff {
            path: repo_relative.to_string(),
            diff: synthesize_unified_diff(repo_relative, old.as_deref(), current.as_deref()),
        });
    }

    diffs
}

/// Detect the default branch by ref presence: `origin/main` wins over
/// `origin/master`
pub async fn detect_default_branch(
    sandbox: &Sandbox,
    repo_root: &str,
    command_timeout: Duration,
) -> String {
    for candidate in ["main", "master"] {
        let command = format!("git rev-parse --verify --quiet origin/{candidate}");
        if let Ok(output) = sandbox
            .run_command(&command, Some(repo_root), command_timeout)
            .await
            && output.success()
        {
            return candidate.to_string();
        }
    }
    "main".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denylist_matches_by_file_name() {
        assert!(is_denylisted("package-lock.json"));
        assert!(is_denylisted("apps/web/yarn.lock"));
        assert!(!is_denylisted("src/lockfile-parser.ts"));
    }

    #[test]
    fn synthesizes_addition_diff() {
        let diff = synthesize_unified_diff("src/new.ts", None, Some("line1\nline2\n"));
        assert!(diff.starts_with("--- a/src/new.ts\n+++ b/src/new.ts\n"));
        assert!(diff.contains("@@ -0,0 +1,2 @@"));
        assert!(diff.contains("+line1\n+line2\n"));
    }

    #[test]
    fn synthesizes_deletion_diff() {
        let diff = synthesize_unified_diff("src/old.ts", Some("gone\n"), None);
        assert!(diff.contains("@@ -1,1 +0,0 @@"));
        assert!(diff.contains("-gone\n"));
    }
}
