//! Webhook event classification and payload types

use patchwright_queue::ChangedFiles;
use serde::{Deserialize, Serialize};

/// Recognised event categories, from the delivery's event header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Installation,
    InstallationRepositories,
    Push,
    PullRequest,
    Ping,
    Repository,
    Unknown(String),
}

impl EventKind {
    /// Classify the event header value
    pub fn classify(header: &str) -> Self {
        match header {
            "installation" => Self::Installation,
            "installation_repositories" => Self::InstallationRepositories,
            "push" => Self::Push,
            "pull_request" => Self::PullRequest,
            "ping" => Self::Ping,
            "repository" => Self::Repository,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Repository fragment common to several payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub clone_url: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// One commit of a push delivery
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushCommit {
    pub id: String,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pusher {
    pub name: String,
}

/// A `push` event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub before: String,
    pub after: String,
    pub repository: RepositoryInfo,
    #[serde(default)]
    pub commits: Vec<PushCommit>,
    #[serde(default)]
    pub pusher: Option<Pusher>,
}

impl PushPayload {
    /// Branch name from the ref (`refs/heads/main` -> `main`)
    pub fn branch(&self) -> &str {
        self.git_ref
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.git_ref)
    }
}

/// A `pull_request` event payload (only the fields the dispatcher reads)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestPayload {
    pub action: String,
    pub number: u64,
    pub pull_request: PullRequestInfo,
    pub repository: RepositoryInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub head: GitRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
}

/// Account fragment of installation payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub login: String,
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
}

/// An `installation` / `installation_repositories` event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallationPayload {
    pub action: String,
    pub installation: InstallationInfo,
    #[serde(default)]
    pub repositories: Vec<RepositoryInfo>,
    #[serde(default)]
    pub repositories_added: Vec<RepositoryInfo>,
    #[serde(default)]
    pub repositories_removed: Vec<RepositoryInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallationInfo {
    pub id: i64,
    pub account: AccountInfo,
}

/// Union of changed files across every commit in the push, de-duplicated
///
/// A file appearing in multiple categories keeps each membership; the
/// indexing pipeline treats removal after re-add per the final sets.
pub fn extract_changed_files(commits: &[PushCommit]) -> ChangedFiles {
    let mut changed = ChangedFiles::default();
    let mut seen_added = std::collections::HashSet::new();
    let mut seen_modified = std::collections::HashSet::new();
    let mut seen_removed = std::collections::HashSet::new();

    for commit in commits {
        for file in &commit.added {
            if seen_added.insert(file.clone()) {
                changed.added.push(file.clone());
            }
        }
        for file in &commit.modified {
            if seen_modified.insert(file.clone()) {
                changed.modified.push(file.clone());
            }
        }
        for file in &commit.removed {
            if seen_removed.insert(file.clone()) {
                changed.removed.push(file.clone());
            }
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_headers() {
        assert_eq!(EventKind::classify("push"), EventKind::Push);
        assert_eq!(EventKind::classify("pull_request"), EventKind::PullRequest);
        assert_eq!(
            EventKind::classify("installation_repositories"),
            EventKind::InstallationRepositories
        );
        assert_eq!(
            EventKind::classify("workflow_run"),
            EventKind::Unknown("workflow_run".to_string())
        );
    }

    #[test]
    fn changed_files_union_deduplicates_across_commits() {
        let commits = vec![
            PushCommit {
                id: "c1".to_string(),
                added: vec!["a.ts".to_string()],
                modified: vec!["b.ts".to_string()],
                removed: vec![],
            },
            PushCommit {
                id: "c2".to_string(),
                added: vec!["a.ts".to_string()],
                modified: vec!["b.ts".to_string(), "c.ts".to_string()],
                removed: vec!["d.ts".to_string()],
            },
        ];

        let changed = extract_changed_files(&commits);
        assert_eq!(changed.added, vec!["a.ts"]);
        assert_eq!(changed.modified, vec!["b.ts", "c.ts"]);
        assert_eq!(changed.removed, vec!["d.ts"]);
        assert_eq!(changed.total(), 4);
    }

    #[test]
    fn branch_strips_ref_prefix() {
        let payload: PushPayload = serde_json::from_value(serde_json::json!({
            "ref": "refs/heads/feature/login",
            "before": "a",
            "after": "b",
            "repository": {"id": 1, "name": "app", "full_name": "octo/app"},
        }))
        .unwrap();
        assert_eq!(payload.branch(), "feature/login");
    }
}
