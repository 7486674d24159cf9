//! Typed payloads for the three job kinds

use serde::{Deserialize, Serialize};

/// Changed-file sets extracted from a push
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFiles {
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

impl ChangedFiles {
    /// Total files across all three sets
    pub fn total(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    /// Files that need re-chunking (added plus modified)
    pub fn reindexable(&self) -> Vec<String> {
        let mut files = self.added.clone();
        files.extend(self.modified.iter().cloned());
        files
    }
}

/// Payload of a full `index-repo` job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRepoPayload {
    pub project_id: String,
    pub repo_url: String,
    pub repo_id: String,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_id: Option<i64>,
    pub user_id: String,
    pub username: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pusher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "beforeSHA")]
    pub before_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "afterSHA")]
    pub after_sha: Option<String>,
}

/// Payload of an `incremental-index` job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementalIndexPayload {
    pub project_id: String,
    pub repo_url: String,
    pub repo_id: String,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_id: Option<i64>,
    pub user_id: String,
    pub username: String,
    pub timestamp: i64,
    #[serde(rename = "beforeSHA")]
    pub before_sha: String,
    #[serde(rename = "afterSHA")]
    pub after_sha: String,
    pub changed_files: ChangedFiles,
    pub total_changed_files: usize,
}

/// Payload of a generation `process` job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTaskPayload {
    pub repo_url: String,
    pub task: String,
    pub repo_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexing_job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_id: Option<i64>,
    pub user_id: String,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_payload_uses_camel_case_and_sha_casing() {
        let payload = IndexRepoPayload {
            project_id: "octo/app".to_string(),
            repo_url: "https://github.com/octo/app".to_string(),
            repo_id: "octo/app".to_string(),
            branch: "main".to_string(),
            installation_token: None,
            installation_id: Some(12),
            user_id: "u1".to_string(),
            username: "octo".to_string(),
            timestamp: 1_700_000_000,
            trigger: Some("webhook".to_string()),
            event: Some("push".to_string()),
            pusher: None,
            before_sha: Some("0".repeat(40)),
            after_sha: Some("abc123".to_string()),
        };

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"projectId\""));
        assert!(json.contains("\"beforeSHA\""));
        assert!(json.contains("\"afterSHA\""));
        assert!(!json.contains("installationToken"));
    }

    #[test]
    fn changed_files_totals_across_sets() {
        let changed = ChangedFiles {
            added: vec!["a.ts".to_string()],
            modified: vec!["b.ts".to_string(), "c.ts".to_string()],
            removed: vec!["d.ts".to_string()],
        };
        assert_eq!(changed.total(), 4);
        assert_eq!(changed.reindexable(), vec!["a.ts", "b.ts", "c.ts"]);
    }

    #[test]
    fn process_payload_round_trips() {
        let raw = r#"{
            "repoUrl": "https://github.com/octo/app",
            "task": "Rename foo to bar",
            "repoId": "octo/app",
            "indexingJobId": "job-1",
            "userId": "u1",
            "username": "octo"
        }"#;
        let payload: ProcessTaskPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.indexing_job_id.as_deref(), Some("job-1"));
        assert_eq!(payload.task, "Rename foo to bar");
    }
}
