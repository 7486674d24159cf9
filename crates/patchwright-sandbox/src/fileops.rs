//! Structured file operations applied to a sandbox
//!
//! The generation pipeline's LLM output is a list of these tagged operations.
//! Unknown operation tags are rejected at deserialization time.

use crate::manager::Sandbox;
use crate::SandboxResult;
use serde::{Deserialize, Serialize};

/// One search/replace entry of an update operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReplace {
    pub search: String,
    pub replace: String,
}

/// A file mutation requested by the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FileOperation {
    /// Create a new file with the given content
    #[serde(rename = "createFile")]
    CreateFile { path: String, content: String },

    /// Replace an existing file's entire content
    #[serde(rename = "rewriteFile")]
    RewriteFile { path: String, content: String },

    /// Apply search/replace entries to an existing file
    #[serde(rename = "updateFile")]
    UpdateFile {
        path: String,
        #[serde(rename = "searchReplace")]
        search_replace: Vec<SearchReplace>,
    },

    /// Delete a file
    #[serde(rename = "deleteFile")]
    DeleteFile { path: String },
}

impl FileOperation {
    /// The path this operation touches
    pub fn path(&self) -> &str {
        match self {
            Self::CreateFile { path, .. }
            | Self::RewriteFile { path, .. }
            | Self::UpdateFile { path, .. }
            | Self::DeleteFile { path } => path,
        }
    }
}

/// What happened when one operation was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOperationOutcome {
    pub path: String,
    /// For updates: whether any search/replace entry substituted something
    pub substituted: bool,
}

/// Apply operations to the sandbox working tree under `repo_root`
///
/// Update entries try a regex replacement first and fall back to a literal
/// replacement; when no entry substitutes anything the (unchanged) buffer is
/// still written back and a warning logged.
///
/// # Errors
/// Returns the first sandbox I/O failure; individual no-match updates are not
/// errors.
pub async fn execute_file_operations(
    sandbox: &Sandbox,
    operations: &[FileOperation],
    repo_root: &str,
) -> SandboxResult<Vec<FileOperationOutcome>> {
    let mut outcomes = Vec::with_capacity(operations.len());

    for operation in operations {
        let path = join_repo_path(repo_root, operation.path());
        match operation {
            FileOperation::CreateFile { content, .. }
            | FileOperation::RewriteFile { content, .. } => {
                sandbox.write_file(&path, content).await?;
                outcomes.push(FileOperationOutcome {
                    path,
                    substituted: true,
                });
            }
            FileOperation::UpdateFile { search_replace, .. } => {
                let mut buffer = sandbox.read_file(&path).await?;
                let mut substituted = false;

                for entry in search_replace {
                    let (next, changed) = apply_search_replace(&buffer, entry);
                    substituted |= changed;
                    buffer = next;
                }

                if !substituted {
                    tracing::warn!(
                        file = %path,
                        entries = search_replace.len(),
                        "No search/replace entry matched; writing buffer back unchanged"
                    );
                }

                sandbox.write_file(&path, &buffer).await?;
                outcomes.push(FileOperationOutcome { path, substituted });
            }
            FileOperation::DeleteFile { .. } => {
                sandbox.delete_file(&path).await?;
                outcomes.push(FileOperationOutcome {
                    path,
                    substituted: true,
                });
            }
        }
    }

    Ok(outcomes)
}

/// Apply one entry: regex replacement when the pattern compiles and matches,
/// otherwise a literal replacement
fn apply_search_replace(buffer: &str, entry: &SearchReplace) -> (String, bool) {
    if let Ok(pattern) = regex::Regex::new(&entry.search)
        && pattern.is_match(buffer)
    {
        let replaced = pattern
            .replace_all(buffer, regex::NoExpand(&entry.replace))
            .into_owned();
        return (replaced, true);
    }

    if buffer.contains(&entry.search) {
        (buffer.replace(&entry.search, &entry.replace), true)
    } else {
        (buffer.to_string(), false)
    }
}

fn join_repo_path(repo_root: &str, path: &str) -> String {
    let root = repo_root.trim_end_matches('/');
    let relative = path.trim_start_matches('/');
    if root.is_empty() || relative.starts_with(&format!("{root}/")) {
        relative.to_string()
    } else {
        format!("{root}/{relative}")
    }
}
