//! Chunk domain model

use serde::{Deserialize, Serialize};

/// The syntactic category a chunk was extracted as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// A top-level function declaration or variable-bound function expression
    Function,
    /// A class declaration
    Class,
    /// A fixed-line window (fallback for non-syntactic files)
    Lines,
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Lines => "lines",
        };
        write!(f, "{kind}")
    }
}

/// An addressable unit of source code
///
/// Chunks are immutable once created; reindexing a file replaces all of its
/// chunks atomically. The `id` is stable per `(file_path, kind, name-or-range)`
/// so the same source produces the same ids on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable chunk identifier, e.g. `src/util.ts_fn_parseConfig`
    pub id: String,
    /// Repository this chunk belongs to
    pub repo_id: String,
    /// Path of the source file relative to the repository root
    pub file_path: String,
    /// File name component of the path
    pub file_name: String,
    /// File extension (lowercase, without the dot)
    pub file_type: String,
    /// Function or class name when the chunk is a named definition
    pub function_name: Option<String>,
    /// First line of the chunk (1-indexed, inclusive)
    pub line_start: usize,
    /// Last line of the chunk (1-indexed, inclusive)
    pub line_end: usize,
    /// The chunk text
    pub content: String,
    /// What kind of chunk this is
    pub kind: ChunkKind,
}

impl Chunk {
    /// Build the stable id for a named definition chunk
    pub fn definition_id(file_path: &str, kind: ChunkKind, name: &str) -> String {
        match kind {
            ChunkKind::Function => format!("{file_path}_fn_{name}"),
            ChunkKind::Class => format!("{file_path}_class_{name}"),
            ChunkKind::Lines => format!("{file_path}_lines_{name}"),
        }
    }

    /// Build the stable id for a line-window chunk
    pub fn window_id(file_path: &str, line_start: usize, line_end: usize) -> String {
        format!("{file_path}_lines_{line_start}_{line_end}")
    }
}

/// Extract the file name component of a path
pub(crate) fn file_name_of(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// Extract the lowercase extension of a path (empty when absent)
pub(crate) fn extension_of(path: &str) -> String {
    let name = file_name_of(path);
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}
