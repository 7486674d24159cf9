//! Splits source files into addressable chunks
//!
//! Files in the syntactic extension set are parsed with tree-sitter and
//! chunked per top-level definition. Other files, parse failures, and parses
//! that yield zero definitions all fall back to fixed-line windows.

use crate::languages::language_for_extension;
use crate::model::{Chunk, ChunkKind, extension_of, file_name_of};
use tree_sitter::{Language, Node, Parser};

/// Default number of lines per fallback window chunk
pub const DEFAULT_WINDOW_LINES: usize = 100;

/// Splits file content into chunks for indexing
#[derive(Debug, Clone)]
pub struct Chunker {
    window_lines: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_LINES)
    }
}

impl Chunker {
    /// Create a chunker with a custom fallback window size
    pub fn new(window_lines: usize) -> Self {
        Self {
            window_lines: window_lines.max(1),
        }
    }

    /// Chunk a single file
    ///
    /// Never fails: structural parse errors are logged and the file is
    /// line-windowed instead.
    pub fn chunk_file(&self, repo_id: &str, file_path: &str, content: &str) -> Vec<Chunk> {
        // Normalize line endings so line numbers are consistent across platforms
        let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
        let extension = extension_of(file_path);

        if let Some(language) = language_for_extension(&extension) {
            match Self::chunk_syntactic(repo_id, file_path, &extension, &normalized, &language) {
                Some(chunks) if !chunks.is_empty() => return chunks,
                Some(_) => {
                    tracing::debug!(
                        file = %file_path,
                        "No top-level definitions found, using line windows"
                    );
                }
                None => {
                    tracing::warn!(
                        file = %file_path,
                        "Syntactic parse failed, falling back to line windows"
                    );
                }
            }
        }

        self.chunk_windows(repo_id, file_path, &extension, &normalized)
    }

    /// Parse with tree-sitter and emit a chunk per top-level definition
    ///
    /// Returns `None` on parser setup/parse failure so the caller can fall back.
    fn chunk_syntactic(
        repo_id: &str,
        file_path: &str,
        extension: &str,
        content: &str,
        language: &Language,
    ) -> Option<Vec<Chunk>> {
        let mut parser = Parser::new();
        parser.set_language(language).ok()?;
        let tree = parser.parse(content, None)?;

        let root = tree.root_node();
        let mut chunks = Vec::new();
        let mut cursor = root.walk();

        for child in root.children(&mut cursor) {
            // `export function f() {}` wraps the declaration; chunk the whole
            // statement so the export keyword stays in the chunk text
            let (outer, declaration) = match child.kind() {
                "export_statement" => match child.child_by_field_name("declaration") {
                    Some(decl) => (child, decl),
                    None => continue,
                },
                _ => (child, child),
            };

            match declaration.kind() {
                "function_declaration" | "generator_function_declaration" => {
                    let name = node_name(&declaration, content)
                        .unwrap_or_else(|| "default".to_string());
                    chunks.push(Self::definition_chunk(
                        repo_id,
                        file_path,
                        extension,
                        content,
                        &outer,
                        ChunkKind::Function,
                        name,
                    ));
                }
                "class_declaration" | "abstract_class_declaration" => {
                    let name = node_name(&declaration, content)
                        .unwrap_or_else(|| "default".to_string());
                    chunks.push(Self::definition_chunk(
                        repo_id,
                        file_path,
                        extension,
                        content,
                        &outer,
                        ChunkKind::Class,
                        name,
                    ));
                }
                "lexical_declaration" | "variable_declaration" => {
                    // Chunk `const f = () => {}` / `var g = function () {}` as functions
                    let mut decl_cursor = declaration.walk();
                    for declarator in declaration.children(&mut decl_cursor) {
                        if declarator.kind() != "variable_declarator" {
                            continue;
                        }
                        let is_function_value = declarator
                            .child_by_field_name("value")
                            .is_some_and(|value| {
                                matches!(
                                    value.kind(),
                                    "arrow_function" | "function_expression" | "function"
                                )
                            });
                        if !is_function_value {
                            continue;
                        }
                        let Some(name) = node_name(&declarator, content) else {
                            continue;
                        };
                        chunks.push(Self::definition_chunk(
                            repo_id,
                            file_path,
                            extension,
                            content,
                            &outer,
                            ChunkKind::Function,
                            name,
                        ));
                    }
                }
                _ => {}
            }
        }

        Some(chunks)
    }

    fn definition_chunk(
        repo_id: &str,
        file_path: &str,
        extension: &str,
        content: &str,
        node: &Node<'_>,
        kind: ChunkKind,
        name: String,
    ) -> Chunk {
        let line_start = node.start_position().row + 1;
        let line_end = node.end_position().row + 1;
        let text = content
            .get(node.byte_range())
            .unwrap_or_default()
            .to_string();

        Chunk {
            id: Chunk::definition_id(file_path, kind, &name),
            repo_id: repo_id.to_string(),
            file_path: file_path.to_string(),
            file_name: file_name_of(file_path),
            file_type: extension.to_string(),
            function_name: Some(name),
            line_start,
            line_end,
            content: text,
            kind,
        }
    }

    /// Fixed-line windowing for everything outside the syntactic set
    fn chunk_windows(
        &self,
        repo_id: &str,
        file_path: &str,
        extension: &str,
        content: &str,
    ) -> Vec<Chunk> {
        let lines: Vec<&str> = content.lines().collect();
        if lines.is_empty() {
            return Vec::new();
        }

        lines
            .chunks(self.window_lines)
            .enumerate()
            .map(|(index, window)| {
                let line_start = index * self.window_lines + 1;
                let line_end = line_start + window.len() - 1;
                Chunk {
                    id: Chunk::window_id(file_path, line_start, line_end),
                    repo_id: repo_id.to_string(),
                    file_path: file_path.to_string(),
                    file_name: file_name_of(file_path),
                    file_type: extension.to_string(),
                    function_name: None,
                    line_start,
                    line_end,
                    content: window.join("\n"),
                    kind: ChunkKind::Lines,
                }
            })
            .collect()
    }
}

/// Extract the `name` field text of a node
fn node_name(node: &Node<'_>, content: &str) -> Option<String> {
    let name_node = node.child_by_field_name("name")?;
    content
        .get(name_node.byte_range())
        .map(std::string::ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker() -> Chunker {
        Chunker::default()
    }

    #[test]
    fn typescript_functions_and_classes() {
        let code = r#"
export function parseConfig(raw: string): Config {
    return JSON.parse(raw);
}

const toUpper = (s: string) => s.toUpperCase();

export class ConfigStore {
    private items: Map<string, Config> = new Map();

    get(key: string): Config | undefined {
        return this.items.get(key);
    }
}
"#;
        let chunks = chunker().chunk_file("repo-1", "src/config.ts", code);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].id, "src/config.ts_fn_parseConfig");
        assert_eq!(chunks[0].kind, ChunkKind::Function);
        assert!(chunks[0].content.starts_with("export function parseConfig"));

        assert_eq!(chunks[1].id, "src/config.ts_fn_toUpper");
        assert_eq!(chunks[1].function_name.as_deref(), Some("toUpper"));

        assert_eq!(chunks[2].id, "src/config.ts_class_ConfigStore");
        assert_eq!(chunks[2].kind, ChunkKind::Class);
    }

    #[test]
    fn single_function_spanning_file_yields_one_chunk() {
        let code = "function only() {\n    return 1;\n}\n";
        let chunks = chunker().chunk_file("repo-1", "src/only.js", code);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "src/only.js_fn_only");
        assert_eq!(chunks[0].line_start, 1);
        assert_eq!(chunks[0].line_end, 3);
    }

    #[test]
    fn syntactic_file_without_definitions_falls_back_to_windows() {
        let code = "const answer = 42;\nconsole.log(answer);\n";
        let chunks = chunker().chunk_file("repo-1", "src/main.ts", code);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, ChunkKind::Lines);
        assert_eq!(chunks[0].id, "src/main.ts_lines_1_2");
    }

    #[test]
    fn unknown_extension_is_line_windowed() {
        let line = "some text\n";
        let code = line.repeat(250);
        let chunks = Chunker::new(100).chunk_file("repo-1", "NOTES.md", &code);

        assert_eq!(chunks.len(), 3);
        assert_eq!((chunks[0].line_start, chunks[0].line_end), (1, 100));
        assert_eq!((chunks[1].line_start, chunks[1].line_end), (101, 200));
        assert_eq!((chunks[2].line_start, chunks[2].line_end), (201, 250));
        assert_eq!(chunks[2].id, "NOTES.md_lines_201_250");
    }

    #[test]
    fn empty_file_yields_no_chunks() {
        let chunks = chunker().chunk_file("repo-1", "empty.ts", "");
        assert!(chunks.is_empty());
    }

    #[test]
    fn ids_are_stable_across_runs() {
        let code = "export function stable() { return true; }\n";
        let first = chunker().chunk_file("repo-1", "src/s.ts", code);
        let second = chunker().chunk_file("repo-1", "src/s.ts", code);

        let first_ids: Vec<_> = first.iter().map(|c| c.id.clone()).collect();
        let second_ids: Vec<_> = second.iter().map(|c| c.id.clone()).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn tsx_components_are_chunked() {
        let code = r#"
export function App() {
    return <div>hello</div>;
}
"#;
        let chunks = chunker().chunk_file("repo-1", "src/App.tsx", code);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "src/App.tsx_fn_App");
    }
}
