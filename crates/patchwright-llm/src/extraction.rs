//! Parsing of model responses
//!
//! File selection is parsed liberally (models decorate lists in many ways);
//! generation output is parsed strictly against [`GenerateOutput`].

use crate::schema::GenerateOutput;
use crate::{LlmError, LlmResult};

/// Extensions accepted from the selection response
const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts", "py", "rb", "go", "rs", "java", "c",
    "h", "cpp", "hpp", "cs", "php", "swift", "kt", "vue", "svelte",
];

/// Liberally parse file paths from a selection response
///
/// Strips bullets, numbering, markdown emphasis, backticks, and quotes per
/// line; keeps lines that still have a path separator and a known source
/// extension; normalizes under `repo_root`; deduplicates preserving order.
pub fn parse_selected_paths(response: &str, repo_root: &str) -> Vec<String> {
    let root = repo_root.trim_end_matches('/');
    let mut seen = std::collections::HashSet::new();
    let mut paths = Vec::new();

    for line in response.lines() {
        let Some(candidate) = clean_line(line) else {
            continue;
        };
        if !candidate.contains('/') {
            continue;
        }
        let extension = candidate.rsplit('.').next().unwrap_or("").to_lowercase();
        if !SOURCE_EXTENSIONS.contains(&extension.as_str()) {
            continue;
        }

        let normalized = normalize_under_root(&candidate, root);
        if seen.insert(normalized.clone()) {
            paths.push(normalized);
        }
    }

    paths
}

/// Strip list decorations from one line
fn clean_line(line: &str) -> Option<String> {
    let mut cleaned = line.trim();

    // Leading bullets and numbering: "- ", "* ", "3. ", "3) "
    cleaned = cleaned.trim_start_matches(['-', '*', '+']).trim_start();
    if let Some(rest) = cleaned
        .split_once(['.', ')'])
        .filter(|(prefix, _)| !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()))
        .map(|(_, rest)| rest)
    {
        cleaned = rest.trim_start();
    }

    // Markdown emphasis, backticks, quotes
    let cleaned = cleaned.trim_matches(['`', '*', '_', '"', '\'', ' ']);

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Normalize a path to live under the repo root exactly once
fn normalize_under_root(path: &str, root: &str) -> String {
    let mut relative = path.trim_start_matches("./").trim_start_matches('/');
    if !root.is_empty() {
        let prefixed = format!("{root}/");
        while let Some(rest) = relative.strip_prefix(&prefixed) {
            relative = rest;
        }
    }

    if root.is_empty() {
        relative.to_string()
    } else {
        format!("{root}/{relative}")
    }
}

/// Strictly parse a generation response into [`GenerateOutput`]
///
/// Tolerates markdown fences and prose around the JSON object, but the
/// object itself must match the schema exactly.
///
/// # Errors
/// Returns `LlmError::Schema` when no JSON object is present or it doesn't
/// deserialize.
pub fn parse_generate_output(response: &str) -> LlmResult<GenerateOutput> {
    let stripped = strip_code_fences(response);

    let start = stripped
        .find('{')
        .ok_or_else(|| LlmError::Schema("No JSON object in generation response".to_string()))?;
    let end = stripped
        .rfind('}')
        .ok_or_else(|| LlmError::Schema("Unterminated JSON object in response".to_string()))?;
    if end < start {
        return Err(LlmError::Schema("Malformed JSON object bounds".to_string()));
    }

    let json = &stripped[start..=end];
    serde_json::from_str(json).map_err(|e| LlmError::Schema(format!("Invalid GenerateOutput: {e}")))
}

fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the first newline
    let inner = inner.split_once('\n').map_or(inner, |(_, rest)| rest);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwright_sandbox::FileOperation;

    #[test]
    fn parses_decorated_path_lists() {
        let response = r#"
Here are the files:
- `src/util.ts`
* "src/handlers/user.ts"
3. **src/index.ts**
not a path
README
        "#;

        let paths = parse_selected_paths(response, "repo");
        assert_eq!(
            paths,
            vec!["repo/src/util.ts", "repo/src/handlers/user.ts", "repo/src/index.ts"]
        );
    }

    #[test]
    fn rejects_lines_without_separator_or_known_extension() {
        let response = "util.ts\nsrc/readme.md\nsrc/logo.png\nsrc/util.ts";
        let paths = parse_selected_paths(response, "repo");
        assert_eq!(paths, vec!["repo/src/util.ts"]);
    }

    #[test]
    fn deduplicates_and_normalizes_root_prefixes() {
        let response = "./src/a.ts\nrepo/src/a.ts\n/src/a.ts";
        let paths = parse_selected_paths(response, "repo");
        assert_eq!(paths, vec!["repo/src/a.ts"]);
    }

    #[test]
    fn empty_response_selects_nothing() {
        assert!(parse_selected_paths("I cannot determine the files.", "repo").is_empty());
    }

    #[test]
    fn parses_fenced_generation_output() {
        let response = r#"```json
{
  "fileOperations": [{"type": "deleteFile", "path": "src/old.ts"}],
  "explanation": "Removed dead module"
}
```"#;

        let output = parse_generate_output(response).unwrap();
        assert_eq!(output.explanation, "Removed dead module");
        assert_eq!(
            output.file_operations,
            vec![FileOperation::DeleteFile {
                path: "src/old.ts".to_string()
            }]
        );
    }

    #[test]
    fn parses_json_surrounded_by_prose() {
        let response = "Sure! Here's the change:\n{\"fileOperations\": [], \"explanation\": \"noop\"}\nLet me know.";
        let output = parse_generate_output(response).unwrap();
        assert_eq!(output.explanation, "noop");
    }

    #[test]
    fn rejects_schema_violations() {
        let response = r#"{"fileOperations": [{"type": "explodeFile", "path": "a"}], "explanation": "x"}"#;
        assert!(matches!(
            parse_generate_output(response),
            Err(LlmError::Schema(_))
        ));
    }

    #[test]
    fn rejects_responses_without_json() {
        assert!(parse_generate_output("no object here").is_err());
    }
}
