//! Prompt construction for the generation pipeline

use crate::schema::GENERATE_OUTPUT_SCHEMA;
use std::fmt::Write as _;

/// System framing shared by both operations
pub const SYSTEM_PROMPT: &str = "You are a precise code-modification assistant. \
You only answer in the exact format requested, with no commentary.";

/// Prompt asking the model which files need modification
///
/// Only skeletons are provided, never raw file bodies, to keep context small.
pub fn build_selection_prompt(task: &str, skeletons: &[(String, String)]) -> String {
    let mut prompt = String::new();

    let _ = writeln!(prompt, "Task: {task}\n");
    let _ = writeln!(
        prompt,
        "Below are structural summaries of candidate files. Decide which files \
must be modified to complete the task."
    );

    for (path, skeleton) in skeletons {
        let _ = writeln!(prompt, "\n--- {path} ---\n{skeleton}");
    }

    let _ = writeln!(
        prompt,
        "\nRespond with ONLY the file paths to modify, one per line. \
No explanations, no formatting."
    );

    prompt
}

/// Prompt asking the model for structured file operations
///
/// Previous validation errors, when present, are embedded verbatim with an
/// instruction to fix them.
pub fn build_generation_prompt(
    task: &str,
    files: &[(String, String)],
    previous_errors: &[String],
) -> String {
    let mut prompt = String::new();

    let _ = writeln!(prompt, "Task: {task}\n");

    if !previous_errors.is_empty() {
        let _ = writeln!(
            prompt,
            "Your previous attempt failed validation with these errors:"
        );
        for error in previous_errors {
            let _ = writeln!(prompt, "  {error}");
        }
        let _ = writeln!(prompt, "Fix every error above in this attempt.\n");
    }

    let _ = writeln!(prompt, "Current file contents:");
    for (path, content) in files {
        let _ = writeln!(prompt, "\n--- {path} ---\n{content}");
    }

    let _ = writeln!(
        prompt,
        "\nRespond with ONLY a JSON object matching this schema, no markdown fences:\n{GENERATE_OUTPUT_SCHEMA}"
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_prompt_contains_skeletons_not_bodies() {
        let skeletons = vec![(
            "src/a.ts".to_string(),
            "File: a.ts (src/a.ts)\nFunctions: 1".to_string(),
        )];
        let prompt = build_selection_prompt("rename foo", &skeletons);

        assert!(prompt.contains("rename foo"));
        assert!(prompt.contains("--- src/a.ts ---"));
        assert!(prompt.contains("one per line"));
    }

    #[test]
    fn generation_prompt_embeds_previous_errors_verbatim() {
        let errors = vec!["src/a.ts(3,1): error TS2304: Cannot find name 'bar'.".to_string()];
        let prompt =
            build_generation_prompt("rename foo", &[("src/a.ts".to_string(), "x".to_string())], &errors);

        assert!(prompt.contains("error TS2304: Cannot find name 'bar'."));
        assert!(prompt.contains("Fix every error above"));
        assert!(prompt.contains("fileOperations"));
    }

    #[test]
    fn first_iteration_has_no_error_section() {
        let prompt = build_generation_prompt("task", &[], &[]);
        assert!(!prompt.contains("previous attempt"));
    }
}
