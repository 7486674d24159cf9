//! Structured generation output

use patchwright_sandbox::FileOperation;
use serde::{Deserialize, Serialize};

/// The only shape generation responses are accepted in
///
/// `file_operations` reuses the sandbox's tagged [`FileOperation`] enum, so
/// unknown operation tags fail deserialization instead of reaching the
/// working tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutput {
    pub file_operations: Vec<FileOperation>,
    #[serde(default)]
    pub shell_commands: Vec<String>,
    pub explanation: String,
}

/// JSON schema text embedded in the generation prompt
///
/// Kept as a literal so the prompt and the serde types cannot drift without
/// a reviewer noticing both sides.
pub const GENERATE_OUTPUT_SCHEMA: &str = r#"{
  "type": "object",
  "required": ["fileOperations", "explanation"],
  "properties": {
    "fileOperations": {
      "type": "array",
      "items": {
        "oneOf": [
          {
            "type": "object",
            "required": ["type", "path", "content"],
            "properties": {
              "type": {"const": "createFile"},
              "path": {"type": "string"},
              "content": {"type": "string"}
            }
          },
          {
            "type": "object",
            "required": ["type", "path", "content"],
            "properties": {
              "type": {"const": "rewriteFile"},
              "path": {"type": "string"},
              "content": {"type": "string"}
            }
          },
          {
            "type": "object",
            "required": ["type", "path", "searchReplace"],
            "properties": {
              "type": {"const": "updateFile"},
              "path": {"type": "string"},
              "searchReplace": {
                "type": "array",
                "items": {
                  "type": "object",
                  "required": ["search", "replace"],
                  "properties": {
                    "search": {"type": "string"},
                    "replace": {"type": "string"}
                  }
                }
              }
            }
          },
          {
            "type": "object",
            "required": ["type", "path"],
            "properties": {
              "type": {"const": "deleteFile"},
              "path": {"type": "string"}
            }
          }
        ]
      }
    },
    "shellCommands": {"type": "array", "items": {"type": "string"}},
    "explanation": {"type": "string"}
  }
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use patchwright_sandbox::SearchReplace;

    #[test]
    fn deserializes_camel_case_wire_format() {
        let raw = r#"{
            "fileOperations": [
                {"type": "updateFile", "path": "src/util.ts",
                 "searchReplace": [{"search": "foo", "replace": "bar"}]}
            ],
            "shellCommands": ["npm install"],
            "explanation": "Renamed foo to bar"
        }"#;

        let output: GenerateOutput = serde_json::from_str(raw).unwrap();
        assert_eq!(output.shell_commands, vec!["npm install"]);
        assert_eq!(
            output.file_operations,
            vec![FileOperation::UpdateFile {
                path: "src/util.ts".to_string(),
                search_replace: vec![SearchReplace {
                    search: "foo".to_string(),
                    replace: "bar".to_string(),
                }],
            }]
        );
    }

    #[test]
    fn shell_commands_are_optional() {
        let raw = r#"{"fileOperations": [], "explanation": "nothing"}"#;
        let output: GenerateOutput = serde_json::from_str(raw).unwrap();
        assert!(output.shell_commands.is_empty());
    }

    #[test]
    fn unknown_operation_type_is_rejected() {
        let raw = r#"{
            "fileOperations": [{"type": "moveFile", "path": "a", "to": "b"}],
            "explanation": "nope"
        }"#;
        assert!(serde_json::from_str::<GenerateOutput>(raw).is_err());
    }

    #[test]
    fn schema_text_is_valid_json() {
        let parsed: serde_json::Value = serde_json::from_str(GENERATE_OUTPUT_SCHEMA).unwrap();
        assert!(parsed.get("properties").is_some());
    }
}
