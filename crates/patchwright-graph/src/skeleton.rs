//! Skeleton formatter
//!
//! Renders a deterministic, human-readable structural summary of one file
//! from the code graph. Skeletons stand in for raw file bodies in LLM
//! prompts, keeping context small while preserving structure.

use crate::model::{CodeGraph, GraphNode, NodeKind};
use std::fmt::Write as _;

/// Render the skeleton text for one file
///
/// Sections appear in a fixed order (header, imports, exports, functions,
/// classes); entries within each section follow source order.
pub fn format_skeleton(graph: &CodeGraph, file_path: &str) -> String {
    let nodes = graph.file_nodes(file_path);
    let reverse_calls = graph.reverse_call_map();

    let imports: Vec<&GraphNode> = nodes
        .iter()
        .copied()
        .filter(|n| n.kind == NodeKind::Import)
        .collect();
    let functions: Vec<&GraphNode> = nodes
        .iter()
        .copied()
        .filter(|n| n.kind == NodeKind::Function)
        .collect();
    let classes: Vec<&GraphNode> = nodes
        .iter()
        .copied()
        .filter(|n| n.kind == NodeKind::Class)
        .collect();
    let exports: Vec<&GraphNode> = nodes.iter().copied().filter(|n| n.is_exported).collect();

    let file_name = file_path.rsplit('/').next().unwrap_or(file_path);
    let mut out = String::new();

    let _ = writeln!(out, "File: {file_name} ({file_path})");
    let _ = writeln!(
        out,
        "Functions: {} | Classes: {} | Imports: {}",
        functions.len(),
        classes.len(),
        imports.len()
    );

    if !imports.is_empty() {
        let _ = writeln!(out, "\nImports:");
        for import in &imports {
            let _ = writeln!(out, "  - {}", import.name);
        }
    }

    if !exports.is_empty() {
        let _ = writeln!(out, "\nExports:");
        for export in &exports {
            let _ = writeln!(out, "  - {}", export.name);
        }
    }

    if !functions.is_empty() {
        let _ = writeln!(out, "\nFunctions:");
        for function in &functions {
            write_function(&mut out, function, &reverse_calls, graph);
        }
    }

    if !classes.is_empty() {
        let _ = writeln!(out, "\nClasses:");
        for class in &classes {
            write_class(&mut out, class);
        }
    }

    out
}

fn visibility_tag(node: &GraphNode) -> &'static str {
    if node.is_exported { "EXPORTED" } else { "PRIVATE" }
}

fn write_function(
    out: &mut String,
    node: &GraphNode,
    reverse_calls: &std::collections::HashMap<String, Vec<String>>,
    graph: &CodeGraph,
) {
    let signature = node
        .signature
        .clone()
        .unwrap_or_else(|| format!("{}()", node.name));
    let modifiers = if node.modifiers.is_empty() {
        String::new()
    } else {
        format!("{} ", node.modifiers.join(" "))
    };

    let _ = writeln!(
        out,
        "  [{}] {modifiers}function {signature}: lines {}-{}",
        visibility_tag(node),
        node.location.start,
        node.location.end
    );

    if let Some(calls) = graph.calls_by_function.get(&node.id)
        && !calls.is_empty()
    {
        let names: Vec<&str> = calls.iter().map(String::as_str).collect();
        let _ = writeln!(out, "    Calls: {}", names.join(", "));
    }

    if let Some(callers) = reverse_calls.get(&node.name)
        && !callers.is_empty()
    {
        let _ = writeln!(out, "    Called by: {}", callers.join(", "));
    }

    if let Some(context) = &node.context {
        if !context.external_dependencies.is_empty() {
            let _ = writeln!(out, "    Uses: {}", context.external_dependencies.join(", "));
        }
        if !context.thrown_errors.is_empty() {
            let _ = writeln!(out, "    Throws: {}", context.thrown_errors.join(", "));
        }
    }
}

fn write_class(out: &mut String, node: &GraphNode) {
    let heritage = node
        .extends_from
        .as_ref()
        .map(|parent| format!(" extends {parent}"))
        .unwrap_or_default();

    let _ = writeln!(
        out,
        "  [{}] class {}{heritage}: lines {}-{}",
        visibility_tag(node),
        node.name,
        node.location.start,
        node.location.end
    );

    if !node.properties.is_empty() {
        let _ = writeln!(out, "    Properties: {}", node.properties.join(", "));
    }

    if !node.methods.is_empty() {
        let _ = writeln!(out, "    Methods:");
        for method in &node.methods {
            let params: Vec<String> = method
                .parameters
                .iter()
                .map(|p| {
                    let marker = if p.optional { "?" } else { "" };
                    match &p.type_hint {
                        Some(type_hint) => format!("{}{marker}: {type_hint}", p.name),
                        None => format!("{}{marker}", p.name),
                    }
                })
                .collect();
            let _ = writeln!(out, "      {}({})", method.name, params.join(", "));
            if !method.calls.is_empty() {
                let names: Vec<&str> = method.calls.iter().map(String::as_str).collect();
                let _ = writeln!(out, "        Calls: {}", names.join(", "));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::GraphBuilder;
    use super::*;
    use std::collections::HashMap;

    fn graph_for(content: &str) -> CodeGraph {
        let mut files = HashMap::new();
        files.insert("src/sample.ts".to_string(), content.to_string());
        GraphBuilder::build(&files)
    }

    const SAMPLE: &str = r#"
import { db } from "./db";

export function getUser(id: string) {
    const row = db.users.find(id);
    if (!row) {
        throw new NotFoundError(id);
    }
    return format(row);
}

function format(row: UserRow) {
    return { id: row.id };
}

export class UserService extends BaseService {
    cache: Map<string, User> = new Map();

    lookup(id: string) {
        return getUser(id);
    }
}
"#;

    #[test]
    fn skeleton_has_fixed_section_order() {
        let graph = graph_for(SAMPLE);
        let skeleton = format_skeleton(&graph, "src/sample.ts");

        let imports_at = skeleton.find("Imports:").expect("imports section");
        let exports_at = skeleton.find("Exports:").expect("exports section");
        let functions_at = skeleton.find("Functions:\n").expect("functions section");
        let classes_at = skeleton.find("Classes:").expect("classes section");

        assert!(imports_at < exports_at);
        assert!(exports_at < functions_at);
        assert!(functions_at < classes_at);
    }

    #[test]
    fn functions_carry_call_and_usage_rows() {
        let graph = graph_for(SAMPLE);
        let skeleton = format_skeleton(&graph, "src/sample.ts");

        assert!(skeleton.contains("[EXPORTED] function getUser(id: string)"));
        assert!(skeleton.contains("Calls: find, format"));
        assert!(skeleton.contains("Throws: NotFoundError"));
        assert!(skeleton.contains("Uses: db"));
        // format is called by getUser
        assert!(skeleton.contains("[PRIVATE] function format(row: UserRow)"));
        assert!(skeleton.contains("Called by: src/sample.ts:getUser"));
    }

    #[test]
    fn classes_render_heritage_and_methods() {
        let graph = graph_for(SAMPLE);
        let skeleton = format_skeleton(&graph, "src/sample.ts");

        assert!(skeleton.contains("class UserService extends BaseService"));
        assert!(skeleton.contains("Properties: cache"));
        assert!(skeleton.contains("lookup(id: string)"));
    }

    #[test]
    fn formatting_is_deterministic() {
        let graph = graph_for(SAMPLE);
        let first = format_skeleton(&graph, "src/sample.ts");
        let second = format_skeleton(&graph, "src/sample.ts");
        assert_eq!(first, second);
    }

    #[test]
    fn header_counts_match_sections() {
        let graph = graph_for(SAMPLE);
        let skeleton = format_skeleton(&graph, "src/sample.ts");
        assert!(skeleton.starts_with("File: sample.ts (src/sample.ts)"));
        assert!(skeleton.contains("Functions: 2 | Classes: 1 | Imports: 1"));
    }
}
