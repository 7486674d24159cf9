//! Builds the cross-file code graph from candidate file contents

use crate::model::{
    CodeGraph, EdgeKind, FunctionContext, GraphEdge, GraphNode, Location, MethodInfo, NodeKind,
    Parameter,
};
use once_cell::sync::Lazy;
use patchwright_chunking::language_for_extension;
use std::collections::{BTreeSet, HashMap, HashSet};
use tree_sitter::{Node, Parser};

/// Call names that are language keywords, not functions
static CALL_NAME_STOP_LIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "if", "else", "for", "while", "switch", "catch", "return", "function", "const", "let",
        "var", "new", "typeof", "await", "async", "super", "this", "constructor", "require",
        "import",
    ]
    .into_iter()
    .collect()
});

/// Builds an enhanced code graph over a `file path -> content` map
pub struct GraphBuilder;

impl GraphBuilder {
    /// Parse every candidate file and assemble the graph
    ///
    /// Files that cannot be parsed structurally are skipped with a warning;
    /// the graph is built from whatever parses.
    pub fn build(files: &HashMap<String, String>) -> CodeGraph {
        let mut graph = CodeGraph::default();

        // Deterministic node/edge order regardless of map iteration
        let mut paths: Vec<&String> = files.keys().collect();
        paths.sort();

        for path in paths {
            let Some(content) = files.get(path) else {
                continue;
            };
            if Self::parse_file(&mut graph, path, content).is_none() {
                tracing::warn!(file = %path, "Skipping unparseable file in code graph");
            }
        }

        Self::link_edges(&mut graph);
        graph
    }

    fn parse_file(graph: &mut CodeGraph, file_path: &str, content: &str) -> Option<()> {
        let extension = file_path.rsplit('.').next().unwrap_or("").to_lowercase();
        let language = language_for_extension(&extension)?;

        let mut parser = Parser::new();
        parser.set_language(&language).ok()?;
        let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
        let tree = parser.parse(&normalized, None)?;
        let source = normalized.as_str();

        let root = tree.root_node();
        let mut cursor = root.walk();

        for child in root.children(&mut cursor) {
            let (is_exported, statement) = match child.kind() {
                "export_statement" => match child.child_by_field_name("declaration") {
                    Some(decl) => (true, decl),
                    None => continue,
                },
                _ => (false, child),
            };

            match statement.kind() {
                "import_statement" => {
                    Self::add_import_node(graph, file_path, &child, source);
                }
                "function_declaration" | "generator_function_declaration" => {
                    Self::add_function_node(
                        graph, file_path, &child, &statement, source, is_exported,
                    );
                }
                "class_declaration" | "abstract_class_declaration" => {
                    Self::add_class_node(graph, file_path, &child, &statement, source, is_exported);
                }
                "lexical_declaration" | "variable_declaration" => {
                    Self::add_bound_function_nodes(
                        graph, file_path, &child, &statement, source, is_exported,
                    );
                }
                _ => {}
            }
        }

        Some(())
    }

    fn add_import_node(graph: &mut CodeGraph, file_path: &str, node: &Node<'_>, source: &str) {
        let Some(module) = node
            .child_by_field_name("source")
            .and_then(|s| node_text(&s, source))
            .map(|text| text.trim_matches(['"', '\''].as_slice()).to_string())
        else {
            return;
        };

        let id = GraphNode::node_id(file_path, &module);
        graph.add_node(GraphNode {
            id: id.clone(),
            kind: NodeKind::Import,
            name: module.clone(),
            file_path: file_path.to_string(),
            location: location_of(node),
            signature: None,
            parameters: Vec::new(),
            context: None,
            properties: Vec::new(),
            methods: Vec::new(),
            extends_from: None,
            is_exported: false,
            modifiers: Vec::new(),
        });
        graph.add_edge(GraphEdge {
            from: id,
            to: module,
            kind: EdgeKind::Imports,
        });
    }

    fn add_function_node(
        graph: &mut CodeGraph,
        file_path: &str,
        outer: &Node<'_>,
        declaration: &Node<'_>,
        source: &str,
        is_exported: bool,
    ) {
        let Some(name) = declaration
            .child_by_field_name("name")
            .and_then(|n| node_text(&n, source))
        else {
            return;
        };

        let parameters = declaration
            .child_by_field_name("parameters")
            .map(|p| extract_parameters(&p, source))
            .unwrap_or_default();
        let body = declaration.child_by_field_name("body");

        Self::push_function(
            graph, file_path, outer, source, &name, parameters, body, is_exported,
            modifiers_of(declaration, source),
        );
    }

    /// `const f = (a) => ...` and `const g = function (a) {...}` become
    /// function nodes named after the binding
    fn add_bound_function_nodes(
        graph: &mut CodeGraph,
        file_path: &str,
        outer: &Node<'_>,
        declaration: &Node<'_>,
        source: &str,
        is_exported: bool,
    ) {
        let mut cursor = declaration.walk();
        for declarator in declaration.children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(value) = declarator.child_by_field_name("value") else {
                continue;
            };
            if !matches!(
                value.kind(),
                "arrow_function" | "function_expression" | "function"
            ) {
                continue;
            }
            let Some(name) = declarator
                .child_by_field_name("name")
                .and_then(|n| node_text(&n, source))
            else {
                continue;
            };

            // Arrow functions with a single bare parameter expose it under
            // the `parameter` field instead of `parameters`
            let parameters = value
                .child_by_field_name("parameters")
                .map(|p| extract_parameters(&p, source))
                .or_else(|| {
                    value.child_by_field_name("parameter").map(|p| {
                        node_text(&p, source)
                            .map(|name| {
                                vec![Parameter {
                                    name,
                                    optional: false,
                                    type_hint: None,
                                }]
                            })
                            .unwrap_or_default()
                    })
                })
                .unwrap_or_default();
            let body = value.child_by_field_name("body");

            Self::push_function(
                graph, file_path, outer, source, &name, parameters, body, is_exported,
                modifiers_of(&value, source),
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push_function(
        graph: &mut CodeGraph,
        file_path: &str,
        outer: &Node<'_>,
        source: &str,
        name: &str,
        parameters: Vec<Parameter>,
        body: Option<Node<'_>>,
        is_exported: bool,
        modifiers: Vec<String>,
    ) {
        let id = GraphNode::node_id(file_path, name);
        let mut calls = BTreeSet::new();
        let context = body.map(|body| {
            collect_calls(&body, source, &mut calls);
            extract_context(&body, source, &parameters)
        });

        graph.add_node(GraphNode {
            id: id.clone(),
            kind: NodeKind::Function,
            name: name.to_string(),
            file_path: file_path.to_string(),
            location: location_of(outer),
            signature: Some(render_signature(name, &parameters)),
            parameters,
            context,
            properties: Vec::new(),
            methods: Vec::new(),
            extends_from: None,
            is_exported,
            modifiers,
        });
        graph.calls_by_function.insert(id, calls);
    }

    fn add_class_node(
        graph: &mut CodeGraph,
        file_path: &str,
        outer: &Node<'_>,
        declaration: &Node<'_>,
        source: &str,
        is_exported: bool,
    ) {
        let Some(name) = declaration
            .child_by_field_name("name")
            .and_then(|n| node_text(&n, source))
        else {
            return;
        };

        let extends_from = extract_superclass(declaration, source);
        let mut properties = Vec::new();
        let mut methods = Vec::new();
        let mut class_calls = BTreeSet::new();

        if let Some(body) = declaration.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                match member.kind() {
                    "method_definition" => {
                        let Some(method_name) = member
                            .child_by_field_name("name")
                            .and_then(|n| node_text(&n, source))
                        else {
                            continue;
                        };
                        let parameters = member
                            .child_by_field_name("parameters")
                            .map(|p| extract_parameters(&p, source))
                            .unwrap_or_default();
                        let mut calls = BTreeSet::new();
                        if let Some(method_body) = member.child_by_field_name("body") {
                            collect_calls(&method_body, source, &mut calls);
                        }
                        class_calls.extend(calls.iter().cloned());
                        methods.push(MethodInfo {
                            name: method_name,
                            parameters,
                            calls,
                        });
                    }
                    "public_field_definition" | "field_definition" | "property_signature" => {
                        if let Some(field_name) = member
                            .child_by_field_name("name")
                            .and_then(|n| node_text(&n, source))
                        {
                            properties.push(field_name);
                        }
                    }
                    _ => {}
                }
            }
        }

        let id = GraphNode::node_id(file_path, &name);
        graph.add_node(GraphNode {
            id: id.clone(),
            kind: NodeKind::Class,
            name,
            file_path: file_path.to_string(),
            location: location_of(outer),
            signature: None,
            parameters: Vec::new(),
            context: None,
            properties,
            methods,
            extends_from,
            is_exported,
            modifiers: modifiers_of(declaration, source),
        });
        graph.calls_by_function.insert(id, class_calls);
    }

    /// Resolve call and extends edges now that every node exists
    fn link_edges(graph: &mut CodeGraph) {
        let mut edges = Vec::new();

        let mut caller_ids: Vec<&String> = graph.calls_by_function.keys().collect();
        caller_ids.sort();
        for caller_id in caller_ids {
            let Some(called_names) = graph.calls_by_function.get(caller_id) else {
                continue;
            };
            for name in called_names {
                if let Some(target_ids) = graph.nodes_by_name.get(name) {
                    for target_id in target_ids {
                        edges.push(GraphEdge {
                            from: caller_id.clone(),
                            to: target_id.clone(),
                            kind: EdgeKind::Calls,
                        });
                    }
                }
            }
        }

        let mut class_ids: Vec<&String> = graph
            .nodes
            .iter()
            .filter(|(_, node)| node.extends_from.is_some())
            .map(|(id, _)| id)
            .collect();
        class_ids.sort();
        for class_id in class_ids {
            let Some(node) = graph.nodes.get(class_id) else {
                continue;
            };
            let Some(parent_name) = &node.extends_from else {
                continue;
            };
            if let Some(target_ids) = graph.nodes_by_name.get(parent_name) {
                for target_id in target_ids {
                    edges.push(GraphEdge {
                        from: class_id.clone(),
                        to: target_id.clone(),
                        kind: EdgeKind::Extends,
                    });
                }
            }
        }

        for edge in edges {
            graph.add_edge(edge);
        }
    }
}

fn node_text(node: &Node<'_>, source: &str) -> Option<String> {
    source
        .get(node.byte_range())
        .map(std::string::ToString::to_string)
}

fn location_of(node: &Node<'_>) -> Location {
    Location::new(node.start_position().row + 1, node.end_position().row + 1)
}

/// Leading modifier tokens as written (async, abstract, static)
fn modifiers_of(node: &Node<'_>, source: &str) -> Vec<String> {
    let mut modifiers = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.is_named() {
            break;
        }
        if let Some(text) = node_text(&child, source)
            && matches!(text.as_str(), "async" | "abstract" | "static")
        {
            modifiers.push(text);
        }
    }
    modifiers
}

/// Superclass name from the heritage clause, if present
fn extract_superclass(class_node: &Node<'_>, source: &str) -> Option<String> {
    let mut cursor = class_node.walk();
    let heritage = class_node
        .children(&mut cursor)
        .find(|child| child.kind() == "class_heritage")?;

    let mut name = None;
    walk(&heritage, &mut |node| {
        if name.is_none() && node.kind() == "identifier" {
            name = node_text(&node, source);
        }
    });
    name
}

/// Extract the parameter list with names, optional flags, and type strings
fn extract_parameters(params_node: &Node<'_>, source: &str) -> Vec<Parameter> {
    let mut parameters = Vec::new();
    let mut cursor = params_node.walk();

    for child in params_node.named_children(&mut cursor) {
        match child.kind() {
            // TypeScript grammar wraps every parameter
            "required_parameter" | "optional_parameter" => {
                let name = child
                    .child_by_field_name("pattern")
                    .and_then(|p| node_text(&p, source))
                    .unwrap_or_default();
                if name.is_empty() {
                    continue;
                }
                let type_hint = child
                    .child_by_field_name("type")
                    .and_then(|t| node_text(&t, source))
                    .map(|t| t.trim_start_matches(':').trim().to_string());
                parameters.push(Parameter {
                    name,
                    optional: child.kind() == "optional_parameter",
                    type_hint,
                });
            }
            // Plain JavaScript parameters
            "identifier" => {
                if let Some(name) = node_text(&child, source) {
                    parameters.push(Parameter {
                        name,
                        optional: false,
                        type_hint: None,
                    });
                }
            }
            "assignment_pattern" => {
                if let Some(name) = child
                    .child_by_field_name("left")
                    .and_then(|l| node_text(&l, source))
                {
                    // A default value makes the parameter effectively optional
                    parameters.push(Parameter {
                        name,
                        optional: true,
                        type_hint: None,
                    });
                }
            }
            "rest_pattern" | "rest_parameter" | "object_pattern" | "array_pattern" => {
                if let Some(name) = node_text(&child, source) {
                    parameters.push(Parameter {
                        name,
                        optional: false,
                        type_hint: None,
                    });
                }
            }
            _ => {}
        }
    }

    parameters
}

/// Render `name(a: string, b?: number)` from extracted parameters
fn render_signature(name: &str, parameters: &[Parameter]) -> String {
    let rendered: Vec<String> = parameters
        .iter()
        .map(|p| {
            let marker = if p.optional { "?" } else { "" };
            match &p.type_hint {
                Some(type_hint) => format!("{}{marker}: {type_hint}", p.name),
                None => format!("{}{marker}", p.name),
            }
        })
        .collect();
    format!("{name}({})", rendered.join(", "))
}

/// Collect called function names from a body
///
/// Direct call expressions contribute their callee identifier; member calls
/// contribute the property name. Keyword-shaped names are excluded.
fn collect_calls(body: &Node<'_>, source: &str, out: &mut BTreeSet<String>) {
    walk(body, &mut |node| {
        if node.kind() != "call_expression" {
            return;
        }
        let Some(callee) = node.child_by_field_name("function") else {
            return;
        };
        let name = match callee.kind() {
            "identifier" => node_text(&callee, source),
            "member_expression" => callee
                .child_by_field_name("property")
                .and_then(|p| node_text(&p, source)),
            _ => None,
        };
        if let Some(name) = name
            && !CALL_NAME_STOP_LIST.contains(name.as_str())
        {
            out.insert(name);
        }
    });
}

/// Gather declared variables, used identifiers, member-expression roots, and
/// thrown error names from a function body
fn extract_context(body: &Node<'_>, source: &str, parameters: &[Parameter]) -> FunctionContext {
    let mut declared = BTreeSet::new();
    let mut used = BTreeSet::new();
    let mut member_roots = BTreeSet::new();
    let mut thrown = BTreeSet::new();

    walk(body, &mut |node| match node.kind() {
        "variable_declarator" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                if name_node.kind() == "identifier" {
                    if let Some(name) = node_text(&name_node, source) {
                        declared.insert(name);
                    }
                } else {
                    // Destructuring: every identifier in the pattern is a binding
                    walk(&name_node, &mut |inner| {
                        if inner.kind() == "identifier"
                            && let Some(name) = node_text(&inner, source)
                        {
                            declared.insert(name);
                        }
                    });
                }
            }
        }
        "identifier" => {
            if let Some(name) = node_text(&node, source) {
                used.insert(name);
            }
        }
        "member_expression" => {
            // Only record the outermost expression's root
            let mut object = node.child_by_field_name("object");
            while let Some(current) = object {
                if current.kind() == "member_expression" {
                    object = current.child_by_field_name("object");
                } else {
                    if current.kind() == "identifier"
                        && let Some(name) = node_text(&current, source)
                    {
                        member_roots.insert(name);
                    }
                    break;
                }
            }
        }
        "throw_statement" => {
            walk(&node, &mut |inner| {
                if inner.kind() == "new_expression"
                    && let Some(constructor) = inner.child_by_field_name("constructor")
                    && constructor.kind() == "identifier"
                    && let Some(name) = node_text(&constructor, source)
                {
                    thrown.insert(name);
                }
            });
        }
        _ => {}
    });

    let locals: HashSet<&String> = declared
        .iter()
        .chain(parameters.iter().map(|p| &p.name))
        .collect();
    let external_dependencies: Vec<String> = member_roots
        .into_iter()
        .filter(|root| !locals.contains(root) && root != "this")
        .collect();

    FunctionContext {
        declared_variables: declared.into_iter().collect(),
        used_identifiers: used.into_iter().collect(),
        external_dependencies,
        thrown_errors: thrown.into_iter().collect(),
    }
}

/// Depth-first traversal applying `f` to every node
fn walk<'tree>(node: &Node<'tree>, f: &mut impl FnMut(Node<'tree>)) {
    f(*node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(&child, f);
    }
}
