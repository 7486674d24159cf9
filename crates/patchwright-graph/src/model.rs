//! Code graph domain model

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// What a graph node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Function,
    Class,
    Import,
}

/// Source location of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// First line (1-indexed)
    pub start: usize,
    /// Last line (1-indexed)
    pub end: usize,
    pub line_count: usize,
}

impl Location {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            line_count: end.saturating_sub(start) + 1,
        }
    }
}

/// A function/method parameter with best-effort type information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub optional: bool,
    /// Best-effort type string: primitive keyword, union/intersection,
    /// reference, literal, or array text as written
    pub type_hint: Option<String>,
}

/// Identifier usage gathered from a function body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionContext {
    /// Variables declared inside the body
    pub declared_variables: Vec<String>,
    /// Identifiers referenced in the body
    pub used_identifiers: Vec<String>,
    /// Member-expression roots not declared locally (likely imports/globals)
    pub external_dependencies: Vec<String>,
    /// Error constructor names from `throw new X(...)`
    pub thrown_errors: Vec<String>,
}

/// A method belonging to a class node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub calls: BTreeSet<String>,
}

/// A node in the code graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// `{file_path}:{name}`
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub file_path: String,
    pub location: Location,
    /// Rendered signature, e.g. `getUser(id: string, opts?: Options)`
    pub signature: Option<String>,
    pub parameters: Vec<Parameter>,
    pub context: Option<FunctionContext>,
    /// Class property names
    pub properties: Vec<String>,
    /// Class methods
    pub methods: Vec<MethodInfo>,
    /// Superclass name, when the node extends one
    pub extends_from: Option<String>,
    pub is_exported: bool,
    /// Modifiers as written: async, static, abstract, ...
    pub modifiers: Vec<String>,
}

impl GraphNode {
    pub fn node_id(file_path: &str, name: &str) -> String {
        format!("{file_path}:{name}")
    }
}

/// Typed directed edge, stored by source node id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// Edge categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Calls,
    Extends,
    Imports,
}

/// Cross-file graph over a candidate file set
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CodeGraph {
    pub nodes: HashMap<String, GraphNode>,
    /// Edges grouped by source node id
    pub edges_by_source: HashMap<String, Vec<GraphEdge>>,
    /// file path -> node ids, in source order
    pub nodes_by_file: HashMap<String, Vec<String>>,
    /// simple name -> node ids
    pub nodes_by_name: HashMap<String, Vec<String>>,
    /// function node id -> names it calls
    pub calls_by_function: HashMap<String, BTreeSet<String>>,
}

impl CodeGraph {
    /// Insert a node and maintain the auxiliary maps
    pub fn add_node(&mut self, node: GraphNode) {
        self.nodes_by_file
            .entry(node.file_path.clone())
            .or_default()
            .push(node.id.clone());
        self.nodes_by_name
            .entry(node.name.clone())
            .or_default()
            .push(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
    }

    /// Insert an edge keyed by its source
    pub fn add_edge(&mut self, edge: GraphEdge) {
        self.edges_by_source
            .entry(edge.from.clone())
            .or_default()
            .push(edge);
    }

    /// Nodes of a file, in source order
    pub fn file_nodes(&self, file_path: &str) -> Vec<&GraphNode> {
        self.nodes_by_file
            .get(file_path)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default()
    }

    /// Reverse call map: function name -> ids of functions that call it
    ///
    /// Derived from `calls_by_function`; drives the "Called by" skeleton rows.
    pub fn reverse_call_map(&self) -> HashMap<String, Vec<String>> {
        let mut reverse: HashMap<String, Vec<String>> = HashMap::new();
        let mut caller_ids: Vec<&String> = self.calls_by_function.keys().collect();
        caller_ids.sort();

        for caller_id in caller_ids {
            if let Some(called) = self.calls_by_function.get(caller_id) {
                for name in called {
                    reverse
                        .entry(name.clone())
                        .or_default()
                        .push(caller_id.clone());
                }
            }
        }
        reverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(file: &str, name: &str, kind: NodeKind) -> GraphNode {
        GraphNode {
            id: GraphNode::node_id(file, name),
            kind,
            name: name.to_string(),
            file_path: file.to_string(),
            location: Location::new(1, 5),
            signature: None,
            parameters: Vec::new(),
            context: None,
            properties: Vec::new(),
            methods: Vec::new(),
            extends_from: None,
            is_exported: false,
            modifiers: Vec::new(),
        }
    }

    #[test]
    fn auxiliary_maps_track_nodes() {
        let mut graph = CodeGraph::default();
        graph.add_node(node("a.ts", "f", NodeKind::Function));
        graph.add_node(node("a.ts", "g", NodeKind::Function));

        assert_eq!(graph.nodes_by_file.get("a.ts").map(Vec::len), Some(2));
        assert_eq!(
            graph.nodes_by_name.get("f"),
            Some(&vec!["a.ts:f".to_string()])
        );
    }

    #[test]
    fn reverse_call_map_inverts_call_sets() {
        let mut graph = CodeGraph::default();
        graph
            .calls_by_function
            .insert("a.ts:f".to_string(), BTreeSet::from(["g".to_string()]));
        graph
            .calls_by_function
            .insert("a.ts:h".to_string(), BTreeSet::from(["g".to_string()]));

        let reverse = graph.reverse_call_map();
        assert_eq!(
            reverse.get("g"),
            Some(&vec!["a.ts:f".to_string(), "a.ts:h".to_string()])
        );
    }

    #[test]
    fn location_counts_lines_inclusively() {
        assert_eq!(Location::new(10, 12).line_count, 3);
        assert_eq!(Location::new(7, 7).line_count, 1);
    }
}
