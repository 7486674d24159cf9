//! Patchwright code-graph crate
//!
//! Parses a set of candidate files into a cross-file graph of imports,
//! functions, classes, and calls, and renders per-file structural skeletons
//! the generation pipeline feeds to the LLM instead of raw file bodies.

pub mod builder;
pub mod model;
pub mod skeleton;

pub use builder::GraphBuilder;
pub use model::{
    CodeGraph, EdgeKind, FunctionContext, GraphEdge, GraphNode, Location, MethodInfo, NodeKind,
    Parameter,
};
pub use skeleton::format_skeleton;
