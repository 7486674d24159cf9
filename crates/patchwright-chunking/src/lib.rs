//! Patchwright chunking crate
//!
//! This crate splits source files into addressable chunks for indexing.
//! Files in the syntactic extension set (the JS/TS family) are parsed with
//! tree-sitter and chunked per top-level function, variable-bound function
//! expression, and class. Everything else falls back to fixed-line windows.

pub mod chunker;
pub mod languages;
pub mod model;

pub use chunker::{Chunker, DEFAULT_WINDOW_LINES};
pub use languages::{language_for_extension, is_syntactic_extension};
pub use model::{Chunk, ChunkKind};
