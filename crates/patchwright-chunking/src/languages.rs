//! Language configuration for the syntactic extension set
//!
//! This module centralizes the tree-sitter wiring for the extensions the
//! chunker parses structurally. Everything outside this set is chunked by
//! fixed-line windows.

use lazy_static::lazy_static;
use std::collections::HashMap;
use tree_sitter::Language;

lazy_static! {
    /// Registry mapping file extensions to their tree-sitter grammar
    static ref EXTENSION_REGISTRY: HashMap<&'static str, Language> = {
        let mut registry = HashMap::new();

        let javascript: Language = tree_sitter_javascript::LANGUAGE.into();
        for ext in ["js", "jsx", "mjs", "cjs"] {
            registry.insert(ext, javascript.clone());
        }

        let typescript: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        for ext in ["ts", "mts", "cts"] {
            registry.insert(ext, typescript.clone());
        }

        // TSX needs its own grammar (JSX-aware type parsing)
        registry.insert("tsx", tree_sitter_typescript::LANGUAGE_TSX.into());

        registry
    };
}

/// Look up the tree-sitter grammar for an extension, if it's in the syntactic set
pub fn language_for_extension(extension: &str) -> Option<Language> {
    EXTENSION_REGISTRY.get(extension).cloned()
}

/// Whether this extension is parsed structurally (vs line-windowed)
pub fn is_syntactic_extension(extension: &str) -> bool {
    EXTENSION_REGISTRY.contains_key(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typescript_family_is_syntactic() {
        for ext in ["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"] {
            assert!(is_syntactic_extension(ext), "expected {ext} to be syntactic");
        }
    }

    #[test]
    fn other_extensions_are_not() {
        for ext in ["py", "rs", "go", "md", "json", ""] {
            assert!(!is_syntactic_extension(ext), "expected {ext} to line-window");
        }
    }
}
