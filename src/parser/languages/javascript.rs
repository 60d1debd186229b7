//! JavaScript language configuration for tree-sitter parsing.

use crate::parser::treesitter::{Config, TreeSitterAdapter};

/// Create a new JavaScript adapter (JSX included).
pub fn new_adapter() -> TreeSitterAdapter {
    TreeSitterAdapter::new(Config {
        language: tree_sitter_javascript::LANGUAGE.into(),
        language_id: "javascript",
        extensions: &["js", "jsx", "mjs", "cjs"],
        classify: super::ecmascript::classify,
    })
}
