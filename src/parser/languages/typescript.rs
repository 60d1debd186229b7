//! TypeScript language configuration for tree-sitter parsing.

use crate::parser::treesitter::{Config, TreeSitterAdapter};

/// Create a new TypeScript adapter.
pub fn new_adapter() -> TreeSitterAdapter {
    TreeSitterAdapter::new(Config {
        language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        language_id: "typescript",
        extensions: &["ts", "mts", "cts"],
        classify: super::ecmascript::classify,
    })
}

/// Create a new TSX adapter. Reported under the "typescript" language id.
pub fn new_tsx_adapter() -> TreeSitterAdapter {
    TreeSitterAdapter::new(Config {
        language: tree_sitter_typescript::LANGUAGE_TSX.into(),
        language_id: "typescript",
        extensions: &["tsx"],
        classify: super::ecmascript::classify,
    })
}
