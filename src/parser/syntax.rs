//! Language-neutral syntax tree produced by parser adapters.

use std::fmt;

/// Source extent of a node. Lines are 1-indexed, columns 0-indexed.
///
/// Columns count UTF-8 bytes from the start of the line, as tree-sitter
/// reports them, not characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Create a span from a tree-sitter node.
    #[cfg(feature = "tree-sitter")]
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_line: start.row + 1, // tree-sitter rows are 0-indexed
            start_column: start.column,
            end_line: end.row + 1,
            end_column: end.column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_column)
    }
}

/// Target of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignTarget {
    /// A bare identifier (`x = ...`).
    Name(String),
    /// Anything else: attributes, subscripts, destructuring patterns.
    Complex,
}

/// The node kinds the extractor distinguishes.
///
/// Adapters map every concrete grammar node onto exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Named function-like definition.
    Function {
        name: String,
        docstring: Option<String>,
    },
    /// Named class-like definition.
    Class {
        name: String,
        docstring: Option<String>,
        bases: Vec<String>,
    },
    /// Block attaching members to a type declared elsewhere (a Rust
    /// `impl`). Opens a scope named after `target` without declaring it.
    Impl {
        target: String,
        traits: Vec<String>,
    },
    /// Anonymous function (lambda, arrow function, callback).
    Lambda,
    /// Plain or annotated assignment / variable declaration.
    Assignment { targets: Vec<AssignTarget> },
    /// Import of one or more modules.
    Import { modules: Vec<String> },
    /// Call site; `callee` is the source text of the called expression.
    Call { callee: String },
    /// Decision point counted by cyclomatic complexity.
    Branch,
    /// Anything else.
    Other,
}

/// A node of the lowered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }
}

/// A successfully parsed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    /// Language identifier of the adapter that produced the tree.
    pub language: &'static str,
    pub root: SyntaxNode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display() {
        assert_eq!(Span::new(3, 4, 5, 0).to_string(), "3:4");
    }
}
