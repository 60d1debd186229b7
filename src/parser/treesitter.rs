//! Tree-sitter based adapter implementation.
//!
//! A single generic adapter is configured per language with a grammar and a
//! `classify` function mapping concrete grammar nodes onto `NodeKind`.

use tree_sitter::{Language, Node, Parser as TsParser};

use super::{NodeKind, ParserAdapter, Span, SyntaxNode, SyntaxTree};
use crate::error::{EngineError, ParseError};

/// Deepest concrete tree accepted for lowering. Anything nested further is
/// rejected with `ParseError::TooDeep`, which bounds the recursion of every
/// consumer of the lowered tree.
pub const MAX_TREE_DEPTH: usize = 512;

/// Classifies one concrete node. Receives the full source for text lookups.
pub type Classifier = fn(Node<'_>, &str) -> NodeKind;

/// Configuration for a tree-sitter language adapter.
#[derive(Clone)]
pub struct Config {
    /// The tree-sitter language
    pub language: Language,
    /// Language name (e.g., "python", "typescript")
    pub language_id: &'static str,
    /// Extensions handled, without dot
    pub extensions: &'static [&'static str],
    /// Node classification
    pub classify: Classifier,
}

/// Tree-sitter based adapter.
pub struct TreeSitterAdapter {
    config: Config,
}

/// A lowered node whose children are still being lowered.
struct Frame<'t> {
    node: SyntaxNode,
    pending: std::vec::IntoIter<Node<'t>>,
}

impl TreeSitterAdapter {
    /// Create a new tree-sitter adapter with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn create_parser(&self) -> Result<TsParser, EngineError> {
        let mut parser = TsParser::new();
        parser
            .set_language(&self.config.language)
            .map_err(|e| EngineError {
                language: self.config.language_id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(parser)
    }

    fn open<'t>(&self, node: Node<'t>, source: &str) -> Frame<'t> {
        let kind = (self.config.classify)(node, source);
        let mut cursor = node.walk();
        let pending: Vec<_> = node
            .named_children(&mut cursor)
            .filter(|c| !c.is_extra())
            .collect();
        Frame {
            node: SyntaxNode::new(kind, Span::from_node(node)),
            pending: pending.into_iter(),
        }
    }

    /// Lower a concrete node and its named descendants, depth first with an
    /// explicit stack.
    fn lower(&self, root: Node<'_>, source: &str) -> SyntaxNode {
        let mut ancestors: Vec<Frame<'_>> = Vec::new();
        let mut current = self.open(root, source);
        loop {
            if let Some(child) = current.pending.next() {
                let child = self.open(child, source);
                ancestors.push(std::mem::replace(&mut current, child));
                continue;
            }
            let Some(mut parent) = ancestors.pop() else {
                return current.node;
            };
            parent.node.children.push(current.node);
            current = parent;
        }
    }
}

impl ParserAdapter for TreeSitterAdapter {
    fn language_id(&self) -> &'static str {
        self.config.language_id
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        self.config.extensions
    }

    fn probe(&self) -> Result<(), EngineError> {
        self.create_parser().map(|_| ())
    }

    fn parse(&self, source: &str) -> Result<SyntaxTree, ParseError> {
        let mut parser = self.create_parser().map_err(|_| ParseError::NoTree)?;
        let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;
        let root = tree.root_node();

        if root.has_error() {
            let (line, column) = first_error(root)
                .map(|n| (n.start_position().row + 1, n.start_position().column))
                .unwrap_or((1, 0));
            return Err(ParseError::Syntax { line, column });
        }
        if exceeds_depth(root, MAX_TREE_DEPTH) {
            return Err(ParseError::TooDeep {
                limit: MAX_TREE_DEPTH,
            });
        }

        Ok(SyntaxTree {
            language: self.config.language_id,
            root: self.lower(root, source),
        })
    }
}

/// Find the first ERROR or MISSING node in document order.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        // only descend into subtrees that contain an error
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

/// Whether any node lies more than `limit` levels below `root` (the root
/// itself is level 1).
fn exceeds_depth(root: Node<'_>, limit: usize) -> bool {
    let mut cursor = root.walk();
    let mut depth = 1;
    loop {
        if cursor.goto_first_child() {
            depth += 1;
            if depth > limit {
                return true;
            }
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return false;
            }
            depth -= 1;
        }
    }
}

/// Source text of a node.
pub fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Text of a named field child, if present.
pub fn field_text<'s>(node: Node<'_>, field: &str, source: &'s str) -> Option<&'s str> {
    node.child_by_field_name(field).map(|n| node_text(n, source))
}

/// Strip quotes and string prefixes from a string literal, then normalize
/// indentation the way documentation tools do.
pub fn clean_string_literal(raw: &str) -> String {
    let unprefixed = raw.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let delimiters = ["\"\"\"", "'''", "\"", "'", "`"];
    let mut inner = unprefixed;
    for delimiter in delimiters {
        if unprefixed.len() >= delimiter.len() * 2
            && unprefixed.starts_with(delimiter)
            && unprefixed.ends_with(delimiter)
        {
            inner = &unprefixed[delimiter.len()..unprefixed.len() - delimiter.len()];
            break;
        }
    }
    clean_doc(inner)
}

/// Trim a doc block: drop surrounding blank lines and the common indentation
/// of every line after the first.
pub fn clean_doc(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let Some((first, rest)) = lines.split_first() else {
        return String::new();
    };

    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = vec![first.trim().to_string()];
    out.extend(rest.iter().map(|l| match l.get(indent..) {
        Some(tail) => tail.trim_end().to_string(),
        None => l.trim().to_string(),
    }));

    while out.first().is_some_and(|l| l.is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_string_literal() {
        assert_eq!(clean_string_literal(r#""""Say hello.""""#), "Say hello.");
        assert_eq!(clean_string_literal("'''one'''"), "one");
        assert_eq!(clean_string_literal(r#"r"raw""#), "raw");
        assert_eq!(clean_string_literal("'x'"), "x");
    }

    #[test]
    fn test_clean_doc_dedents() {
        let raw = "Summary line.\n\n        Details here.\n          Indented more.\n    ";
        assert_eq!(
            clean_doc(raw),
            "Summary line.\n\nDetails here.\n  Indented more."
        );
    }

    #[test]
    fn test_clean_doc_empty() {
        assert_eq!(clean_doc(""), "");
        assert_eq!(clean_doc("\n\n"), "");
    }
}
