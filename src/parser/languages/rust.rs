//! Rust language configuration for tree-sitter parsing.

use tree_sitter::Node;

use crate::parser::treesitter::{clean_doc, field_text, node_text, Config, TreeSitterAdapter};
use crate::parser::{AssignTarget, NodeKind};

/// Node kinds counted as decision points. `else if` is counted through its
/// nested `if_expression`.
const BRANCH_KINDS: &[&str] = &[
    "if_expression",
    "for_expression",
    "while_expression",
    "loop_expression",
    "match_arm",
];

/// Items declaring a named type.
const TYPE_ITEM_KINDS: &[&str] = &["struct_item", "enum_item", "union_item", "trait_item"];

/// Create a new Rust adapter.
pub fn new_adapter() -> TreeSitterAdapter {
    TreeSitterAdapter::new(Config {
        language: tree_sitter_rust::LANGUAGE.into(),
        language_id: "rust",
        extensions: &["rs"],
        classify,
    })
}

fn classify(node: Node<'_>, source: &str) -> NodeKind {
    match node.kind() {
        "function_item" | "function_signature_item" => match field_text(node, "name", source) {
            Some(name) => NodeKind::Function {
                name: name.to_string(),
                docstring: doc_comment(node, source),
            },
            None => NodeKind::Other,
        },
        kind if TYPE_ITEM_KINDS.contains(&kind) => match field_text(node, "name", source) {
            Some(name) => NodeKind::Class {
                name: name.to_string(),
                docstring: doc_comment(node, source),
                bases: supertraits(node, source),
            },
            None => NodeKind::Other,
        },
        "impl_item" => match node.child_by_field_name("type") {
            Some(target) => NodeKind::Impl {
                target: type_name(target, source).to_string(),
                traits: node
                    .child_by_field_name("trait")
                    .map(|t| vec![type_name(t, source).to_string()])
                    .unwrap_or_default(),
            },
            None => NodeKind::Other,
        },
        "closure_expression" => NodeKind::Lambda,
        "const_item" | "static_item" => NodeKind::Assignment {
            targets: field_text(node, "name", source)
                .map(|name| vec![AssignTarget::Name(name.to_string())])
                .unwrap_or_default(),
        },
        "use_declaration" => NodeKind::Import {
            modules: field_text(node, "argument", source)
                .map(|path| vec![path.to_string()])
                .unwrap_or_default(),
        },
        "call_expression" => match field_text(node, "function", source) {
            Some(callee) => NodeKind::Call {
                callee: callee.to_string(),
            },
            None => NodeKind::Other,
        },
        "binary_expression" => match field_text(node, "operator", source) {
            Some("&&" | "||") => NodeKind::Branch,
            _ => NodeKind::Other,
        },
        kind if BRANCH_KINDS.contains(&kind) => NodeKind::Branch,
        _ => NodeKind::Other,
    }
}

/// Name of a type without generic arguments: `Vec<T>` is `Vec`.
fn type_name<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    let base = match node.kind() {
        "generic_type" => node.child_by_field_name("type").unwrap_or(node),
        _ => node,
    };
    node_text(base, source)
}

/// Supertraits of a trait (`trait Plugin: Debug + Send`).
fn supertraits(item: Node<'_>, source: &str) -> Vec<String> {
    let Some(bounds) = item.child_by_field_name("bounds") else {
        return Vec::new();
    };
    let mut cursor = bounds.walk();
    bounds
        .named_children(&mut cursor)
        .filter(|n| {
            matches!(
                n.kind(),
                "type_identifier" | "scoped_type_identifier" | "generic_type"
            )
        })
        .map(|n| type_name(n, source).to_string())
        .collect()
}

/// `///` comments directly above an item, skipping its attributes.
fn doc_comment(item: Node<'_>, source: &str) -> Option<String> {
    let mut lines = Vec::new();
    let mut sibling = item.prev_named_sibling();
    while let Some(node) = sibling {
        match node.kind() {
            "attribute_item" => {}
            "line_comment" => match node_text(node, source).strip_prefix("///") {
                Some(rest) if !rest.starts_with('/') => {
                    lines.push(rest.strip_prefix(' ').unwrap_or(rest).trim_end());
                }
                _ => break,
            },
            _ => break,
        }
        sibling = node.prev_named_sibling();
    }
    if lines.is_empty() {
        return None;
    }
    lines.reverse();
    let doc = clean_doc(&lines.join("\n"));
    (!doc.is_empty()).then_some(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::parser::{ParserAdapter, SyntaxNode};

    fn flatten(node: &SyntaxNode) -> Vec<NodeKind> {
        let mut out = vec![node.kind.clone()];
        for child in &node.children {
            out.extend(flatten(child));
        }
        out
    }

    #[test]
    fn test_rust_items() {
        let source = r#"
use std::collections::HashMap;

const VERSION: &str = "1.0";

/// Runtime settings.
///
/// Loaded once at startup.
#[derive(Debug, Default)]
struct Config {
    name: String,
}

enum Status {
    Ok,
    Error,
}

trait Processor: Send + std::fmt::Debug {
    fn process(&self);
}

impl Processor for Config {
    fn process(&self) {
        helper();
    }
}

impl<T> Wrapper<T> {
    fn new() -> Self {
        todo!()
    }
}

fn helper() -> i32 {
    42
}
"#;
        let tree = new_adapter().parse(source).unwrap();
        let kinds = flatten(&tree.root);

        assert!(kinds.contains(&NodeKind::Import {
            modules: vec!["std::collections::HashMap".to_string()],
        }));
        assert!(kinds.contains(&NodeKind::Assignment {
            targets: vec![AssignTarget::Name("VERSION".to_string())],
        }));
        assert!(kinds.contains(&NodeKind::Class {
            name: "Config".to_string(),
            docstring: Some("Runtime settings.\n\nLoaded once at startup.".to_string()),
            bases: vec![],
        }));
        assert!(kinds.contains(&NodeKind::Class {
            name: "Status".to_string(),
            docstring: None,
            bases: vec![],
        }));
        assert!(kinds.contains(&NodeKind::Class {
            name: "Processor".to_string(),
            docstring: None,
            bases: vec!["Send".to_string(), "std::fmt::Debug".to_string()],
        }));
        assert!(kinds.contains(&NodeKind::Impl {
            target: "Config".to_string(),
            traits: vec!["Processor".to_string()],
        }));
        assert!(kinds.contains(&NodeKind::Impl {
            target: "Wrapper".to_string(),
            traits: vec![],
        }));
        for name in ["process", "new", "helper"] {
            assert!(
                kinds.contains(&NodeKind::Function {
                    name: name.to_string(),
                    docstring: None,
                }),
                "missing function {name}"
            );
        }
        assert!(kinds.contains(&NodeKind::Call {
            callee: "helper".to_string(),
        }));
    }

    #[test]
    fn test_rust_branches() {
        let source = r#"
fn classify(x: i32, flag: bool) -> i32 {
    if x > 0 && flag {
        1
    } else if x < 0 {
        -1
    } else {
        match x {
            0 => 0,
            _ => 2,
        }
    }
}
"#;
        let tree = new_adapter().parse(source).unwrap();
        let branches = flatten(&tree.root)
            .into_iter()
            .filter(|k| *k == NodeKind::Branch)
            .count();
        // if, &&, else if, two match arms
        assert_eq!(branches, 5);
    }

    #[test]
    fn test_rust_closure_is_lambda() {
        let tree = new_adapter()
            .parse("fn run() { let f = |x: i32| x + 1; f(2); }")
            .unwrap();
        assert!(flatten(&tree.root).contains(&NodeKind::Lambda));
    }

    #[test]
    fn test_rust_syntax_error() {
        let err = new_adapter().parse("fn broken( {").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }
}
