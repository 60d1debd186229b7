//! Python language configuration for tree-sitter parsing.

use tree_sitter::Node;

use crate::parser::treesitter::{clean_string_literal, field_text, node_text, Config, TreeSitterAdapter};
use crate::parser::{AssignTarget, NodeKind};

/// Node kinds counted as decision points.
const BRANCH_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "except_clause",
    "with_statement",
    "conditional_expression",
    "boolean_operator",
    "list_comprehension",
    "dictionary_comprehension",
    "set_comprehension",
    "generator_expression",
    "case_clause",
];

/// Create a new Python adapter.
pub fn new_adapter() -> TreeSitterAdapter {
    TreeSitterAdapter::new(Config {
        language: tree_sitter_python::LANGUAGE.into(),
        language_id: "python",
        extensions: &["py", "pyi"],
        classify,
    })
}

fn classify(node: Node<'_>, source: &str) -> NodeKind {
    match node.kind() {
        "function_definition" => match field_text(node, "name", source) {
            Some(name) => NodeKind::Function {
                name: name.to_string(),
                docstring: docstring(node, source),
            },
            None => NodeKind::Other,
        },
        "class_definition" => match field_text(node, "name", source) {
            Some(name) => NodeKind::Class {
                name: name.to_string(),
                docstring: docstring(node, source),
                bases: bases(node, source),
            },
            None => NodeKind::Other,
        },
        "lambda" => NodeKind::Lambda,
        "assignment" => NodeKind::Assignment {
            targets: assignment_targets(node, source),
        },
        "import_statement" => {
            let mut cursor = node.walk();
            let modules = node
                .children_by_field_name("name", &mut cursor)
                .filter_map(|n| match n.kind() {
                    "aliased_import" => field_text(n, "name", source),
                    _ => Some(node_text(n, source)),
                })
                .map(str::to_string)
                .collect();
            NodeKind::Import { modules }
        }
        "import_from_statement" => NodeKind::Import {
            modules: field_text(node, "module_name", source)
                .map(|m| vec![m.to_string()])
                .unwrap_or_default(),
        },
        "future_import_statement" => NodeKind::Import {
            modules: vec!["__future__".to_string()],
        },
        "call" => match field_text(node, "function", source) {
            Some(callee) => NodeKind::Call {
                callee: callee.to_string(),
            },
            None => NodeKind::Other,
        },
        kind if BRANCH_KINDS.contains(&kind) => NodeKind::Branch,
        _ => NodeKind::Other,
    }
}

/// Leading string literal of a definition body.
fn docstring(definition: Node<'_>, source: &str) -> Option<String> {
    let body = definition.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let first = body.named_children(&mut cursor).find(|n| !n.is_extra())?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0)?;
    if literal.kind() != "string" {
        return None;
    }

    let raw = node_text(literal, source);
    let prefix: String = raw
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    // f-strings and bytes are expressions, not documentation
    if prefix.contains('f') || prefix.contains('b') {
        return None;
    }
    Some(clean_string_literal(raw))
}

fn bases(class: Node<'_>, source: &str) -> Vec<String> {
    let Some(arguments) = class.child_by_field_name("superclasses") else {
        return Vec::new();
    };
    let mut cursor = arguments.walk();
    arguments
        .named_children(&mut cursor)
        .filter(|n| matches!(n.kind(), "identifier" | "attribute" | "subscript"))
        .map(|n| node_text(n, source).to_string())
        .collect()
}

fn assignment_targets(assignment: Node<'_>, source: &str) -> Vec<AssignTarget> {
    match assignment.child_by_field_name("left") {
        Some(left) if left.kind() == "identifier" => {
            vec![AssignTarget::Name(node_text(left, source).to_string())]
        }
        Some(_) => vec![AssignTarget::Complex],
        None => Vec::new(),
    }
}
