//! Node classification shared by the JavaScript and TypeScript grammars.

use tree_sitter::Node;

use crate::parser::treesitter::{clean_doc, field_text, node_text};
use crate::parser::{AssignTarget, NodeKind};

const FUNCTION_VALUE_KINDS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

const BRANCH_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "switch_case",
    "catch_clause",
    "ternary_expression",
];

pub(super) fn classify(node: Node<'_>, source: &str) -> NodeKind {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" | "method_definition" => {
            match field_text(node, "name", source) {
                Some(name) => NodeKind::Function {
                    name: name.to_string(),
                    docstring: jsdoc(node, source),
                },
                None => NodeKind::Other,
            }
        }
        kind if FUNCTION_VALUE_KINDS.contains(&kind) => {
            // `const f = () => ...` is lowered at the declarator
            if is_named_declarator_value(node) {
                NodeKind::Other
            } else {
                NodeKind::Lambda
            }
        }
        "variable_declarator" => match named_function_value(node, source) {
            Some(name) => NodeKind::Function {
                name: name.to_string(),
                docstring: node.parent().and_then(|decl| jsdoc(decl, source)),
            },
            None => NodeKind::Other,
        },
        "class_declaration" | "abstract_class_declaration" | "class" => {
            match field_text(node, "name", source) {
                Some(name) => NodeKind::Class {
                    name: name.to_string(),
                    docstring: jsdoc(node, source),
                    bases: heritage(node, source),
                },
                None => NodeKind::Lambda,
            }
        }
        "lexical_declaration" | "variable_declaration" if is_loop_initializer(node) => {
            NodeKind::Other
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            let targets = node
                .named_children(&mut cursor)
                .filter(|d| d.kind() == "variable_declarator")
                .filter(|d| named_function_value(*d, source).is_none())
                .map(|d| match d.child_by_field_name("name") {
                    Some(name) if name.kind() == "identifier" => {
                        AssignTarget::Name(node_text(name, source).to_string())
                    }
                    _ => AssignTarget::Complex,
                })
                .collect();
            NodeKind::Assignment { targets }
        }
        "import_statement" => NodeKind::Import {
            modules: field_text(node, "source", source)
                .map(|s| vec![unquote(s).to_string()])
                .unwrap_or_default(),
        },
        "call_expression" => match field_text(node, "function", source) {
            Some(callee) => NodeKind::Call {
                callee: callee.to_string(),
            },
            None => NodeKind::Other,
        },
        "binary_expression" => match field_text(node, "operator", source) {
            Some("&&" | "||" | "??") => NodeKind::Branch,
            _ => NodeKind::Other,
        },
        kind if BRANCH_KINDS.contains(&kind) => NodeKind::Branch,
        _ => NodeKind::Other,
    }
}

/// Name of a declarator whose value is a function (`const f = () => {}`).
fn named_function_value<'s>(declarator: Node<'_>, source: &'s str) -> Option<&'s str> {
    let name = declarator.child_by_field_name("name")?;
    let value = declarator.child_by_field_name("value")?;
    if name.kind() == "identifier" && FUNCTION_VALUE_KINDS.contains(&value.kind()) {
        Some(node_text(name, source))
    } else {
        None
    }
}

fn is_named_declarator_value(node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    parent.kind() == "variable_declarator"
        && parent.child_by_field_name("value") == Some(node)
        && parent
            .child_by_field_name("name")
            .is_some_and(|n| n.kind() == "identifier")
}

/// `let i = 0` in `for (let i = 0; ...)` binds a loop variable, not a
/// module-level one.
fn is_loop_initializer(declaration: Node<'_>) -> bool {
    declaration
        .parent()
        .is_some_and(|parent| parent.kind() == "for_statement")
}

/// Names listed in `extends` / `implements`.
fn heritage(class: Node<'_>, source: &str) -> Vec<String> {
    let mut cursor = class.walk();
    let Some(clause) = class
        .named_children(&mut cursor)
        .find(|n| n.kind() == "class_heritage")
    else {
        return Vec::new();
    };

    let mut bases = Vec::new();
    let mut cursor = clause.walk();
    for part in clause.named_children(&mut cursor) {
        match part.kind() {
            "extends_clause" | "implements_clause" => {
                let mut inner = part.walk();
                bases.extend(
                    part.named_children(&mut inner)
                        .filter(|n| n.kind() != "type_arguments")
                        .map(|n| node_text(n, source).to_string()),
                );
            }
            _ => bases.push(node_text(part, source).to_string()),
        }
    }
    bases
}

/// `/** ... */` comment directly above a declaration (or its `export`).
fn jsdoc(node: Node<'_>, source: &str) -> Option<String> {
    let anchor = match node.parent() {
        Some(parent) if parent.kind() == "export_statement" => parent,
        _ => node,
    };
    let comment = anchor.prev_named_sibling()?;
    if comment.kind() != "comment"
        || comment.end_position().row + 1 < anchor.start_position().row
    {
        return None;
    }

    let text = node_text(comment, source);
    let body = text.strip_prefix("/**")?.strip_suffix("*/")?;
    let lines: Vec<&str> = body
        .lines()
        .map(|l| {
            let l = l.trim_start();
            let l = l.strip_prefix('*').unwrap_or(l);
            l.strip_prefix(' ').unwrap_or(l)
        })
        .collect();
    let doc = clean_doc(&lines.join("\n"));
    (!doc.is_empty()).then_some(doc)
}

fn unquote(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}
