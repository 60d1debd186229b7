//! Scope-aware symbol extraction over a lowered syntax tree.

use std::path::Path;

use serde_json::Value;

use super::deep;
use super::result::{Dependency, DependencyKind, Metadata, Symbol, SymbolKind};
use crate::parser::{AssignTarget, NodeKind, Span, SyntaxNode, SyntaxTree};

/// Chain of enclosing named constructs. Empty means module level.
///
/// A scope is never mutated; entering a construct produces a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope(Vec<String>);

impl Scope {
    pub fn module() -> Self {
        Self::default()
    }

    /// Scope of a construct named `name` declared in `self`.
    pub fn enter(&self, name: &str) -> Self {
        let mut names = self.0.clone();
        names.push(name.to_string());
        Self(names)
    }

    pub fn is_module_level(&self) -> bool {
        self.0.is_empty()
    }

    /// Dot-joined names, `None` at module level.
    pub fn joined(&self) -> Option<String> {
        (!self.is_module_level()).then(|| self.0.join("."))
    }

    /// Dot-joined scope plus one more name.
    pub fn qualify(&self, name: &str) -> String {
        match self.joined() {
            Some(scope) => format!("{}.{}", scope, name),
            None => name.to_string(),
        }
    }
}

/// Name used for the scope opened by an anonymous function.
pub const LAMBDA_SCOPE: &str = "<lambda>";

/// Symbols and dependencies of one file, in document order.
#[derive(Debug, Default)]
pub struct Extraction {
    pub symbols: Vec<Symbol>,
    pub dependencies: Vec<Dependency>,
}

/// Extract symbols from a parsed file.
///
/// With `deep` set, callables additionally carry a `complexity` metadata
/// entry and every call site becomes a `call` dependency.
pub fn extract(tree: &SyntaxTree, file_path: &Path, deep: bool) -> Extraction {
    let module = file_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut extractor = Extractor {
        file_path,
        module,
        language: tree.language,
        deep,
        out: Extraction::default(),
    };
    extractor.visit(&tree.root, &Scope::module());
    extractor.out
}

struct Extractor<'a> {
    file_path: &'a Path,
    module: String,
    language: &'static str,
    deep: bool,
    out: Extraction,
}

impl Extractor<'_> {
    fn visit(&mut self, node: &SyntaxNode, scope: &Scope) {
        match &node.kind {
            NodeKind::Function { name, docstring } => {
                let kind = if scope.is_module_level() {
                    SymbolKind::Function
                } else {
                    SymbolKind::Method
                };
                let mut symbol = self.symbol(name, kind, node.span, scope, docstring.clone());
                if self.deep {
                    symbol.metadata.insert(
                        "complexity".to_string(),
                        Value::from(deep::cyclomatic_complexity(node)),
                    );
                }
                self.out.symbols.push(symbol);
                self.visit_children(node, &scope.enter(name));
            }
            NodeKind::Class {
                name,
                docstring,
                bases,
            } => {
                let symbol = self.symbol(name, SymbolKind::Class, node.span, scope, docstring.clone());
                self.out.symbols.push(symbol);

                let qualified = scope.qualify(name);
                for base in bases {
                    self.dependency(&qualified, base, DependencyKind::Inheritance, node.span);
                }
                self.visit_children(node, &scope.enter(name));
            }
            NodeKind::Impl { target, traits } => {
                let qualified = scope.qualify(target);
                for name in traits {
                    self.dependency(&qualified, name, DependencyKind::Inheritance, node.span);
                }
                self.visit_children(node, &scope.enter(target));
            }
            NodeKind::Lambda => {
                self.visit_children(node, &scope.enter(LAMBDA_SCOPE));
            }
            NodeKind::Assignment { targets } => {
                if scope.is_module_level() {
                    for target in targets {
                        if let AssignTarget::Name(name) = target {
                            let symbol =
                                self.symbol(name, SymbolKind::Variable, node.span, scope, None);
                            self.out.symbols.push(symbol);
                        }
                    }
                }
                self.visit_children(node, scope);
            }
            NodeKind::Import { modules } => {
                let source = self.source_name(scope);
                for module in modules {
                    self.dependency(&source, module, DependencyKind::Import, node.span);
                }
                self.visit_children(node, scope);
            }
            NodeKind::Call { callee } => {
                if self.deep {
                    let source = self.source_name(scope);
                    self.out
                        .dependencies
                        .push(deep::call_dependency(source, callee, node.span.start_line));
                }
                self.visit_children(node, scope);
            }
            NodeKind::Branch | NodeKind::Other => self.visit_children(node, scope),
        }
    }

    fn visit_children(&mut self, node: &SyntaxNode, scope: &Scope) {
        for child in &node.children {
            self.visit(child, scope);
        }
    }

    fn symbol(
        &self,
        name: &str,
        kind: SymbolKind,
        span: Span,
        scope: &Scope,
        docstring: Option<String>,
    ) -> Symbol {
        let mut metadata = Metadata::new();
        metadata.insert("language".to_string(), Value::from(self.language));
        Symbol {
            name: name.to_string(),
            kind,
            file_path: self.file_path.to_path_buf(),
            line: span.start_line,
            column: span.start_column,
            end_line: span.end_line,
            end_column: span.end_column,
            scope: scope.joined(),
            docstring,
            metadata,
        }
    }

    fn dependency(&mut self, source: &str, target: &str, kind: DependencyKind, span: Span) {
        self.out.dependencies.push(Dependency {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            line: span.start_line,
            metadata: Metadata::new(),
        });
    }

    /// Enclosing scope, or the module name at module level.
    fn source_name(&self, scope: &Scope) -> String {
        scope.joined().unwrap_or_else(|| self.module.clone())
    }
}
