//! Deep-mode analysis: complexity, call edges and the audit trail.

use serde_json::Value;

use super::result::{Dependency, DependencyKind, Metadata};
use crate::audit::{timestamp, AuditEvent, AuditSink};
use crate::parser::{NodeKind, SyntaxNode};

/// Feature name reported in `deep_mode_accessed` events.
pub const DEEP_FEATURE: &str = "deep-analysis";

/// Cyclomatic complexity of a function: 1 + decision points in its body.
///
/// Decision points inside nested functions and lambdas belong to those and
/// are not counted.
pub fn cyclomatic_complexity(function: &SyntaxNode) -> usize {
    let mut complexity = 1;
    let mut pending: Vec<&SyntaxNode> = function.children.iter().collect();
    while let Some(node) = pending.pop() {
        match node.kind {
            NodeKind::Function { .. } | NodeKind::Lambda => {}
            NodeKind::Branch => {
                complexity += 1;
                pending.extend(&node.children);
            }
            _ => pending.extend(&node.children),
        }
    }
    complexity
}

/// A `call` dependency from `source` to the called expression.
pub fn call_dependency(source: String, callee: &str, line: usize) -> Dependency {
    Dependency {
        source,
        target: callee.to_string(),
        kind: DependencyKind::Call,
        line,
        metadata: Metadata::new(),
    }
}

/// Audit trail for one deep-mode run.
///
/// Every method is a no-op when no sink is attached, so callers can emit
/// unconditionally.
pub struct AuditTrail<'a> {
    sink: Option<&'a dyn AuditSink>,
    source: String,
}

impl<'a> AuditTrail<'a> {
    pub fn new(sink: Option<&'a dyn AuditSink>, source: String) -> Self {
        Self { sink, source }
    }

    fn emit(&self, event: AuditEvent) {
        if let Some(sink) = self.sink {
            tracing::trace!("audit event {}", event.event_type());
            event.send(sink);
        }
    }

    pub fn started(&self, file_count: usize) {
        self.emit(AuditEvent::AnalysisStarted {
            source: self.source.clone(),
            file_count,
            timestamp: timestamp(),
        });
    }

    pub fn file_analyzed(&self, file: &str, symbols_found: usize) {
        self.emit(AuditEvent::DeepModeAccessed {
            feature: DEEP_FEATURE.to_string(),
            file: file.to_string(),
            timestamp: timestamp(),
        });
        self.emit(AuditEvent::FileAnalyzed {
            file: file.to_string(),
            symbols_found,
            timestamp: timestamp(),
        });
    }

    pub fn file_failed(&self, file: &str, error: &str) {
        self.emit(AuditEvent::DeepModeAccessed {
            feature: DEEP_FEATURE.to_string(),
            file: file.to_string(),
            timestamp: timestamp(),
        });
        self.emit(AuditEvent::FileFailed {
            file: file.to_string(),
            error: error.to_string(),
            timestamp: timestamp(),
        });
    }

    pub fn completed(&self, file_count: usize, symbols_found: usize, error_count: usize) {
        self.emit(AuditEvent::AnalysisCompleted {
            source: self.source.clone(),
            file_count,
            symbols_found,
            error_count,
            timestamp: timestamp(),
        });
    }
}

/// Value of a symbol's `complexity` metadata entry, if present.
pub fn complexity_of(metadata: &Metadata) -> Option<u64> {
    metadata.get("complexity").and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Span;
    use std::sync::Mutex;

    fn node(kind: NodeKind, children: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::new(kind, Span::default()).with_children(children)
    }

    #[test]
    fn test_complexity_skips_nested_functions() {
        let nested = node(
            NodeKind::Function {
                name: "inner".to_string(),
                docstring: None,
            },
            vec![node(NodeKind::Branch, vec![]), node(NodeKind::Branch, vec![])],
        );
        let lambda = node(NodeKind::Lambda, vec![node(NodeKind::Branch, vec![])]);
        let outer = node(
            NodeKind::Function {
                name: "outer".to_string(),
                docstring: None,
            },
            vec![
                node(NodeKind::Branch, vec![node(NodeKind::Branch, vec![])]),
                nested.clone(),
                lambda,
            ],
        );

        assert_eq!(cyclomatic_complexity(&outer), 3);
        assert_eq!(cyclomatic_complexity(&nested), 3);
    }

    #[test]
    fn test_audit_trail_order() {
        let seen = Mutex::new(Vec::new());
        let record = |event_type: &str, _payload: &Value| {
            seen.lock().unwrap().push(event_type.to_string());
        };
        let sink: &dyn AuditSink = &record;

        let trail = AuditTrail::new(Some(sink), "src".to_string());
        trail.started(2);
        trail.file_analyzed("a.py", 3);
        trail.file_failed("b.py", "syntax error");
        trail.completed(2, 3, 1);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "analysis_started",
                "deep_mode_accessed",
                "file_analyzed",
                "deep_mode_accessed",
                "file_failed",
                "analysis_completed",
            ]
        );
    }

    #[test]
    fn test_inactive_trail() {
        let trail = AuditTrail::new(None, "src".to_string());
        trail.started(1);
        trail.file_analyzed("a.py", 1);
        trail.completed(1, 1, 0);
    }
}
