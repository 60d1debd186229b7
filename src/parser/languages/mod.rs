//! Language-specific tree-sitter configurations.
//!
//! Each language module provides:
//! - A node classifier lowering grammar nodes to `NodeKind`
//! - Factory functions for creating adapters

mod ecmascript;
pub mod javascript;
pub mod python;
pub mod rust;
pub mod typescript;

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::ParserAdapter;

/// Adapters are stateless, so one shared set serves every registry.
static BUILTIN: Lazy<Vec<Arc<dyn ParserAdapter>>> = Lazy::new(|| {
    vec![
        Arc::new(python::new_adapter()) as Arc<dyn ParserAdapter>,
        Arc::new(javascript::new_adapter()),
        Arc::new(typescript::new_adapter()),
        Arc::new(typescript::new_tsx_adapter()),
        Arc::new(rust::new_adapter()),
    ]
});

/// All adapters compiled into this build.
pub fn builtin_adapters() -> Vec<Arc<dyn ParserAdapter>> {
    BUILTIN.clone()
}
