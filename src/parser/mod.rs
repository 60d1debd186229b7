//! Parser adapters: source text in, language-neutral syntax tree out.
//!
//! This module provides:
//! - `ParserAdapter` trait: the interface every language backend implements
//! - `ParserRegistry`: extension-based adapter lookup
//! - Tree-sitter backends for Python, JavaScript, TypeScript and Rust

use std::path::Path;
use std::sync::Arc;

use crate::error::{EngineError, ParseError};

pub mod syntax;

#[cfg(feature = "tree-sitter")]
pub mod treesitter;

#[cfg(feature = "tree-sitter")]
pub mod languages;

pub use syntax::{AssignTarget, NodeKind, Span, SyntaxNode, SyntaxTree};

/// Maps file extensions (without dot) to language identifiers.
static EXTENSION_LANGUAGES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "py" => "python",
    "pyi" => "python",
    "js" => "javascript",
    "jsx" => "javascript",
    "mjs" => "javascript",
    "cjs" => "javascript",
    "ts" => "typescript",
    "tsx" => "typescript",
    "mts" => "typescript",
    "cts" => "typescript",
    "rs" => "rust",
};

/// Language identifier for a file extension (without dot), if known.
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    EXTENSION_LANGUAGES.get(ext).copied()
}

/// Lower-cased extension of `path`, without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Language backend turning source text into a `SyntaxTree`.
///
/// Implementations must be shareable across worker threads; tree-sitter
/// parsers are not `Sync`, so backends create one per call.
pub trait ParserAdapter: Send + Sync {
    /// Returns the language identifier (e.g., "python").
    fn language_id(&self) -> &'static str;

    /// Returns file extensions this adapter handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Check that the underlying engine can be loaded.
    fn probe(&self) -> Result<(), EngineError>;

    /// Parse source text. Malformed input is an error, never a partial tree.
    fn parse(&self, source: &str) -> Result<SyntaxTree, ParseError>;

    /// Check if this adapter handles the given file extension.
    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}

/// Set of adapters available to an analysis run.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    adapters: Vec<Arc<dyn ParserAdapter>>,
}

impl ParserRegistry {
    /// Registry with the adapters compiled into this build.
    pub fn builtin() -> Self {
        #[cfg(feature = "tree-sitter")]
        {
            Self {
                adapters: languages::builtin_adapters(),
            }
        }
        #[cfg(not(feature = "tree-sitter"))]
        {
            Self::default()
        }
    }

    pub fn new(adapters: Vec<Arc<dyn ParserAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn adapters(&self) -> impl Iterator<Item = &Arc<dyn ParserAdapter>> {
        self.adapters.iter()
    }

    /// Get the adapter for an extension (without dot).
    pub fn for_extension(&self, ext: &str) -> Option<&Arc<dyn ParserAdapter>> {
        self.adapters.iter().find(|a| a.handles_extension(ext))
    }

    /// Get the adapter responsible for a path.
    pub fn for_path(&self, path: &Path) -> Option<&Arc<dyn ParserAdapter>> {
        extension_of(path).and_then(|ext| self.for_extension(&ext))
    }

    /// Check whether a path has a supported extension.
    pub fn supports(&self, path: &Path) -> bool {
        self.for_path(path).is_some()
    }

    /// Sorted, de-duplicated list of registered language identifiers.
    pub fn languages(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.adapters.iter().map(|a| a.language_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Verify every engine loads. Fails on the first broken adapter, or when
    /// no adapter is registered at all.
    pub fn probe(&self) -> Result<(), EngineError> {
        if self.adapters.is_empty() {
            return Err(EngineError {
                language: "any".to_string(),
                reason: "no parser backends are compiled into this build".to_string(),
            });
        }
        for adapter in &self.adapters {
            adapter.probe()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}
