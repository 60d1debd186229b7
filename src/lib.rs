//! Symscan - symbol inventory for source trees.
//!
//! Symscan walks a file or directory, parses every supported source file
//! with tree-sitter and extracts a flat inventory of symbols (functions,
//! classes, methods, module-level variables) plus the dependency facts
//! between them (imports, inheritance and, in deep mode, calls).
//!
//! # Architecture
//!
//! - `config`: validated, immutable analysis options
//! - `discover`: ordered enumeration of candidate files
//! - `parser`: `ParserAdapter` trait and tree-sitter backends
//! - `analysis`: scope-aware extraction, aggregation and the runner
//! - `compat`: client version compatibility gate
//! - `audit`: audit sink for deep mode
//! - `report`: output formatting (pretty, JSON)
//!
//! # Adding a New Language
//!
//! See `src/parser/languages/` for examples. Write a classifier mapping the
//! grammar's node kinds onto `NodeKind` and register the adapter in
//! `languages/mod.rs`.

use std::path::Path;

use serde_json::Value;

pub mod analysis;
pub mod audit;
pub mod cli;
pub mod compat;
pub mod config;
pub mod discover;
pub mod error;
pub mod logging;
pub mod parser;
pub mod report;

pub use analysis::{
    AnalysisResult, Analyzer, Dependency, DependencyKind, Symbol, SymbolKind,
};
pub use audit::{AuditEvent, AuditSink, JsonLinesAuditSink};
pub use compat::{CompatibilityGate, PatchPolicy, Version};
pub use config::{ConfigFile, Configuration, ConfigurationBuilder};
pub use error::{
    AnalysisError, ConfigError, EngineError, FileFailure, ParseError, PathError, VersionError,
};
pub use parser::{ParserAdapter, ParserRegistry};

/// Version of the running engine.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Analyze a file or directory.
///
/// Uses the default `Configuration` when `config` is `None`.
pub fn analyze<P: AsRef<Path>>(
    source: P,
    config: Option<&Configuration>,
) -> Result<AnalysisResult, AnalysisError> {
    let config = config.cloned().unwrap_or_default();
    Analyzer::new(config).run(source.as_ref())
}

/// Features available in this build, as stable lower-case tokens.
pub fn capabilities() -> Vec<String> {
    let mut caps = vec!["analyze".to_string(), "check-compatibility".to_string()];
    if cfg!(feature = "deep-mode") {
        caps.push("deep-mode".to_string());
    }
    caps.push("parallel".to_string());
    caps.extend(
        ParserRegistry::builtin()
            .languages()
            .into_iter()
            .map(|lang| format!("lang-{}", lang)),
    );
    caps
}

/// Check a client version string with the default patch policy.
pub fn check_compatibility(client_version: &str) -> Result<bool, VersionError> {
    CompatibilityGate::default().check(client_version)
}

/// Like `check_compatibility`, but accepts any JSON value and rejects
/// non-strings.
pub fn check_compatibility_value(client_version: &Value) -> Result<bool, VersionError> {
    CompatibilityGate::default().check_value(client_version)
}
