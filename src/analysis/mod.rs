//! Symbol analysis.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ discover     │────▶│ parser       │────▶│ extract       │
//! │ (file list)  │     │ (SyntaxTree) │     │ (Symbols,Deps)│
//! └──────────────┘     └──────────────┘     └───────────────┘
//!                                                   │
//!                                                   ▼
//!                                           ┌───────────────┐
//!                                           │ Aggregator    │
//!                                           │ (Result)      │
//!                                           └───────────────┘
//! ```
//!
//! `runner::Analyzer` drives the pipeline. Deep mode (`deep`) adds
//! complexity metadata, call edges and an audit trail.

pub mod deep;
pub mod extract;
pub mod result;
pub mod runner;

pub use extract::{extract, Extraction, Scope};
pub use result::{
    AnalysisResult, Dependency, DependencyKind, FileAnalysis, Metadata, ResultAggregator, Symbol,
    SymbolKind,
};
pub use runner::{analyze_file, Analyzer};
