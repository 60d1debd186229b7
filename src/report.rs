//! Output formatting for analysis results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use std::collections::BTreeMap;
use std::path::Path;

use colored::*;
use serde::{Deserialize, Serialize};

use crate::analysis::deep::complexity_of;
use crate::analysis::{AnalysisResult, Dependency, Metadata, Symbol, SymbolKind};

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON report.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub file_count: usize,
    pub error_count: usize,
    pub symbols: Vec<JsonSymbol>,
    pub dependencies: Vec<Dependency>,
    pub warnings: Vec<String>,
    pub metadata: Metadata,
}

/// Symbol with its path rendered relative to the analysis root.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

/// Build the JSON report for a result.
pub fn json_report(root: &Path, result: &AnalysisResult) -> JsonReport {
    JsonReport {
        version: crate::ENGINE_VERSION.to_string(),
        path: root.to_string_lossy().to_string(),
        file_count: result.file_count,
        error_count: result.error_count,
        symbols: result
            .symbols
            .iter()
            .map(|s| symbol_to_json(root, s))
            .collect(),
        dependencies: result.dependencies.clone(),
        warnings: result.warnings.clone(),
        metadata: result.metadata.clone(),
    }
}

fn symbol_to_json(root: &Path, s: &Symbol) -> JsonSymbol {
    JsonSymbol {
        name: s.name.clone(),
        kind: s.kind,
        file: make_relative_path(&s.file_path, root),
        line: s.line,
        column: s.column,
        end_line: s.end_line,
        end_column: s.end_column,
        scope: s.scope.clone(),
        docstring: s.docstring.clone(),
        metadata: s.metadata.clone(),
    }
}

/// Write results in JSON format.
pub fn write_json(root: &Path, result: &AnalysisResult) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&json_report(root, result))?;
    println!("{}", json);
    Ok(())
}

fn make_relative_path(file: &Path, root: &Path) -> String {
    // Single-file scan: report just the file name
    if file == root {
        return file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.to_string_lossy().to_string());
    }

    file.strip_prefix(root)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| file.to_string_lossy().to_string())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(root: &Path, result: &AnalysisResult) {
    // Header
    println!();
    print!("  ");
    print!("{}", "symscan".cyan().bold());
    println!(" v{}", crate::ENGINE_VERSION);
    println!();

    print!("  {}", "Analyzing: ".dimmed());
    println!("{}", root.display());
    if result.metadata.get("deep_mode").and_then(|v| v.as_bool()) == Some(true) {
        print!("  {}", "Mode: ".dimmed());
        println!("{}", "deep".magenta());
    }
    println!();

    if !result.symbols.is_empty() {
        write_symbols(root, &result.symbols);
        println!();
    }

    if !result.dependencies.is_empty() {
        write_dependency_counts(&result.dependencies);
        println!();
    }

    if !result.warnings.is_empty() {
        write_warnings(&result.warnings);
        println!();
    }

    for line in result.summary().lines() {
        println!("  {}", line);
    }
    println!();
}

fn write_symbols(root: &Path, symbols: &[Symbol]) {
    println!("  {} ({}):", "Symbols".bold(), symbols.len());

    let mut current: Option<&Path> = None;
    for s in symbols {
        if current != Some(s.file_path.as_path()) {
            println!();
            println!("    {}", make_relative_path(&s.file_path, root).blue());
            current = Some(s.file_path.as_path());
        }

        print!("      ");
        write_kind_tag(s.kind);
        print!("{}", s.qualified_name());
        print!("{}", format!("  {}:{}", s.line, s.column).dimmed());
        if let Some(complexity) = complexity_of(&s.metadata) {
            print!("{}", format!("  complexity {}", complexity).dimmed());
        }
        println!();
    }
}

fn write_kind_tag(kind: SymbolKind) {
    let tag = format!("{:<9}", kind.as_str());
    match kind {
        SymbolKind::Class => print!("{}", tag.yellow()),
        SymbolKind::Function => print!("{}", tag.green()),
        SymbolKind::Method => print!("{}", tag.cyan()),
        _ => print!("{}", tag.white()),
    }
}

fn write_dependency_counts(dependencies: &[Dependency]) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for d in dependencies {
        *counts.entry(d.kind.as_str()).or_default() += 1;
    }

    println!("  {} ({}):", "Dependencies".bold(), dependencies.len());
    for (kind, count) in counts {
        println!("    {:<12} {}", kind, count);
    }
}

fn write_warnings(warnings: &[String]) {
    println!("  {} ({}):", "Warnings".bold(), warnings.len());
    for w in warnings {
        println!("    {} {}", "WARN".yellow(), w);
    }
}
