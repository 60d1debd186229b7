//! Symbols, dependencies and the aggregated result of an analysis run.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FileFailure;

/// Extra key/value facts attached to symbols, dependencies and results.
pub type Metadata = BTreeMap<String, Value>;

/// Kind of extracted symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
    Method,
    Variable,
    Constant,
    Module,
    Interface,
    TypeAlias,
    Enum,
    Import,
    Export,
    #[serde(other)]
    Unknown,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Module => "module",
            SymbolKind::Interface => "interface",
            SymbolKind::TypeAlias => "type_alias",
            SymbolKind::Enum => "enum",
            SymbolKind::Import => "import",
            SymbolKind::Export => "export",
            SymbolKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SymbolKind {
    type Err = std::convert::Infallible;

    /// Unrecognized names map to `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "function" => SymbolKind::Function,
            "class" => SymbolKind::Class,
            "method" => SymbolKind::Method,
            "variable" => SymbolKind::Variable,
            "constant" => SymbolKind::Constant,
            "module" => SymbolKind::Module,
            "interface" => SymbolKind::Interface,
            "type_alias" => SymbolKind::TypeAlias,
            "enum" => SymbolKind::Enum,
            "import" => SymbolKind::Import,
            "export" => SymbolKind::Export,
            _ => SymbolKind::Unknown,
        })
    }
}

/// A named, positioned code entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub file_path: PathBuf,
    /// Start line (1-indexed).
    pub line: usize,
    /// Start column (0-indexed, in UTF-8 bytes).
    pub column: usize,
    pub end_line: usize,
    /// End column (0-indexed, in UTF-8 bytes).
    pub end_column: usize,
    /// Dot-joined enclosing scope; `None` at module level.
    pub scope: Option<String>,
    pub docstring: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Symbol {
    /// Scope-qualified name, e.g. `Outer.method`.
    pub fn qualified_name(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{}.{}", scope, self.name),
            None => self.name.clone(),
        }
    }
}

/// Relationship between two named entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Import,
    Inheritance,
    Call,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Import => "import",
            DependencyKind::Inheritance => "inheritance",
            DependencyKind::Call => "call",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub source: String,
    pub target: String,
    pub kind: DependencyKind,
    pub line: usize,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Everything extracted from one successfully parsed file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub language: String,
    pub symbols: Vec<Symbol>,
    pub dependencies: Vec<Dependency>,
}

/// Outcome of a whole `analyze` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub symbols: Vec<Symbol>,
    pub dependencies: Vec<Dependency>,
    pub file_count: usize,
    pub error_count: usize,
    pub warnings: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl AnalysisResult {
    /// Human-readable counts.
    pub fn summary(&self) -> String {
        format!(
            "Analysis Summary:\n  Files analyzed: {}\n  Symbols found: {}\n  Dependencies: {}\n  Errors: {}\n  Warnings: {}",
            self.file_count,
            self.symbols.len(),
            self.dependencies.len(),
            self.error_count,
            self.warnings.len()
        )
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

/// Append-only accumulator for one run.
///
/// Outcomes must be added in enumeration order; the aggregator never
/// reorders.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    result: AnalysisResult,
    languages: BTreeMap<String, usize>,
}

impl ResultAggregator {
    /// Start a run over `file_count` enumerated files.
    pub fn new(file_count: usize, enumeration_warnings: Vec<String>) -> Self {
        Self {
            result: AnalysisResult {
                file_count,
                warnings: enumeration_warnings,
                ..Default::default()
            },
            languages: BTreeMap::new(),
        }
    }

    pub fn add_success(&mut self, file: FileAnalysis) {
        *self.languages.entry(file.language).or_default() += 1;
        self.result.symbols.extend(file.symbols);
        self.result.dependencies.extend(file.dependencies);
    }

    pub fn add_failure(&mut self, failure: &FileFailure) {
        self.result.error_count += 1;
        self.result.warnings.push(failure.to_string());
    }

    pub fn symbol_count(&self) -> usize {
        self.result.symbols.len()
    }

    pub fn error_count(&self) -> usize {
        self.result.error_count
    }

    /// Finish the run, attaching run metadata.
    pub fn finish(mut self, mut metadata: Metadata) -> AnalysisResult {
        let languages = self
            .languages
            .into_iter()
            .map(|(lang, count)| (lang, Value::from(count)))
            .collect();
        metadata.insert("languages".to_string(), Value::Object(languages));
        self.result.metadata = metadata;
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(name: &str, kind: SymbolKind, scope: Option<&str>) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind,
            file_path: PathBuf::from("a.py"),
            line: 1,
            column: 0,
            end_line: 1,
            end_column: 5,
            scope: scope.map(str::to_string),
            docstring: None,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_symbol_kind_parse() {
        assert_eq!("type_alias".parse::<SymbolKind>().unwrap(), SymbolKind::TypeAlias);
        assert_eq!("method".parse::<SymbolKind>().unwrap(), SymbolKind::Method);
        assert_eq!("struct".parse::<SymbolKind>().unwrap(), SymbolKind::Unknown);
    }

    #[test]
    fn test_symbol_kind_serde() {
        assert_eq!(
            serde_json::to_string(&SymbolKind::TypeAlias).unwrap(),
            "\"type_alias\""
        );
        let kind: SymbolKind = serde_json::from_str("\"trait\"").unwrap();
        assert_eq!(kind, SymbolKind::Unknown);
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(symbol("f", SymbolKind::Function, None).qualified_name(), "f");
        assert_eq!(
            symbol("m", SymbolKind::Method, Some("Outer.Inner")).qualified_name(),
            "Outer.Inner.m"
        );
    }

    #[test]
    fn test_summary() {
        let result = AnalysisResult {
            symbols: vec![symbol("f", SymbolKind::Function, None)],
            file_count: 2,
            error_count: 1,
            warnings: vec!["failed to parse bad.py".to_string()],
            ..Default::default()
        };
        assert_eq!(
            result.summary(),
            "Analysis Summary:\n  Files analyzed: 2\n  Symbols found: 1\n  Dependencies: 0\n  Errors: 1\n  Warnings: 1"
        );
    }

    #[test]
    fn test_aggregator_order_and_counts() {
        let mut agg = ResultAggregator::new(3, vec!["traversal error: loop".to_string()]);
        agg.add_success(FileAnalysis {
            path: PathBuf::from("a.py"),
            language: "python".to_string(),
            symbols: vec![symbol("first", SymbolKind::Function, None)],
            dependencies: vec![],
        });
        agg.add_failure(&FileFailure::Decode {
            path: PathBuf::from("b.py"),
        });
        agg.add_success(FileAnalysis {
            path: PathBuf::from("c.py"),
            language: "python".to_string(),
            symbols: vec![symbol("second", SymbolKind::Class, None)],
            dependencies: vec![],
        });

        let result = agg.finish(Metadata::new());
        assert_eq!(result.file_count, 3);
        assert_eq!(result.error_count, 1);
        let names: Vec<_> = result.symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(result.warnings[0], "traversal error: loop");
        assert!(result.warnings[1].contains("b.py"));
        assert_eq!(result.metadata["languages"]["python"], 2);
    }
}
