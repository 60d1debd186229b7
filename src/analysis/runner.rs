//! Analysis runner: enumerate, parse and extract, then aggregate.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde_json::Value;

use super::deep::AuditTrail;
use super::extract::extract;
use super::result::{AnalysisResult, FileAnalysis, Metadata, ResultAggregator};
use crate::config::Configuration;
use crate::discover::enumerate;
use crate::error::{AnalysisError, FileFailure};
use crate::parser::ParserRegistry;

/// Runs analyses with one configuration and one set of parser backends.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: Configuration,
    registry: ParserRegistry,
}

impl Analyzer {
    /// Create an analyzer using the parser backends compiled into this build.
    pub fn new(config: Configuration) -> Self {
        Self::with_registry(config, ParserRegistry::builtin())
    }

    pub fn with_registry(config: Configuration, registry: ParserRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Analyze a file or directory.
    ///
    /// Fails only when the parser engine is unavailable or the root path is
    /// unusable. Problems with individual files are recorded in the result.
    pub fn run(&self, source: &Path) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        self.registry.probe()?;

        let enumeration = enumerate(source, &self.config, &self.registry)?;
        let file_count = enumeration.files.len();
        tracing::info!(
            "analyzing {} file(s) under {}",
            file_count,
            source.display()
        );

        let deep = self.config.deep_mode_enabled();
        let trail = AuditTrail::new(
            self.config.active_audit_sink(),
            source.display().to_string(),
        );
        trail.started(file_count);

        let outcomes: Vec<Result<FileAnalysis, FileFailure>> = if self.config.parallel() {
            enumeration
                .files
                .par_iter()
                .map(|path| analyze_file(&self.registry, path, deep))
                .collect()
        } else {
            enumeration
                .files
                .iter()
                .map(|path| analyze_file(&self.registry, path, deep))
                .collect()
        };

        // Outcomes are in enumeration order regardless of mode
        let mut aggregator = ResultAggregator::new(file_count, enumeration.warnings);
        for (path, outcome) in enumeration.files.iter().zip(outcomes) {
            let file = path.display().to_string();
            match outcome {
                Ok(analysis) => {
                    tracing::debug!("{}: {} symbol(s)", file, analysis.symbols.len());
                    trail.file_analyzed(&file, analysis.symbols.len());
                    aggregator.add_success(analysis);
                }
                Err(failure) => {
                    tracing::warn!("{}", failure);
                    trail.file_failed(&file, &failure.to_string());
                    aggregator.add_failure(&failure);
                }
            }
        }

        trail.completed(file_count, aggregator.symbol_count(), aggregator.error_count());

        let mut metadata = Metadata::new();
        metadata.insert(
            "engine_version".to_string(),
            Value::from(crate::ENGINE_VERSION),
        );
        metadata.insert("deep_mode".to_string(), Value::from(deep));
        metadata.insert("parallel".to_string(), Value::from(self.config.parallel()));
        metadata.insert(
            "duration_ms".to_string(),
            Value::from(started.elapsed().as_millis() as u64),
        );

        let result = aggregator.finish(metadata);
        tracing::info!(
            "analysis complete: {} symbol(s), {} error(s)",
            result.symbols.len(),
            result.error_count
        );
        Ok(result)
    }
}

/// Read, parse and extract a single file.
pub fn analyze_file(
    registry: &ParserRegistry,
    path: &Path,
    deep: bool,
) -> Result<FileAnalysis, FileFailure> {
    let bytes = fs::read(path).map_err(|source| FileFailure::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| FileFailure::Decode {
        path: path.to_path_buf(),
    })?;
    // a byte order mark is not source text and would shift first-line columns
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let adapter = registry.for_path(path).ok_or_else(|| FileFailure::NoAdapter {
        path: path.to_path_buf(),
    })?;
    let tree = adapter.parse(text).map_err(|source| FileFailure::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let extraction = extract(&tree, path, deep);
    Ok(FileAnalysis {
        path: PathBuf::from(path),
        language: tree.language.to_string(),
        symbols: extraction.symbols,
        dependencies: extraction.dependencies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditSink;
    use crate::error::PathError;
    use crate::parser::tests::{BrokenAdapter, MockAdapter};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn mock_analyzer(config: Configuration) -> Analyzer {
        Analyzer::with_registry(config, ParserRegistry::new(vec![Arc::new(MockAdapter)]))
    }

    #[test]
    fn test_valid_and_invalid_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("good.mock"), "def alpha\ndef beta\n").unwrap();
        fs::write(temp.path().join("bad.mock"), "def gamma\n!\n").unwrap();

        let result = mock_analyzer(Configuration::default())
            .run(temp.path())
            .unwrap();

        assert_eq!(result.file_count, 2);
        assert_eq!(result.error_count, 1);
        assert!(result.warnings.iter().any(|w| w.contains("bad.mock")));
        let names: Vec<_> = result.symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert_eq!(result.metadata["languages"]["mock"], 1);
    }

    #[test]
    fn test_undecodable_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("latin1.mock"), [0x64u8, 0x65, 0x66, 0xff]).unwrap();

        let result = mock_analyzer(Configuration::default())
            .run(temp.path())
            .unwrap();
        assert_eq!(result.error_count, 1);
        assert!(result.warnings[0].starts_with("failed to read"));
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bom.mock"), "\u{feff}def alpha\n").unwrap();

        let result = mock_analyzer(Configuration::default())
            .run(temp.path())
            .unwrap();
        assert_eq!(result.error_count, 0);
        assert_eq!(result.symbols.len(), 1);
        assert_eq!(result.symbols[0].name, "alpha");
        assert_eq!(result.symbols[0].column, 0);
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let err = mock_analyzer(Configuration::default())
            .run(&temp.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Path(PathError::NotFound(_))));
    }

    #[test]
    fn test_engine_unavailable() {
        let temp = TempDir::new().unwrap();
        let analyzer = Analyzer::with_registry(
            Configuration::default(),
            ParserRegistry::new(vec![Arc::new(BrokenAdapter)]),
        );
        let err = analyzer.run(temp.path()).unwrap_err();
        assert!(matches!(err, AnalysisError::EngineUnavailable(_)));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let temp = TempDir::new().unwrap();
        for i in 0..20 {
            let body = if i % 7 == 3 {
                "!".to_string()
            } else {
                format!("def f{i}\ndef g{i}\n")
            };
            fs::write(temp.path().join(format!("file{i:02}.mock")), body).unwrap();
        }

        let sequential = mock_analyzer(Configuration::default())
            .run(temp.path())
            .unwrap();
        let parallel = mock_analyzer(Configuration::builder().parallel(true).build().unwrap())
            .run(temp.path())
            .unwrap();

        assert_eq!(sequential.symbols, parallel.symbols);
        assert_eq!(sequential.warnings, parallel.warnings);
        assert_eq!(sequential.error_count, parallel.error_count);
        assert_eq!(parallel.metadata["parallel"], true);
    }

    #[test]
    #[cfg(feature = "deep-mode")]
    fn test_deep_mode_audit_events() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.mock"), "def a\n").unwrap();
        fs::write(temp.path().join("b.mock"), "!\n").unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&events);
        let sink: Arc<dyn AuditSink> = Arc::new(move |event_type: &str, payload: &Value| {
            recorder
                .lock()
                .unwrap()
                .push((event_type.to_string(), payload.clone()));
        });

        let config = Configuration::builder()
            .deep_mode(true)
            .audit_sink(sink)
            .parallel(true)
            .build()
            .unwrap();
        let result = mock_analyzer(config).run(temp.path()).unwrap();
        assert_eq!(result.metadata["deep_mode"], true);

        let events = events.lock().unwrap();
        let types: Vec<_> = events.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "analysis_started",
                "deep_mode_accessed",
                "file_analyzed",
                "deep_mode_accessed",
                "file_failed",
                "analysis_completed",
            ]
        );
        assert_eq!(events[0].1["file_count"], 2);
        assert_eq!(events[5].1["error_count"], 1);
    }
}
