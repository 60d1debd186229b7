//! Analysis configuration.
//!
//! A `Configuration` is validated once, when it is built, and is immutable
//! afterwards. It can be assembled in code through `ConfigurationBuilder` or
//! loaded from a YAML file through `ConfigFile`.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::audit::AuditSink;
use crate::error::ConfigError;
use crate::parser::language_for_extension;

/// Default maximum file size: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Build, dependency and VCS directories skipped by default.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "**/node_modules/**",
    "**/.git/**",
    "**/__pycache__/**",
    "**/target/**",
    "**/.venv/**",
    "**/venv/**",
    "**/.pytest_cache/**",
    "**/*.min.js",
];

/// Config file names searched for in the working directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["symscan.yaml", ".symscan.yaml"];

/// Validated, immutable analysis options.
#[derive(Clone)]
pub struct Configuration {
    deep_mode_enabled: bool,
    max_file_size: u64,
    exclude_patterns: Vec<String>,
    include_patterns: Option<Vec<String>>,
    max_depth: Option<usize>,
    follow_symlinks: bool,
    audit_sink: Option<Arc<dyn AuditSink>>,
    language_filters: Option<BTreeSet<String>>,
    parallel: bool,
    excludes: GlobSet,
    includes: Option<GlobSet>,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    pub fn deep_mode_enabled(&self) -> bool {
        self.deep_mode_enabled
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }

    pub fn include_patterns(&self) -> Option<&[String]> {
        self.include_patterns.as_deref()
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn follow_symlinks(&self) -> bool {
        self.follow_symlinks
    }

    pub fn audit_sink(&self) -> Option<&dyn AuditSink> {
        self.audit_sink.as_deref()
    }

    pub fn language_filters(&self) -> Option<&BTreeSet<String>> {
        self.language_filters.as_ref()
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Check if a root-relative path matches an exclude pattern.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.excludes.is_match(relative)
    }

    /// Check if a root-relative path passes the include patterns.
    /// Always true when no include patterns are configured.
    pub fn is_included(&self, relative: &Path) -> bool {
        self.includes
            .as_ref()
            .map_or(true, |set| set.is_match(relative))
    }

    /// Check if an extension (without dot) passes the language filters.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.language_filters
            .as_ref()
            .map_or(true, |filters| filters.contains(ext))
    }

    /// Audit sink, present only while deep mode is active.
    pub(crate) fn active_audit_sink(&self) -> Option<&dyn AuditSink> {
        if self.deep_mode_enabled {
            self.audit_sink()
        } else {
            None
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            deep_mode_enabled: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            exclude_patterns: default_excludes(),
            include_patterns: None,
            max_depth: None,
            follow_symlinks: false,
            audit_sink: None,
            language_filters: None,
            parallel: false,
            excludes: DEFAULT_EXCLUDES.clone(),
            includes: None,
        }
    }
}

static DEFAULT_EXCLUDES: once_cell::sync::Lazy<GlobSet> = once_cell::sync::Lazy::new(|| {
    compile_patterns(&default_excludes()).unwrap_or_else(|_| GlobSet::empty())
});

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("deep_mode_enabled", &self.deep_mode_enabled)
            .field("max_file_size", &self.max_file_size)
            .field("exclude_patterns", &self.exclude_patterns)
            .field("include_patterns", &self.include_patterns)
            .field("max_depth", &self.max_depth)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("audit_sink", &self.audit_sink.as_ref().map(|_| "<sink>"))
            .field("language_filters", &self.language_filters)
            .field("parallel", &self.parallel)
            .finish()
    }
}

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDE_PATTERNS
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn compile_patterns(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::InvalidPattern {
        pattern: patterns.join(", "),
        source,
    })
}

/// Normalize a language filter entry: `.PY` and `py` both become `py`.
fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Builder for `Configuration`; every field is independently settable.
#[derive(Clone)]
pub struct ConfigurationBuilder {
    deep_mode_enabled: bool,
    max_file_size: u64,
    exclude_patterns: Vec<String>,
    include_patterns: Option<Vec<String>>,
    max_depth: Option<usize>,
    follow_symlinks: bool,
    audit_sink: Option<Arc<dyn AuditSink>>,
    language_filters: Option<Vec<String>>,
    parallel: bool,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self {
            deep_mode_enabled: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            exclude_patterns: default_excludes(),
            include_patterns: None,
            max_depth: None,
            follow_symlinks: false,
            audit_sink: None,
            language_filters: None,
            parallel: false,
        }
    }
}

impl ConfigurationBuilder {
    pub fn deep_mode(mut self, enabled: bool) -> Self {
        self.deep_mode_enabled = enabled;
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Replace the exclude patterns (including the defaults).
    pub fn exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Append one exclude pattern to the current list.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    pub fn include_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    pub fn language_filters<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.language_filters = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<Configuration, ConfigError> {
        if self.max_file_size == 0 {
            return Err(ConfigError::NonPositiveFileSize);
        }
        if self.max_depth == Some(0) {
            return Err(ConfigError::NonPositiveDepth);
        }
        if self.deep_mode_enabled {
            if !cfg!(feature = "deep-mode") {
                return Err(ConfigError::DeepModeUnavailable);
            }
            if self.audit_sink.is_none() {
                return Err(ConfigError::DeepModeWithoutAudit);
            }
        }

        let language_filters = match self.language_filters {
            Some(raw) => {
                let mut filters = BTreeSet::new();
                for entry in raw {
                    let ext = normalize_extension(&entry);
                    if language_for_extension(&ext).is_none() {
                        return Err(ConfigError::UnknownLanguage(entry));
                    }
                    filters.insert(ext);
                }
                Some(filters)
            }
            None => None,
        };

        let excludes = compile_patterns(&self.exclude_patterns)?;
        let includes = self
            .include_patterns
            .as_deref()
            .map(compile_patterns)
            .transpose()?;

        Ok(Configuration {
            deep_mode_enabled: self.deep_mode_enabled,
            max_file_size: self.max_file_size,
            exclude_patterns: self.exclude_patterns,
            include_patterns: self.include_patterns,
            max_depth: self.max_depth,
            follow_symlinks: self.follow_symlinks,
            audit_sink: self.audit_sink,
            language_filters,
            parallel: self.parallel,
            excludes,
            includes,
        })
    }
}

/// On-disk configuration. Every field is optional; missing fields keep
/// their defaults. The audit sink cannot be expressed in a file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub deep_mode: Option<bool>,
    #[serde(default)]
    pub max_file_size: Option<u64>,
    #[serde(default)]
    pub exclude_patterns: Option<Vec<String>>,
    /// Patterns appended to the exclude list instead of replacing it
    #[serde(default)]
    pub extra_exclude_patterns: Vec<String>,
    #[serde(default)]
    pub include_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub follow_symlinks: Option<bool>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub parallel: Option<bool>,
}

impl ConfigFile {
    /// Parse a config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Syntax {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Look for a default-named config file in `dir`.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Option<std::path::PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.as_ref().join(name))
            .find(|p| p.is_file())
    }

    /// Apply this file's values on top of a builder.
    pub fn apply(self, mut builder: ConfigurationBuilder) -> ConfigurationBuilder {
        if let Some(deep) = self.deep_mode {
            builder = builder.deep_mode(deep);
        }
        if let Some(size) = self.max_file_size {
            builder = builder.max_file_size(size);
        }
        if let Some(patterns) = self.exclude_patterns {
            builder = builder.exclude_patterns(patterns);
        }
        for pattern in self.extra_exclude_patterns {
            builder = builder.exclude(pattern);
        }
        if let Some(patterns) = self.include_patterns {
            builder = builder.include_patterns(patterns);
        }
        if self.max_depth.is_some() {
            builder = builder.max_depth(self.max_depth);
        }
        if let Some(follow) = self.follow_symlinks {
            builder = builder.follow_symlinks(follow);
        }
        if let Some(languages) = self.languages {
            builder = builder.language_filters(languages);
        }
        if let Some(parallel) = self.parallel {
            builder = builder.parallel(parallel);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn noop_sink() -> Arc<dyn AuditSink> {
        Arc::new(|_: &str, _: &Value| {})
    }

    #[test]
    fn test_defaults() {
        let config = Configuration::builder().build().unwrap();
        assert!(!config.deep_mode_enabled());
        assert_eq!(config.max_file_size(), DEFAULT_MAX_FILE_SIZE);
        assert_eq!(config.exclude_patterns().len(), DEFAULT_EXCLUDE_PATTERNS.len());
        assert!(config.include_patterns().is_none());
        assert!(config.max_depth().is_none());
        assert!(!config.follow_symlinks());
        assert!(config.language_filters().is_none());
    }

    #[test]
    fn test_default_matches_built_default() {
        let config = Configuration::default();
        assert!(config.is_excluded(Path::new("node_modules/pkg/index.js")));
        assert!(config.is_excluded(Path::new("src/.git/config")));
        assert!(config.is_excluded(Path::new("dist/app.min.js")));
        assert!(!config.is_excluded(Path::new("src/app.js")));
        assert!(config.is_included(Path::new("anything.py")));
    }

    #[test]
    fn test_deep_mode_requires_audit_sink() {
        let err = Configuration::builder().deep_mode(true).build().unwrap_err();
        #[cfg(feature = "deep-mode")]
        assert!(matches!(err, ConfigError::DeepModeWithoutAudit));
        #[cfg(not(feature = "deep-mode"))]
        assert!(matches!(err, ConfigError::DeepModeUnavailable));
    }

    #[test]
    #[cfg(feature = "deep-mode")]
    fn test_deep_mode_with_sink() {
        let config = Configuration::builder()
            .deep_mode(true)
            .audit_sink(noop_sink())
            .build()
            .unwrap();
        assert!(config.deep_mode_enabled());
        assert!(config.active_audit_sink().is_some());
    }

    #[test]
    fn test_sink_inactive_without_deep_mode() {
        let config = Configuration::builder()
            .audit_sink(noop_sink())
            .build()
            .unwrap();
        assert!(config.audit_sink().is_some());
        assert!(config.active_audit_sink().is_none());
    }

    #[test]
    fn test_rejects_non_positive_limits() {
        assert!(matches!(
            Configuration::builder().max_file_size(0).build(),
            Err(ConfigError::NonPositiveFileSize)
        ));
        assert!(matches!(
            Configuration::builder().max_depth(Some(0)).build(),
            Err(ConfigError::NonPositiveDepth)
        ));
        assert!(Configuration::builder().max_depth(Some(1)).build().is_ok());
    }

    #[test]
    fn test_rejects_invalid_glob() {
        let err = Configuration::builder()
            .include_patterns(["src/[unclosed"])
            .build()
            .unwrap_err();
        match err {
            ConfigError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "src/[unclosed"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_language_filters_normalized() {
        let config = Configuration::builder()
            .language_filters([".PY", "ts"])
            .build()
            .unwrap();
        assert!(config.accepts_extension("py"));
        assert!(config.accepts_extension("ts"));
        assert!(!config.accepts_extension("js"));

        assert!(matches!(
            Configuration::builder().language_filters(["txt"]).build(),
            Err(ConfigError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_include_patterns() {
        let config = Configuration::builder()
            .include_patterns(["src/**"])
            .build()
            .unwrap();
        assert!(config.is_included(Path::new("src/lib.py")));
        assert!(!config.is_included(Path::new("scripts/run.py")));
    }

    #[test]
    fn test_config_file_apply() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("symscan.yaml");
        fs::write(
            &path,
            r#"
max_file_size: 2048
extra_exclude_patterns:
  - "**/generated/**"
include_patterns:
  - "src/**"
max_depth: 3
follow_symlinks: true
languages: [py]
parallel: true
"#,
        )
        .unwrap();

        assert_eq!(ConfigFile::discover(temp.path()), Some(path.clone()));

        let file = ConfigFile::load(&path).unwrap();
        let config = file.apply(Configuration::builder()).build().unwrap();

        assert_eq!(config.max_file_size(), 2048);
        assert_eq!(config.max_depth(), Some(3));
        assert!(config.follow_symlinks());
        assert!(config.parallel());
        assert!(config.is_excluded(Path::new("src/generated/a.py")));
        assert!(config.is_excluded(Path::new("node_modules/x.js")));
        assert!(config.accepts_extension("py"));
        assert!(!config.accepts_extension("ts"));
    }

    #[test]
    fn test_config_file_unknown_field() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("symscan.yaml");
        fs::write(&path, "max_size: 12\n").unwrap();
        assert!(matches!(ConfigFile::load(&path), Err(ConfigError::Syntax { .. })));
    }
}
