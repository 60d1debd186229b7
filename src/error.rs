//! Error taxonomy.
//!
//! Construction-time and fatal errors are returned as `Err` from the public
//! entry points. Per-file failures (`FileFailure`) never escape an analysis
//! run; they are folded into the result as warnings.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid configuration, reported when the `Configuration` is built.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("max_file_size must be positive")]
    NonPositiveFileSize,
    #[error("max_depth must be positive or unset")]
    NonPositiveDepth,
    #[error(
        "deep mode requires an audit sink for compliance tracking; \
         set one with `ConfigurationBuilder::audit_sink`"
    )]
    DeepModeWithoutAudit,
    #[error("deep mode is not available in this build (enable the `deep-mode` feature)")]
    DeepModeUnavailable,
    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("unsupported language filter {0:?}")]
    UnknownLanguage(String),
    #[error("reading config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config file {path}: {source}")]
    Syntax {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// The analysis root cannot be used.
#[derive(Error, Debug)]
pub enum PathError {
    #[error("path does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("path is neither a regular file nor a directory: {}", .0.display())]
    UnsupportedType(PathBuf),
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Malformed source reported by a parser adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },
    #[error("syntax tree is nested deeper than {limit} levels")]
    TooDeep { limit: usize },
    #[error("parser produced no tree")]
    NoTree,
}

/// Why a single file contributed no symbols.
#[derive(Error, Debug)]
pub enum FileFailure {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {}: file is not valid UTF-8", .path.display())]
    Decode { path: PathBuf },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("failed to parse {}: no parser registered for this file type", .path.display())]
    NoAdapter { path: PathBuf },
}

/// Rejected client version string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("client version must be a string, got {0}")]
    NotAString(&'static str),
    #[error("client version {0:?} has leading or trailing whitespace")]
    Whitespace(String),
    #[error("client version {0:?} is not of the form MAJOR.MINOR.PATCH")]
    Malformed(String),
}

/// The parsing engine could not be loaded.
#[derive(Error, Debug, Clone)]
#[error("parser engine unavailable for {language}: {reason}")]
pub struct EngineError {
    pub language: String,
    pub reason: String,
}

/// Fatal errors of an `analyze` call.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    EngineUnavailable(#[from] EngineError),
}
