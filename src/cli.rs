//! Command-line interface for symscan.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use crate::analysis::Analyzer;
use crate::audit::JsonLinesAuditSink;
use crate::config::{ConfigFile, Configuration, DEFAULT_CONFIG_NAMES};
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Extract a symbol inventory from source trees.
///
/// Symscan parses Python, JavaScript, TypeScript and Rust sources and reports
/// functions, classes, methods and module-level variables together with
/// the import, inheritance and call relationships between them.
#[derive(Parser)]
#[command(name = "symscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a file or directory
    #[command(visible_alias = "scan")]
    Analyze(AnalyzeArgs),
    /// List the capabilities of this build
    Capabilities,
    /// Check whether a client version is compatible with this engine
    Compat(CompatArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Path to analyze (file or directory)
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Enable deep analysis (requires --audit-log)
    #[arg(long)]
    pub deep: bool,

    /// Append deep-mode audit events to this file as JSON lines
    #[arg(long)]
    pub audit_log: Option<PathBuf>,

    /// Additional exclude glob (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Only analyze paths matching this glob (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    pub include: Vec<String>,

    /// Maximum directory depth (files in the root are depth 1)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Skip files larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_file_size: Option<u64>,

    /// Descend into symlinked directories
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Only analyze files with this extension (repeatable)
    #[arg(long = "lang", value_name = "EXT")]
    pub lang: Vec<String>,

    /// Parse files on a thread pool
    #[arg(long)]
    pub parallel: bool,

    /// Exit non-zero when any file failed to parse
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the compat command.
#[derive(Parser)]
pub struct CompatArgs {
    /// Client version, e.g. 0.1.0
    pub version: String,
}

/// Discover a config file in the current directory.
fn discover_config() -> Option<PathBuf> {
    ConfigFile::discover(".")
}

/// Assemble the configuration: defaults, then config file, then flags.
fn build_config(args: &AnalyzeArgs) -> anyhow::Result<Configuration> {
    let mut builder = Configuration::builder();

    let config_path = match &args.config {
        Some(p) => Some(p.clone()),
        None => discover_config(),
    };
    if let Some(path) = config_path {
        tracing::debug!("loading config from {}", path.display());
        builder = ConfigFile::load(&path)?.apply(builder);
    }

    for pattern in &args.exclude {
        builder = builder.exclude(pattern.clone());
    }
    if !args.include.is_empty() {
        builder = builder.include_patterns(args.include.clone());
    }
    if args.max_depth.is_some() {
        builder = builder.max_depth(args.max_depth);
    }
    if let Some(size) = args.max_file_size {
        builder = builder.max_file_size(size);
    }
    if args.follow_symlinks {
        builder = builder.follow_symlinks(true);
    }
    if !args.lang.is_empty() {
        builder = builder.language_filters(args.lang.clone());
    }
    if args.parallel {
        builder = builder.parallel(true);
    }
    if args.deep {
        builder = builder.deep_mode(true);
    }
    if let Some(log) = &args.audit_log {
        let sink = JsonLinesAuditSink::open(log)
            .with_context(|| format!("opening audit log {}", log.display()))?;
        builder = builder.audit_sink(Arc::new(sink));
    }

    Ok(builder.build()?)
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let config = match build_config(args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: invalid configuration: {:#}", e);
            if args.config.is_none() {
                eprintln!("(config files searched: {})", DEFAULT_CONFIG_NAMES.join(", "));
            }
            return Ok(EXIT_ERROR);
        }
    };

    let result = match Analyzer::new(config).run(&args.path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if result.file_count == 0 {
        eprintln!("Warning: no files to analyze");
    }

    match args.format {
        OutputFormat::Json => report::write_json(&args.path, &result)?,
        OutputFormat::Pretty => report::write_pretty(&args.path, &result),
    }

    if args.strict && result.has_errors() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the capabilities command.
pub fn run_capabilities() -> anyhow::Result<i32> {
    for cap in crate::capabilities() {
        println!("{}", cap);
    }
    Ok(EXIT_SUCCESS)
}

/// Run the compat command.
pub fn run_compat(args: &CompatArgs) -> anyhow::Result<i32> {
    match crate::check_compatibility(&args.version) {
        Ok(true) => {
            println!("compatible");
            Ok(EXIT_SUCCESS)
        }
        Ok(false) => {
            println!(
                "incompatible: engine {} does not support client {}",
                crate::ENGINE_VERSION,
                args.version
            );
            Ok(EXIT_FAILED)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(EXIT_ERROR)
        }
    }
}
