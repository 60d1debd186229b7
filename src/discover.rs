//! Source enumeration: turn an analysis root into an ordered list of files.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::Configuration;
use crate::error::PathError;
use crate::parser::{extension_of, ParserRegistry};

/// Files selected for analysis, plus non-fatal traversal problems.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Enumeration {
    pub files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Enumerate candidate source files under `root`.
///
/// The order is stable across runs: directory entries are visited sorted by
/// file name. A root that does not exist, or is neither a regular file nor a
/// directory, is an error; everything else that goes wrong during traversal
/// becomes a warning.
pub fn enumerate(
    root: &Path,
    config: &Configuration,
    registry: &ParserRegistry,
) -> Result<Enumeration, PathError> {
    let metadata = fs::metadata(root).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            PathError::NotFound(root.to_path_buf())
        } else {
            PathError::Io {
                path: root.to_path_buf(),
                source,
            }
        }
    })?;

    if metadata.is_file() {
        let mut out = Enumeration::default();
        if is_candidate(root, config, registry) && within_size(root, metadata.len(), config) {
            out.files.push(root.to_path_buf());
        }
        return Ok(out);
    }
    if !metadata.is_dir() {
        return Err(PathError::UnsupportedType(root.to_path_buf()));
    }

    Ok(walk_directory(root, config, registry))
}

fn walk_directory(root: &Path, config: &Configuration, registry: &ParserRegistry) -> Enumeration {
    let mut out = Enumeration::default();

    let mut walker = WalkDir::new(root)
        .follow_links(config.follow_symlinks())
        .sort_by_file_name();
    if let Some(depth) = config.max_depth() {
        walker = walker.max_depth(depth);
    }

    let entries = walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_pruned_dir(root, e, config));

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("traversal error: {}", e);
                out.warnings.push(format!("traversal error: {}", e));
                continue;
            }
        };

        let path = entry.path();
        let Some(size) = regular_file_size(&entry) else {
            continue;
        };

        let relative = path.strip_prefix(root).unwrap_or(path);
        if config.is_excluded(relative) || !config.is_included(relative) {
            tracing::trace!("excluded by pattern: {}", path.display());
            continue;
        }
        if !is_candidate(path, config, registry) {
            continue;
        }
        if !within_size(path, size, config) {
            continue;
        }

        out.files.push(path.to_path_buf());
    }

    out
}

/// Directories whose root-relative path matches an exclude pattern.
fn is_pruned_dir(root: &Path, entry: &DirEntry, config: &Configuration) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
    config.is_excluded(relative)
}

/// Size of a regular file entry, following a symlink to a regular file.
fn regular_file_size(entry: &DirEntry) -> Option<u64> {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return entry.metadata().ok().map(|m| m.len());
    }
    if file_type.is_symlink() {
        // walkdir does not resolve links when not following them
        return fs::metadata(entry.path())
            .ok()
            .filter(|m| m.is_file())
            .map(|m| m.len());
    }
    None
}

fn is_candidate(path: &Path, config: &Configuration, registry: &ParserRegistry) -> bool {
    match extension_of(path) {
        Some(ext) => registry.for_extension(&ext).is_some() && config.accepts_extension(&ext),
        None => false,
    }
}

fn within_size(path: &Path, size: u64, config: &Configuration) -> bool {
    if size > config.max_file_size() {
        tracing::debug!(
            "skipping {} ({} bytes exceeds max_file_size {})",
            path.display(),
            size,
            config.max_file_size()
        );
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tests::MockAdapter;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn registry() -> ParserRegistry {
        ParserRegistry::new(vec![Arc::new(MockAdapter)])
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn names(root: &Path, e: &Enumeration) -> Vec<String> {
        e.files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let err = enumerate(
            &temp.path().join("nope"),
            &Configuration::default(),
            &registry(),
        )
        .unwrap_err();
        assert!(matches!(err, PathError::NotFound(_)));
    }

    #[test]
    #[cfg(unix)]
    fn test_socket_root_is_unsupported() {
        let temp = TempDir::new().unwrap();
        let socket = temp.path().join("engine.sock");
        let _listener = std::os::unix::net::UnixListener::bind(&socket).unwrap();

        let err = enumerate(&socket, &Configuration::default(), &registry()).unwrap_err();
        match err {
            PathError::UnsupportedType(path) => assert_eq!(path, socket),
            other => panic!("expected UnsupportedType, got {other:?}"),
        }
    }

    #[test]
    fn test_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.mock", "def b");
        write(temp.path(), "a.mock", "def a");
        write(temp.path(), "notes.txt", "hello");
        write(temp.path(), "sub/c.mock", "def c");
        write(temp.path(), "node_modules/dep/d.mock", "def d");

        let e = enumerate(temp.path(), &Configuration::default(), &registry()).unwrap();
        assert_eq!(names(temp.path(), &e), vec!["a.mock", "b.mock", "sub/c.mock"]);
        assert!(e.warnings.is_empty());
    }

    #[test]
    fn test_max_depth() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "top.mock", "");
        write(temp.path(), "sub/nested.mock", "");

        let config = Configuration::builder().max_depth(Some(1)).build().unwrap();
        let e = enumerate(temp.path(), &config, &registry()).unwrap();
        assert_eq!(names(temp.path(), &e), vec!["top.mock"]);
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/keep.mock", "");
        write(temp.path(), "src/gen/skip.mock", "");
        write(temp.path(), "other/out.mock", "");

        let config = Configuration::builder()
            .include_patterns(["src/**"])
            .exclude("src/gen/**")
            .build()
            .unwrap();
        let e = enumerate(temp.path(), &config, &registry()).unwrap();
        assert_eq!(names(temp.path(), &e), vec!["src/keep.mock"]);
    }

    #[test]
    fn test_max_file_size_skips() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "small.mock", "def a");
        write(temp.path(), "large.mock", &"x".repeat(64));

        let config = Configuration::builder().max_file_size(32).build().unwrap();
        let e = enumerate(temp.path(), &config, &registry()).unwrap();
        assert_eq!(names(temp.path(), &e), vec!["small.mock"]);
    }

    #[test]
    fn test_single_file_root() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "one.mock", "def one");
        write(temp.path(), "two.txt", "");

        let file = temp.path().join("one.mock");
        let e = enumerate(&file, &Configuration::default(), &registry()).unwrap();
        assert_eq!(e.files, vec![file]);

        let e = enumerate(
            &temp.path().join("two.txt"),
            &Configuration::default(),
            &registry(),
        )
        .unwrap();
        assert!(e.files.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn test_symlink_policy() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        write(outside.path(), "linked.mock", "def linked");
        write(temp.path(), "real.mock", "def real");
        std::os::unix::fs::symlink(outside.path(), temp.path().join("linkdir")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("linked.mock"),
            temp.path().join("alias.mock"),
        )
        .unwrap();

        let e = enumerate(temp.path(), &Configuration::default(), &registry()).unwrap();
        assert_eq!(names(temp.path(), &e), vec!["alias.mock", "real.mock"]);

        let config = Configuration::builder().follow_symlinks(true).build().unwrap();
        let e = enumerate(temp.path(), &config, &registry()).unwrap();
        assert_eq!(
            names(temp.path(), &e),
            vec!["alias.mock", "linkdir/linked.mock", "real.mock"]
        );
    }
}
