//! File scanner: breadth-first walk with glob-based pruning.
//!
//! Walks the configured roots, prunes anything matching an exclude
//! glob (directories are pruned whole, not just hidden from output),
//! and produces a flat file list with size/mtime metadata plus the
//! project-marker files encountered along the way.

use std::collections::VecDeque;
use std::path::Path;
use std::time::UNIX_EPOCH;

use globset::{Glob, GlobSet, GlobSetBuilder};

use super::MapError;

/// Marker filenames that indicate a project module boundary.
pub const PROJECT_MARKERS: [&str; 5] =
    ["Cargo.toml", "go.mod", "package.json", "pyproject.toml", "requirements.txt"];

/// Additional marker filenames consulted for test-framework detection.
pub const TEST_MARKERS: [&str; 1] = ["pytest.ini"];

/// One file collected by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Path relative to the repo root, `/`-separated.
    pub rel_path: String,
    /// File size in bytes.
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime_ms: i64,
}

/// A project- or test-marker file found during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerFile {
    /// Containing directory relative to the repo root (`.` for the root).
    pub dir: String,
    /// Marker filename.
    pub name: String,
    /// Full relative path of the marker file.
    pub rel_path: String,
}

/// Result of one scan.
#[derive(Debug, Default)]
pub struct ScanOutput {
    /// Flat, sorted file list (capped at `max_files`).
    pub files: Vec<ScannedFile>,
    /// Marker files, in walk order.
    pub markers: Vec<MarkerFile>,
}

/// Compiled exclude matcher.
#[derive(Debug)]
pub struct ExcludeSet {
    set: GlobSet,
}

impl ExcludeSet {
    /// Compiles exclude glob patterns into a matcher.
    ///
    /// `**` spans path segments, `*` matches within one segment, `?`
    /// matches one character. A leading `**/` is treated as optional,
    /// and a bare name (no `/`) matches at any depth, including the
    /// whole subtree beneath a matching directory.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Pattern`] when a glob fails to compile.
    pub fn compile(patterns: &[String]) -> Result<Self, MapError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let mut variants = vec![pattern.clone()];
            if !pattern.starts_with("**/") {
                variants.push(format!("**/{pattern}"));
            }
            if !pattern.contains('/') {
                variants.push(format!("{pattern}/**"));
                variants.push(format!("**/{pattern}/**"));
            }
            for variant in variants {
                let glob = Glob::new(&variant).map_err(|e| MapError::Pattern {
                    pattern: pattern.clone(),
                    detail: e.to_string(),
                })?;
                builder.add(glob);
            }
        }
        let set = builder
            .build()
            .map_err(|e| MapError::Pattern { pattern: String::new(), detail: e.to_string() })?;
        Ok(Self { set })
    }

    /// Returns `true` if a file path matches any exclude pattern.
    #[must_use]
    pub fn matches_file(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }

    /// Returns `true` if a directory path matches any exclude pattern.
    ///
    /// Directories are checked both bare and with a trailing `/`.
    #[must_use]
    pub fn matches_dir(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path) || self.set.is_match(format!("{rel_path}/"))
    }
}

/// Walks each root breadth-first, collecting files and marker files.
///
/// Roots that do not exist are skipped. Per-file stat failures skip the
/// file; a failed directory listing fails the scan.
///
/// # Errors
///
/// Returns [`MapError::Walk`] when a directory cannot be listed.
pub fn scan(
    repo_root: &Path,
    roots: &[String],
    excludes: &ExcludeSet,
    max_files: usize,
) -> Result<ScanOutput, MapError> {
    let mut output = ScanOutput::default();
    let marker_names: Vec<&str> =
        PROJECT_MARKERS.iter().chain(TEST_MARKERS.iter()).copied().collect();

    let mut queue: VecDeque<String> = VecDeque::new();
    for root in roots {
        let rel = normalize_root(root);
        let abs = if rel == "." { repo_root.to_path_buf() } else { repo_root.join(&rel) };
        if !abs.is_dir() {
            log::warn!("configured root does not exist, skipping: {rel}");
            continue;
        }
        if rel != "." && excludes.matches_dir(&rel) {
            continue;
        }
        queue.push_back(rel);
    }

    while let Some(dir_rel) = queue.pop_front() {
        let dir_abs =
            if dir_rel == "." { repo_root.to_path_buf() } else { repo_root.join(&dir_rel) };
        let entries = std::fs::read_dir(&dir_abs)
            .map_err(|e| MapError::Walk { path: dir_rel.clone(), detail: e.to_string() })?;

        let mut names: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| MapError::Walk { path: dir_rel.clone(), detail: e.to_string() })?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        for name in names {
            let rel = if dir_rel == "." { name.clone() } else { format!("{dir_rel}/{name}") };
            let abs = repo_root.join(&rel);
            if abs.is_dir() {
                if !excludes.matches_dir(&rel) {
                    queue.push_back(rel);
                }
                continue;
            }
            if excludes.matches_file(&rel) {
                continue;
            }
            if marker_names.contains(&name.as_str()) {
                output.markers.push(MarkerFile {
                    dir: dir_rel.clone(),
                    name: name.clone(),
                    rel_path: rel.clone(),
                });
            }
            if output.files.len() >= max_files {
                continue; // cap reached; keep walking for markers only
            }
            let Ok(metadata) = std::fs::metadata(&abs) else {
                continue; // stat failure reduces completeness, never fails the scan
            };
            let mtime_ms = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
                .unwrap_or(0);
            output.files.push(ScannedFile { rel_path: rel, size: metadata.len(), mtime_ms });
        }
    }

    output.files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(output)
}

fn normalize_root(root: &str) -> String {
    let trimmed = root.trim_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        ".".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn scan_all(root: &Path, excludes: &[&str]) -> ScanOutput {
        let patterns: Vec<String> = excludes.iter().map(ToString::to_string).collect();
        let set = ExcludeSet::compile(&patterns).unwrap();
        scan(root, &[".".to_string()], &set, 10_000).unwrap()
    }

    #[test]
    fn collects_files_sorted_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.txt", "bb");
        touch(dir.path(), "a.txt", "a");
        touch(dir.path(), "sub/c.txt", "ccc");

        let output = scan_all(dir.path(), &[]);
        let paths: Vec<&str> = output.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "b.txt", "sub/c.txt"]);
        assert_eq!(output.files[0].size, 1);
        assert!(output.files[0].mtime_ms > 0);
    }

    #[test]
    fn bare_name_exclude_prunes_directory_at_any_depth() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "node_modules/dep/index.js", "x");
        touch(dir.path(), "pkg/node_modules/dep/index.js", "x");
        touch(dir.path(), "src/main.js", "x");

        let output = scan_all(dir.path(), &["node_modules"]);
        let paths: Vec<&str> = output.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["src/main.js"]);
    }

    #[test]
    fn double_star_glob_spans_segments() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/deep/nested/skip.log", "x");
        touch(dir.path(), "keep.log", "x");
        touch(dir.path(), "a/keep.txt", "x");

        let output = scan_all(dir.path(), &["a/**/*.log"]);
        let paths: Vec<&str> = output.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["a/keep.txt", "keep.log"]);
    }

    #[test]
    fn question_mark_matches_one_character() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "v1.txt", "x");
        touch(dir.path(), "v12.txt", "x");

        let output = scan_all(dir.path(), &["v?.txt"]);
        let paths: Vec<&str> = output.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["v12.txt"]);
    }

    #[test]
    fn max_files_caps_collection_but_keeps_markers() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            touch(dir.path(), &format!("f{i:02}.txt"), "x");
        }
        touch(dir.path(), "zz/package.json", "{}");

        let set = ExcludeSet::compile(&[]).unwrap();
        let output = scan(dir.path(), &[".".to_string()], &set, 3).unwrap();
        assert_eq!(output.files.len(), 3);
        assert!(output.markers.iter().any(|m| m.name == "package.json"));
    }

    #[test]
    fn records_project_markers_with_containing_dir() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "package.json", "{}");
        touch(dir.path(), "svc/Cargo.toml", "[package]");

        let output = scan_all(dir.path(), &[]);
        let markers: Vec<(&str, &str)> =
            output.markers.iter().map(|m| (m.dir.as_str(), m.name.as_str())).collect();
        assert!(markers.contains(&(".", "package.json")));
        assert!(markers.contains(&("svc", "Cargo.toml")));
    }

    #[test]
    fn missing_root_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.txt", "x");
        let set = ExcludeSet::compile(&[]).unwrap();
        let output =
            scan(dir.path(), &["nope".to_string(), ".".to_string()], &set, 100).unwrap();
        assert_eq!(output.files.len(), 1);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let err = ExcludeSet::compile(&["a[".to_string()]).unwrap_err();
        assert_eq!(err.code(), "bad_exclude_pattern");
    }
}
