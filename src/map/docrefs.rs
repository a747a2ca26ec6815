//! Documentation cross-reference indexing.
//!
//! Scans a fixed set of top-level navigation documents for
//! backtick-quoted, relative, extension-bearing path-like tokens and
//! builds a reverse index from code path to documentation path.

use std::path::Path;

use super::DocRef;
use crate::context::ServiceContext;

/// Navigation documents scanned once per build. Missing files are
/// skipped, not fatal.
pub const NAV_DOCS: [&str; 6] = [
    "README.md",
    "ARCHITECTURE.md",
    "AGENTS.md",
    "CONTRIBUTING.md",
    "docs/README.md",
    "docs/ARCHITECTURE.md",
];

/// Longest token accepted as a path reference.
const MAX_TOKEN_LEN: usize = 120;

/// Reverse index from referenced code paths to documentation paths.
#[derive(Debug, Default)]
pub struct DocIndex {
    entries: Vec<DocRef>,
}

impl DocIndex {
    /// Builds the index by scanning the navigation documents under
    /// `repo_root`.
    #[must_use]
    pub fn build(ctx: &ServiceContext, repo_root: &Path) -> Self {
        let mut entries: Vec<DocRef> = Vec::new();
        for doc in NAV_DOCS {
            let Ok(text) = ctx.fs.read_to_string(&repo_root.join(doc)) else {
                continue;
            };
            for token in backtick_tokens(&text) {
                if is_path_token(token) {
                    entries.push(DocRef {
                        code_path: token.to_string(),
                        doc_path: doc.to_string(),
                        reason: "backtick-reference".to_string(),
                    });
                }
            }
        }
        entries.sort();
        entries.dedup();
        Self { entries }
    }

    /// All deduplicated cross-reference records, sorted by
    /// `(code_path, doc_path)`.
    #[must_use]
    pub fn entries(&self) -> &[DocRef] {
        &self.entries
    }

    /// Documentation paths referencing any token inside the `dir`
    /// subtree (`.` covers the whole repository). Used for modules,
    /// whose identity is a directory rather than a file.
    #[must_use]
    pub fn refs_under(&self, dir: &str) -> Vec<String> {
        let mut docs: Vec<String> = self
            .entries
            .iter()
            .filter(|e| {
                dir == "."
                    || e.code_path == dir
                    || e.code_path.starts_with(&format!("{dir}/"))
            })
            .map(|e| e.doc_path.clone())
            .collect();
        docs.sort();
        docs.dedup();
        docs
    }

    /// Documentation paths whose referenced token covers `code_path`
    /// (exact match or prefix directory).
    #[must_use]
    pub fn refs_for(&self, code_path: &str) -> Vec<String> {
        let mut docs: Vec<String> = self
            .entries
            .iter()
            .filter(|e| {
                code_path == e.code_path
                    || code_path.starts_with(&format!("{}/", e.code_path))
            })
            .map(|e| e.doc_path.clone())
            .collect();
        docs.sort();
        docs.dedup();
        docs
    }
}

/// Yields the contents of every `` `...` `` span in `text`.
fn backtick_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split('`').skip(1).step_by(2)
}

/// Accepts relative, extension-bearing path-like tokens; rejects
/// absolute paths, parent traversal, URLs, whitespace, and overlong
/// tokens.
fn is_path_token(token: &str) -> bool {
    if token.is_empty() || token.len() > MAX_TOKEN_LEN {
        return false;
    }
    if token.starts_with('/') || token.starts_with("..") || token.contains("/..") {
        return false;
    }
    if token.contains("://") || token.chars().any(char::is_whitespace) {
        return false;
    }
    // Must carry an extension in its final segment.
    let last = token.rsplit('/').next().unwrap_or(token);
    match last.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    }
}
