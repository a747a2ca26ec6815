//! Binding-reference loading, selection, and integrity verification.
//!
//! The refs index pins repository documents by content hash; a render
//! refuses to proceed unless every selected ref's bytes still match its
//! pin. Verification is all-or-nothing, never partial acceptance.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{RenderError, REFS_SCHEMA_VERSION};
use crate::context::ServiceContext;
use crate::hash;

/// Location of the refs index, relative to the repo root.
pub const REFS_INDEX_PATH: &str = "context/refs_index.json";

/// Cap on violations reported from one verification pass.
pub const MAX_VIOLATIONS: usize = 50;

/// One hash-pinned document reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BindingRef {
    /// Stable reference id.
    pub id: String,
    /// Document path, relative to the repo root.
    pub path: String,
    /// Pinned SHA-256 of the document bytes, lowercase hex.
    pub hash: String,
    /// Version pin; must be present and non-empty for a ref to validate.
    #[serde(default)]
    pub version: Option<String>,
    /// Roles/modes the ref applies to; `*` matches everything.
    #[serde(default)]
    pub scope: Vec<String>,
    /// Include regardless of scope.
    #[serde(default)]
    pub always_include: bool,
}

/// The schema-tagged refs index document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefsIndex {
    /// Document schema version.
    pub schema_version: String,
    /// All declared refs.
    pub refs: Vec<BindingRef>,
}

/// What went wrong when verifying one ref.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Version pin missing or empty.
    MissingVersion,
    /// The referenced file could not be read.
    Unreadable,
    /// Current bytes hash differently than the pin.
    HashMismatch,
    /// The path is absolute or escapes the repo root.
    InvalidPath,
}

/// One verification violation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RefViolation {
    /// Id of the offending ref.
    pub ref_id: String,
    /// Its declared path.
    pub path: String,
    /// Violation category.
    pub kind: ViolationKind,
    /// Pinned hash, when relevant.
    pub expected: Option<String>,
    /// Recomputed hash, when relevant.
    pub actual: Option<String>,
}

/// Loads and schema-checks the refs index.
///
/// # Errors
///
/// Returns [`RenderError::RefsInvalid`] when the document is missing,
/// malformed, or carries an unexpected schema version.
pub fn load(ctx: &ServiceContext, repo_root: &Path) -> Result<RefsIndex, RenderError> {
    let path = repo_root.join(REFS_INDEX_PATH);
    let text = ctx
        .fs
        .read_to_string(&path)
        .map_err(|e| RenderError::RefsInvalid { detail: e.to_string() })?;
    let index: RefsIndex = serde_json::from_str(&text)
        .map_err(|e| RenderError::RefsInvalid { detail: e.to_string() })?;
    if index.schema_version != REFS_SCHEMA_VERSION {
        return Err(RenderError::RefsInvalid {
            detail: format!(
                "unexpected schema_version `{}`, expected `{REFS_SCHEMA_VERSION}`",
                index.schema_version
            ),
        });
    }
    Ok(index)
}

/// Selects the refs applicable to a render: scoped to `*`, the role, or
/// the mode, or flagged `always_include`.
#[must_use]
pub fn select(index: &RefsIndex, role: &str, mode: &str) -> Vec<BindingRef> {
    index
        .refs
        .iter()
        .filter(|r| {
            r.always_include
                || r.scope.iter().any(|s| s == "*" || s == role || s == mode)
        })
        .cloned()
        .collect()
}

/// Verifies one ref against the current bytes on disk. Returns `None`
/// when the ref is intact.
#[must_use]
pub fn verify(ctx: &ServiceContext, repo_root: &Path, binding: &BindingRef) -> Option<RefViolation> {
    let violation = |kind, expected: Option<String>, actual: Option<String>| RefViolation {
        ref_id: binding.id.clone(),
        path: binding.path.clone(),
        kind,
        expected,
        actual,
    };

    if binding.path.starts_with('/')
        || binding.path.split('/').any(|segment| segment == "..")
    {
        return Some(violation(ViolationKind::InvalidPath, None, None));
    }
    if binding.version.as_deref().map_or(true, str::is_empty) {
        return Some(violation(ViolationKind::MissingVersion, None, None));
    }
    let Ok(bytes) = ctx.fs.read_bytes(&repo_root.join(&binding.path)) else {
        return Some(violation(ViolationKind::Unreadable, Some(binding.hash.clone()), None));
    };
    let actual = hash::hash_bytes(&bytes);
    if actual != binding.hash {
        return Some(violation(
            ViolationKind::HashMismatch,
            Some(binding.hash.clone()),
            Some(actual),
        ));
    }
    None
}

/// Verifies every selected ref, collecting violations up to
/// [`MAX_VIOLATIONS`].
///
/// # Errors
///
/// Returns [`RenderError::RefsIntegrity`] when any ref fails.
pub fn verify_all(
    ctx: &ServiceContext,
    repo_root: &Path,
    refs: &[BindingRef],
) -> Result<(), RenderError> {
    let mut violations = Vec::new();
    for binding in refs {
        if let Some(v) = verify(ctx, repo_root, binding) {
            violations.push(v);
            if violations.len() >= MAX_VIOLATIONS {
                break;
            }
        }
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(RenderError::RefsIntegrity { violations })
    }
}
