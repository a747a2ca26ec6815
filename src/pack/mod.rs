//! Context pack renderer: hash-verified context bundles.
//!
//! A render assembles a fixed seven-slot pack from repository assets
//! (legal prefix, binding references, role capsule, task bundle) into a
//! fresh run directory, with a content hash over the whole pack. The
//! validator re-checks a rendered pack without repairing it.

pub mod bundle;
pub mod refs;
pub mod render;
pub mod role;
pub mod validate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hash;

/// Schema version tag written into every context pack.
pub const PACK_SCHEMA_VERSION: &str = "context_pack/1";
/// Expected schema version of the binding-refs index document.
pub const REFS_SCHEMA_VERSION: &str = "refs_index/1";
/// Expected schema version of role policy documents.
pub const ROLE_SCHEMA_VERSION: &str = "role_policy/1";

/// Slot kind tags, in fixed pack order.
pub const SLOT_KINDS: [&str; 7] = [
    "LEGAL_PREFIX",
    "BINDING_REFS",
    "ROLE_CAPSULE",
    "TASK_BUNDLE",
    "STATE",
    "TOOLS",
    "OPTIONAL_CONTEXT",
];

/// Indexes of the slots that must be present and populated.
pub const REQUIRED_SLOTS: [usize; 3] = [0, 1, 3];

/// One slot of a context pack. Reserved slots carry `body: null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    /// Position in the pack, 0-based.
    pub index: usize,
    /// Kind tag from [`SLOT_KINDS`].
    pub kind: String,
    /// Slot payload; `None` for reserved slots.
    pub body: Option<serde_json::Value>,
}

/// A rendered context pack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextPack {
    /// Pack schema version.
    pub schema_version: String,
    /// Stable id, `cp-<run_id>`.
    pub context_pack_id: String,
    /// Render run id.
    pub run_id: String,
    /// Render timestamp.
    pub created_at: DateTime<Utc>,
    /// Requested context mode.
    pub mode: String,
    /// Token budget the consumer should honor.
    pub budget_tokens: u64,
    /// The seven slots, in order.
    pub slots: Vec<Slot>,
    /// Content hash over the pack minus this field.
    pub hash: String,
}

/// Content hash over a pack value with its `hash` field removed.
///
/// `run_id` and `created_at` stay inside the hash: a pack is addressed
/// by the exact render, not by its inputs.
///
/// # Errors
///
/// Returns an error if canonical serialization fails.
pub fn pack_hash(pack: &serde_json::Value) -> Result<String, serde_json::Error> {
    let mut value = pack.clone();
    if let Some(obj) = value.as_object_mut() {
        obj.remove("hash");
    }
    hash::content_hash(&value)
}

/// Errors from the render pipeline. Each maps to a stable failure code
/// surfaced by the routing layer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// `context/legal_prefix.txt` is missing or unreadable.
    #[error("legal prefix missing or unreadable: {detail}")]
    LegalPrefix {
        /// Underlying error.
        detail: String,
    },
    /// The refs index document is missing, malformed, or carries the
    /// wrong schema version.
    #[error("refs index invalid: {detail}")]
    RefsInvalid {
        /// What was wrong with the document.
        detail: String,
    },
    /// One or more selected refs failed integrity verification.
    #[error("{} binding ref(s) failed verification", violations.len())]
    RefsIntegrity {
        /// Violations, capped at [`refs::MAX_VIOLATIONS`].
        violations: Vec<refs::RefViolation>,
    },
    /// The role policy is missing, malformed, or does not declare the
    /// requested role.
    #[error("role policy invalid for `{role}`: {detail}")]
    RolePolicy {
        /// Requested role.
        role: String,
        /// What was wrong with the policy.
        detail: String,
    },
    /// No board task with the requested id.
    #[error("task not found: {task_id}")]
    TaskNotFound {
        /// Requested task id.
        task_id: String,
    },
    /// Required task artifacts are missing.
    #[error("task bundle incomplete, missing: {}", missing.join(", "))]
    TaskBundleIncomplete {
        /// Which required artifacts were missing.
        missing: Vec<String>,
        /// Whatever was loadable, for diagnostics.
        partial: bundle::TaskBundle,
    },
    /// The run directory already exists; a run id is never reused.
    #[error("run directory already exists: {path}")]
    RunDirExists {
        /// Colliding path.
        path: String,
    },
    /// A read or write failed.
    #[error("io failure at {path}: {detail}")]
    Io {
        /// Path involved.
        path: String,
        /// Underlying error.
        detail: String,
    },
    /// Serialization failed.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl RenderError {
    /// Machine-readable failure code for the routing layer.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::LegalPrefix { .. } => "legal_prefix_missing_or_unreadable",
            Self::RefsInvalid { .. } => "refs_invalid",
            Self::RefsIntegrity { .. } => "refs_integrity_failed",
            Self::RolePolicy { .. } => "role_policy_invalid",
            Self::TaskNotFound { .. } => "task_not_found",
            Self::TaskBundleIncomplete { .. } => "task_bundle_incomplete",
            Self::RunDirExists { .. } => "run_dir_exists",
            Self::Io { .. } => "io_failed",
            Self::Serialize(_) => "serialize_failed",
        }
    }
}

/// Validator failure codes, checked in order; validation stops at the
/// first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    /// Not an object, or wrong `schema_version`.
    SchemaMismatch,
    /// A mandatory slot is absent or carries the wrong kind tag.
    MissingRequiredSlot,
    /// Recomputed pack hash differs from the declared one.
    PackHashMismatch,
    /// Slot 1 payload is malformed.
    RefsInvalid,
    /// A binding ref carries no version pin.
    RefMissingVersion,
    /// A binding ref's file bytes no longer match its pinned hash.
    RefHashMismatch,
}

impl ValidationCode {
    /// Stable uppercase code string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SchemaMismatch => "SCHEMA_MISMATCH",
            Self::MissingRequiredSlot => "MISSING_REQUIRED_SLOT",
            Self::PackHashMismatch => "PACK_HASH_MISMATCH",
            Self::RefsInvalid => "REFS_INVALID",
            Self::RefMissingVersion => "REF_MISSING_VERSION",
            Self::RefHashMismatch => "REF_HASH_MISMATCH",
        }
    }
}

/// One validator failure: the first check that did not pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackFailure {
    /// Which check failed.
    pub code: ValidationCode,
    /// Human-readable detail (slot name, ref path, hash pair).
    pub detail: String,
}

impl std::fmt::Display for PackFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.detail)
    }
}

impl std::error::Error for PackFailure {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pack_hash_ignores_only_the_hash_field() {
        let a = json!({"schema_version": "context_pack/1", "run_id": "r1", "hash": "aaa"});
        let b = json!({"schema_version": "context_pack/1", "run_id": "r1", "hash": "bbb"});
        let c = json!({"schema_version": "context_pack/1", "run_id": "r2", "hash": "aaa"});
        assert_eq!(pack_hash(&a).unwrap(), pack_hash(&b).unwrap());
        assert_ne!(pack_hash(&a).unwrap(), pack_hash(&c).unwrap());
    }

    #[test]
    fn slot_kind_table_is_fixed() {
        assert_eq!(SLOT_KINDS[0], "LEGAL_PREFIX");
        assert_eq!(SLOT_KINDS[1], "BINDING_REFS");
        assert_eq!(SLOT_KINDS[3], "TASK_BUNDLE");
        assert_eq!(SLOT_KINDS.len(), 7);
    }

    #[test]
    fn failure_codes_render_uppercase() {
        let failure = PackFailure {
            code: ValidationCode::PackHashMismatch,
            detail: "expected aaa, found bbb".to_string(),
        };
        assert_eq!(failure.to_string(), "PACK_HASH_MISMATCH: expected aaa, found bbb");
    }
}
