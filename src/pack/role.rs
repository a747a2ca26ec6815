//! Role capsule projection from role policy documents.
//!
//! A policy file may carry operational fields the pack consumer must
//! never see; the capsule is a strict allow-list projection, so
//! anything outside the known field set is dropped rather than leaked.

use std::path::Path;

use serde_json::{json, Value};

use super::{RenderError, ROLE_SCHEMA_VERSION};
use crate::context::ServiceContext;

/// Policy fields carried into the capsule. Everything else is dropped.
pub const CAPSULE_FIELDS: [&str; 7] = [
    "context_mode",
    "allowed_refs",
    "capabilities",
    "permissions",
    "required_outputs",
    "gates",
    "events",
];

/// Resolves a role's policy path relative to the repo root.
#[must_use]
pub fn policy_path(repo_root: &Path, role: &str) -> std::path::PathBuf {
    repo_root.join("context/roles").join(format!("{role}.policy.json"))
}

/// Loads a role policy and projects it into a capsule.
///
/// # Errors
///
/// Returns [`RenderError::RolePolicy`] when the policy is missing,
/// malformed, schema-mismatched, or declares a different role than the
/// one requested.
pub fn load_capsule(
    ctx: &ServiceContext,
    repo_root: &Path,
    role: &str,
) -> Result<Value, RenderError> {
    let invalid = |detail: String| RenderError::RolePolicy { role: role.to_string(), detail };

    let path = policy_path(repo_root, role);
    let text = ctx.fs.read_to_string(&path).map_err(|e| invalid(e.to_string()))?;
    let policy: Value = serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
    let Some(obj) = policy.as_object() else {
        return Err(invalid("policy is not a JSON object".to_string()));
    };

    match obj.get("schema_version").and_then(Value::as_str) {
        Some(ROLE_SCHEMA_VERSION) => {}
        other => {
            return Err(invalid(format!(
                "unexpected schema_version `{}`, expected `{ROLE_SCHEMA_VERSION}`",
                other.unwrap_or("<missing>")
            )))
        }
    }
    match obj.get("role").and_then(Value::as_str) {
        Some(declared) if declared == role => {}
        other => {
            return Err(invalid(format!(
                "policy declares role `{}`, request was `{role}`",
                other.unwrap_or("<missing>")
            )))
        }
    }

    let mut capsule = json!({ "role": role });
    let capsule_obj = capsule
        .as_object_mut()
        .ok_or_else(|| invalid("capsule construction failed".to_string()))?;
    for field in CAPSULE_FIELDS {
        if let Some(value) = obj.get(field) {
            capsule_obj.insert(field.to_string(), value.clone());
        }
    }
    Ok(capsule)
}
