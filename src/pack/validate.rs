//! Read-only context pack validation.
//!
//! Checks run in a fixed order and stop at the first failure. The
//! validator never repairs or rewrites a pack; a stale pack is
//! re-rendered, not patched.

use std::path::Path;

use serde_json::Value;

use super::refs::{self, BindingRef, ViolationKind};
use super::{
    pack_hash, PackFailure, ValidationCode, PACK_SCHEMA_VERSION, REQUIRED_SLOTS, SLOT_KINDS,
};
use crate::context::ServiceContext;

/// Validates a rendered pack value against the current repository.
///
/// # Errors
///
/// Returns the first [`PackFailure`] encountered, in check order:
/// schema, required slots, pack hash, then binding-ref integrity.
pub fn validate(
    ctx: &ServiceContext,
    repo_root: &Path,
    pack: &Value,
) -> Result<(), PackFailure> {
    let fail = |code, detail: String| Err(PackFailure { code, detail });

    let Some(obj) = pack.as_object() else {
        return fail(ValidationCode::SchemaMismatch, "pack is not a JSON object".to_string());
    };
    match obj.get("schema_version").and_then(Value::as_str) {
        Some(PACK_SCHEMA_VERSION) => {}
        other => {
            return fail(
                ValidationCode::SchemaMismatch,
                format!(
                    "schema_version `{}`, expected `{PACK_SCHEMA_VERSION}`",
                    other.unwrap_or("<missing>")
                ),
            )
        }
    }

    let slots = obj.get("slots").and_then(Value::as_array);
    for &index in &REQUIRED_SLOTS {
        let kind = SLOT_KINDS[index];
        let present = slots
            .and_then(|s| {
                s.iter().find(|slot| {
                    slot.get("index").and_then(Value::as_u64) == Some(index as u64)
                })
            })
            .is_some_and(|slot| {
                slot.get("kind").and_then(Value::as_str) == Some(kind)
                    && slot.get("body").is_some_and(|b| !b.is_null())
            });
        if !present {
            return fail(ValidationCode::MissingRequiredSlot, format!("slot {index} ({kind})"));
        }
    }

    let declared = obj.get("hash").and_then(Value::as_str).unwrap_or_default();
    let recomputed = match pack_hash(pack) {
        Ok(h) => h,
        Err(e) => return fail(ValidationCode::SchemaMismatch, format!("hash recompute: {e}")),
    };
    if recomputed != declared {
        return fail(
            ValidationCode::PackHashMismatch,
            format!("declared {declared}, recomputed {recomputed}"),
        );
    }

    verify_slot_refs(ctx, repo_root, pack)
}

fn verify_slot_refs(
    ctx: &ServiceContext,
    repo_root: &Path,
    pack: &Value,
) -> Result<(), PackFailure> {
    let fail = |code, detail: String| Err(PackFailure { code, detail });

    let body = pack
        .get("slots")
        .and_then(Value::as_array)
        .and_then(|s| s.iter().find(|slot| slot.get("index").and_then(Value::as_u64) == Some(1)))
        .and_then(|slot| slot.get("body"));
    let refs_value = body.and_then(|b| b.get("refs"));
    let bindings: Vec<BindingRef> = match refs_value {
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(bindings) => bindings,
            Err(e) => return fail(ValidationCode::RefsInvalid, format!("malformed refs: {e}")),
        },
        None => return fail(ValidationCode::RefsInvalid, "slot 1 carries no refs".to_string()),
    };

    for binding in &bindings {
        if let Some(violation) = refs::verify(ctx, repo_root, binding) {
            let code = match violation.kind {
                ViolationKind::MissingVersion => ValidationCode::RefMissingVersion,
                ViolationKind::InvalidPath => ValidationCode::RefsInvalid,
                ViolationKind::Unreadable | ViolationKind::HashMismatch => {
                    ValidationCode::RefHashMismatch
                }
            };
            return fail(code, violation.path);
        }
    }
    Ok(())
}
