//! `carto validate` command.

use std::path::Path;

use crate::config::Config;
use crate::context::ServiceContext;
use crate::pack::{render, validate};

/// Execute the `validate` command on a rendered pack, located either by
/// run id or by explicit path.
///
/// # Errors
///
/// Returns an error string when the pack cannot be read, or with the
/// first validation failure code when a check does not pass.
pub fn run(
    ctx: &ServiceContext,
    root: &Path,
    config: &Config,
    run_id: Option<&str>,
    pack_path: Option<&Path>,
) -> Result<(), String> {
    let resolved = match (run_id, pack_path) {
        (_, Some(path)) => path.to_path_buf(),
        (Some(run_id), None) => render::pack_path(&root.join(&config.runs_dir), run_id),
        (None, None) => return Err("provide --run <run_id> or --pack <path>".to_string()),
    };

    let text = ctx
        .fs
        .read_to_string(&resolved)
        .map_err(|e| format!("failed to read pack at {}: {e}", resolved.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| format!("pack is not valid JSON: {e}"))?;

    validate::validate(ctx, root, &value).map_err(|f| f.to_string())?;
    println!("Pack valid: {}", resolved.display());
    Ok(())
}
