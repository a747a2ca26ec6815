//! `carto render` command.

use std::path::Path;

use crate::config::Config;
use crate::context::ServiceContext;
use crate::pack::render::{self, RenderRequest};
use crate::pack::RenderError;

/// Execute the `render` command.
///
/// # Errors
///
/// Returns an error string carrying the pipeline failure code when any
/// render stage fails.
pub fn run(
    ctx: &ServiceContext,
    root: &Path,
    config: &Config,
    task_id: &str,
    role: &str,
    mode: &str,
    budget_tokens: u64,
) -> Result<(), String> {
    let runs_root = root.join(&config.runs_dir);
    let request = RenderRequest {
        task_id: task_id.to_string(),
        role: role.to_string(),
        mode: mode.to_string(),
        budget_tokens,
    };

    let outcome = render::render(ctx, root, &runs_root, &request).map_err(describe)?;
    println!("Rendered context pack {}", outcome.pack.context_pack_id);
    println!("run {}", outcome.pack.run_id);
    println!("hash {}", outcome.pack.hash);
    println!("Written to {}", outcome.pack_path.display());
    Ok(())
}

fn describe(err: RenderError) -> String {
    let mut message = format!("render failed ({}): {err}", err.code());
    match &err {
        RenderError::RefsIntegrity { violations } => {
            for v in violations {
                message.push_str(&format!("\n  {} {:?}", v.path, v.kind));
            }
        }
        RenderError::TaskBundleIncomplete { missing, .. } => {
            for name in missing {
                message.push_str(&format!("\n  missing {name}"));
            }
        }
        _ => {}
    }
    message
}
