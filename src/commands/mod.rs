//! Command dispatch and handlers.

pub mod map;
pub mod query;
pub mod render;
pub mod validate;

use std::env;

use crate::cli::Command;
use crate::config::Config;
use crate::context::ServiceContext;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let root = env::current_dir().map_err(|e| format!("failed to get current directory: {e}"))?;
    let ctx = ServiceContext::live(&root);
    let config = Config::from_env();

    match command {
        Command::Map { roots, excludes, out, max_files, max_file_bytes, full, previous } => {
            map::run(
                &ctx,
                &root,
                &config,
                &map::MapArgs {
                    roots: roots.clone(),
                    excludes: excludes.clone(),
                    out: out.clone(),
                    max_files: *max_files,
                    max_file_bytes: *max_file_bytes,
                    full: *full,
                    previous: previous.clone(),
                },
            )
        }
        Command::Query { query, map, limit } => {
            query::run(&ctx, &root, &config, query, map.as_deref(), *limit)
        }
        Command::Render { task, role, mode, budget_tokens } => {
            render::run(&ctx, &root, &config, task, role, mode, *budget_tokens)
        }
        Command::Validate { run, pack } => {
            validate::run(&ctx, &root, &config, run.as_deref(), pack.as_deref())
        }
    }
}
