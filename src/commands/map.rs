//! `carto map` command.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::context::ServiceContext;
use crate::map::engine::{self, BuildOptions};

/// Parsed arguments for the `map` command.
#[derive(Debug, Clone)]
pub struct MapArgs {
    /// Roots to walk; empty means the repo root.
    pub roots: Vec<String>,
    /// Extra exclude globs.
    pub excludes: Vec<String>,
    /// Output directory override.
    pub out: Option<PathBuf>,
    /// File count cap override.
    pub max_files: Option<usize>,
    /// File size cap override.
    pub max_file_bytes: Option<u64>,
    /// Disable incremental reuse.
    pub full: bool,
    /// Previous snapshot override.
    pub previous: Option<PathBuf>,
}

/// Execute the `map` command: build a snapshot and persist it.
///
/// # Errors
///
/// Returns an error string if the build or persist fails.
pub fn run(
    ctx: &ServiceContext,
    root: &Path,
    config: &Config,
    args: &MapArgs,
) -> Result<(), String> {
    let out_dir = args.out.clone().unwrap_or_else(|| root.join(&config.out_dir));
    let roots =
        if args.roots.is_empty() { vec![".".to_string()] } else { args.roots.clone() };
    let options = BuildOptions {
        roots,
        excludes: args.excludes.clone(),
        max_files: args.max_files.unwrap_or(config.max_files),
        max_file_bytes: args.max_file_bytes.unwrap_or(config.max_file_bytes),
        incremental: !args.full,
        previous_map_path: Some(
            args.previous.clone().unwrap_or_else(|| out_dir.join("map.json")),
        ),
    };

    let result = engine::build(ctx, root, &options)
        .map_err(|e| format!("map build failed ({}): {e}", e.code()))?;
    let paths = engine::persist(ctx, &out_dir, &result)
        .map_err(|e| format!("map persist failed ({}): {e}", e.code()))?;

    let stats = &result.version.stats;
    println!(
        "Map generated: {} modules, {} entry points, {} key symbols, {} files",
        stats.modules, stats.entry_points, stats.key_symbols, stats.files,
    );
    println!("hash {}  facts {}", result.map.hash, result.map.facts_hash);
    println!("Written to {}", paths.map_json.display());
    if let Some(diff) = &result.diff {
        let added = diff.added.modules.len()
            + diff.added.entry_points.len()
            + diff.added.contracts.len();
        let removed = diff.removed.modules.len()
            + diff.removed.entry_points.len()
            + diff.removed.contracts.len();
        if added + removed == 0 {
            println!("No observable changes since the previous snapshot.");
        } else {
            println!("Diff: {added} added, {removed} removed facts (see diff.md)");
        }
    }
    Ok(())
}
