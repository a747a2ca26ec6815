//! `carto query` command.

use std::path::Path;

use crate::config::Config;
use crate::context::ServiceContext;
use crate::map::engine;
use crate::map::query;

/// Execute the `query` command against a persisted snapshot.
///
/// # Errors
///
/// Returns an error string if the snapshot cannot be loaded or the
/// query is empty.
pub fn run(
    ctx: &ServiceContext,
    root: &Path,
    config: &Config,
    q: &str,
    map_path: Option<&Path>,
    limit: usize,
) -> Result<(), String> {
    let default_path = root.join(&config.out_dir).join("map.json");
    let path = map_path.unwrap_or(&default_path);
    let map = engine::load_map(ctx, path)
        .map_err(|e| format!("failed to load map ({}): {e}", e.code()))?;

    let hits = query::query(&map, q, limit).map_err(|e| format!("{}: {e}", e.code()))?;
    if hits.is_empty() {
        println!("No matches.");
        return Ok(());
    }
    for hit in &hits {
        println!("{:>6.2}  {:<16} {}  ({})", hit.score, hit.kind, hit.id, hit.path);
    }
    Ok(())
}
