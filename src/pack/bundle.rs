//! Task bundle resolution: the board task plus its pinned artifacts.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use super::RenderError;
use crate::context::ServiceContext;
use crate::ports::tasks::BoardTask;

/// Required artifact: dependency and environment pins.
pub const PINS_FILE: &str = "pins.json";
/// Required artifact: preflight checklist results.
pub const PREFLIGHT_FILE: &str = "preflight.json";
/// Optional artifact: replay inputs for deterministic re-runs.
pub const REPLAY_FILE: &str = "replay_bundle.json";

/// Resolves a task's artifact directory relative to the repo root.
#[must_use]
pub fn task_dir(repo_root: &Path, task_id: &str) -> PathBuf {
    repo_root.join("tasks").join(task_id)
}

/// The board task and its artifacts, as loaded for one render.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskBundle {
    /// The board task record.
    pub task: Option<BoardTask>,
    /// Contents of `pins.json`.
    pub pins: Option<Value>,
    /// Contents of `preflight.json`.
    pub preflight: Option<Value>,
    /// Contents of `replay_bundle.json`, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_bundle: Option<Value>,
}

/// Loads the task bundle for `task_id`.
///
/// # Errors
///
/// Returns [`RenderError::TaskNotFound`] when the board has no such
/// task, and [`RenderError::TaskBundleIncomplete`] when a required
/// artifact is missing or unparsable; the incomplete error carries
/// whatever was loadable.
pub fn load(
    ctx: &ServiceContext,
    repo_root: &Path,
    task_id: &str,
) -> Result<TaskBundle, RenderError> {
    let task = ctx
        .tasks
        .get_board_task(task_id)
        .map_err(|e| RenderError::Io {
            path: format!("board/tasks/{task_id}.json"),
            detail: e.to_string(),
        })?
        .ok_or_else(|| RenderError::TaskNotFound { task_id: task_id.to_string() })?;

    let dir = task_dir(repo_root, task_id);
    let pins = load_artifact(ctx, &dir, PINS_FILE);
    let preflight = load_artifact(ctx, &dir, PREFLIGHT_FILE);
    let replay_bundle = load_artifact(ctx, &dir, REPLAY_FILE);

    let mut missing = Vec::new();
    if pins.is_none() {
        missing.push(PINS_FILE.to_string());
    }
    if preflight.is_none() {
        missing.push(PREFLIGHT_FILE.to_string());
    }
    let bundle = TaskBundle { task: Some(task), pins, preflight, replay_bundle };
    if missing.is_empty() {
        Ok(bundle)
    } else {
        Err(RenderError::TaskBundleIncomplete { missing, partial: bundle })
    }
}

/// Reads and parses one artifact; unreadable or unparsable means
/// absent.
fn load_artifact(ctx: &ServiceContext, dir: &Path, name: &str) -> Option<Value> {
    let text = ctx.fs.read_to_string(&dir.join(name)).ok()?;
    serde_json::from_str(&text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{mem_context, MemFs};
    use pretty_assertions::assert_eq;

    fn seed_task(fs: &MemFs, task_id: &str) {
        fs.seed(
            &format!("/repo/tasks/{task_id}/pins.json"),
            r#"{"node": "22.1.0"}"#,
        );
        fs.seed(
            &format!("/repo/tasks/{task_id}/preflight.json"),
            r#"{"checks": ["lint"]}"#,
        );
    }

    fn board_task(id: &str) -> BoardTask {
        BoardTask {
            id: id.to_string(),
            title: "Ship the gateway".to_string(),
            lane: "doing".to_string(),
            role: Some("builder".to_string()),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn complete_bundle_loads() {
        let fs = MemFs::new();
        seed_task(&fs, "T-1");
        let ctx = mem_context(fs, vec![board_task("T-1")]);

        let bundle = load(&ctx, Path::new("/repo"), "T-1").unwrap();
        assert_eq!(bundle.task.unwrap().id, "T-1");
        assert_eq!(bundle.pins.unwrap()["node"], "22.1.0");
        assert!(bundle.replay_bundle.is_none());
    }

    #[test]
    fn unknown_task_is_task_not_found() {
        let ctx = mem_context(MemFs::new(), vec![]);
        let err = load(&ctx, Path::new("/repo"), "T-404").unwrap_err();
        assert_eq!(err.code(), "task_not_found");
    }

    #[test]
    fn missing_required_artifacts_are_listed_with_the_partial_bundle() {
        let fs = MemFs::new();
        fs.seed("/repo/tasks/T-2/pins.json", r#"{"node": "22.1.0"}"#);
        let ctx = mem_context(fs, vec![board_task("T-2")]);

        let err = load(&ctx, Path::new("/repo"), "T-2").unwrap_err();
        match err {
            RenderError::TaskBundleIncomplete { missing, partial } => {
                assert_eq!(missing, vec![PREFLIGHT_FILE.to_string()]);
                assert!(partial.pins.is_some());
                assert!(partial.preflight.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_artifact_counts_as_missing() {
        let fs = MemFs::new();
        seed_task(&fs, "T-3");
        fs.seed("/repo/tasks/T-3/preflight.json", "{not json");
        let ctx = mem_context(fs, vec![board_task("T-3")]);

        let err = load(&ctx, Path::new("/repo"), "T-3").unwrap_err();
        assert_eq!(err.code(), "task_bundle_incomplete");
    }

    #[test]
    fn replay_bundle_is_optional_but_carried_when_present() {
        let fs = MemFs::new();
        seed_task(&fs, "T-4");
        fs.seed("/repo/tasks/T-4/replay_bundle.json", r#"{"seed": 7}"#);
        let ctx = mem_context(fs, vec![board_task("T-4")]);

        let bundle = load(&ctx, Path::new("/repo"), "T-4").unwrap();
        assert_eq!(bundle.replay_bundle.unwrap()["seed"], 7);
    }
}
