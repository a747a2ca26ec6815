//! Live task-store adapter reading board records from disk.

use std::path::{Path, PathBuf};

use crate::ports::tasks::{BoardTask, TaskStore};
use crate::ports::PortError;

/// Live task store backed by `<repo>/board/tasks/<id>.json` records.
///
/// The board service owns these files; this adapter only reads them.
pub struct LiveTaskStore {
    board_dir: PathBuf,
}

impl LiveTaskStore {
    /// Creates a task store rooted at the given repository root.
    #[must_use]
    pub fn new(repo_root: &Path) -> Self {
        Self { board_dir: repo_root.join("board").join("tasks") }
    }
}

impl TaskStore for LiveTaskStore {
    fn get_board_task(&self, task_id: &str) -> Result<Option<BoardTask>, PortError> {
        let path = self.board_dir.join(format!("{task_id}.json"));
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let task: BoardTask = serde_json::from_str(&contents)
            .map_err(|e| format!("malformed board task {}: {e}", path.display()))?;
        Ok(Some(task))
    }
}
