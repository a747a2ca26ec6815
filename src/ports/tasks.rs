//! Task-store port for resolving board tasks by id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::PortError;

/// Metadata for one task on the external board.
///
/// Only the fields the renderer needs are typed; everything else the
/// board records is carried through `extra` untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardTask {
    /// Stable task identifier.
    pub id: String,
    /// Human-readable task title.
    #[serde(default)]
    pub title: String,
    /// Board lane the task currently sits in.
    #[serde(default)]
    pub lane: String,
    /// Role the task is assigned to, when any.
    #[serde(default)]
    pub role: Option<String>,
    /// Remaining board fields, passed through verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Resolves tasks from the external job board.
///
/// The board itself (CRUD, lanes, circuit breakers) is an external
/// collaborator; this core only ever reads single tasks by id.
pub trait TaskStore: Send + Sync {
    /// Looks up a board task by id, returning `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or the record is
    /// malformed.
    fn get_board_task(&self, task_id: &str) -> Result<Option<BoardTask>, PortError>;
}
