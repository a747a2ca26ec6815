//! Service context bundling all port trait objects.

use std::path::Path;

use crate::ports::clock::Clock;
use crate::ports::filesystem::FileSystem;
use crate::ports::id_gen::IdGenerator;
use crate::ports::tasks::TaskStore;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Tests replace
/// individual fields with in-memory fakes.
pub struct ServiceContext {
    /// Clock for obtaining the current time.
    pub clock: Box<dyn Clock>,
    /// Filesystem for file I/O.
    pub fs: Box<dyn FileSystem>,
    /// ID generator for run-id suffixes.
    pub id_gen: Box<dyn IdGenerator>,
    /// Task store for resolving board tasks.
    pub tasks: Box<dyn TaskStore>,
}

impl ServiceContext {
    /// Creates a live context with real adapters rooted at `repo_root`.
    #[must_use]
    pub fn live(repo_root: &Path) -> Self {
        use crate::adapters::live::clock::LiveClock;
        use crate::adapters::live::filesystem::LiveFileSystem;
        use crate::adapters::live::id_gen::LiveIdGenerator;
        use crate::adapters::live::tasks::LiveTaskStore;

        Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            id_gen: Box::new(LiveIdGenerator),
            tasks: Box::new(LiveTaskStore::new(repo_root)),
        }
    }
}
