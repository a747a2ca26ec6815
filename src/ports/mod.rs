//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the application core and an
//! external system (time, filesystem, IDs, the task board). Live
//! implementations live in `src/adapters/live/`; tests substitute
//! in-memory fakes.

pub mod clock;
pub mod filesystem;
pub mod id_gen;
pub mod tasks;

pub use clock::Clock;
pub use filesystem::{FileStat, FileSystem};
pub use id_gen::IdGenerator;
pub use tasks::{BoardTask, TaskStore};

/// Boxed error type used across all port boundaries.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;
