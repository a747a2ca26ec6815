//! Filesystem port for file I/O operations.

use std::path::Path;

use super::PortError;

/// Size and modification-time metadata for one file.
///
/// `mtime_ms` is milliseconds since the Unix epoch; together with
/// `size` it is the sole basis for incremental-reuse decisions in the
/// map engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// File size in bytes.
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime_ms: i64,
}

/// Provides filesystem access for reading and writing files.
///
/// Abstracting the filesystem allows the pack renderer and map engine
/// to be exercised against in-memory fakes without touching disk.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, PortError>;

    /// Reads the entire contents of a file as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, PortError>;

    /// Writes the given contents to a file, creating parent directories
    /// and overwriting any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError>;

    /// Writes contents atomically: to a temporary file in the target
    /// directory, then renamed over the destination. A crash mid-write
    /// never leaves a torn file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary write or the rename fails.
    fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), PortError>;

    /// Returns `true` if the path exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Returns size and modification-time metadata for a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be stat'ed.
    fn stat(&self, path: &Path) -> Result<FileStat, PortError>;

    /// Creates a directory and all of its missing parents.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails.
    fn create_dir_all(&self, path: &Path) -> Result<(), PortError>;
}
