//! Runtime configuration loaded from environment variables.
//!
//! The binary calls `dotenvy::dotenv()` at startup so a local `.env`
//! file can supply these values during development. Every variable has
//! a default; unparseable numeric values fall back to the default.

use std::env;

/// Default output directory for persisted map artifacts.
pub const DEFAULT_OUT_DIR: &str = "map";
/// Default root directory for per-run context pack output.
pub const DEFAULT_RUNS_DIR: &str = "runs";
/// Default cap on the number of files collected per build.
pub const DEFAULT_MAX_FILES: usize = 20_000;
/// Default cap on the size of a file eligible for extraction (1 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1_048_576;

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory (relative to the repo root) for map artifacts.
    pub out_dir: String,
    /// Directory (relative to the repo root) holding per-run output.
    pub runs_dir: String,
    /// Maximum number of files collected per build.
    pub max_files: usize,
    /// Maximum file size (bytes) eligible for symbol/config extraction.
    pub max_file_bytes: u64,
}

impl Config {
    /// Loads configuration from `CARTO_*` environment variables,
    /// falling back to defaults for unset or unparseable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            out_dir: env::var("CARTO_OUT_DIR").unwrap_or_else(|_| DEFAULT_OUT_DIR.to_string()),
            runs_dir: env::var("CARTO_RUNS_DIR").unwrap_or_else(|_| DEFAULT_RUNS_DIR.to_string()),
            max_files: parse_var("CARTO_MAX_FILES", DEFAULT_MAX_FILES),
            max_file_bytes: parse_var("CARTO_MAX_FILE_BYTES", DEFAULT_MAX_FILE_BYTES),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            out_dir: DEFAULT_OUT_DIR.to_string(),
            runs_dir: DEFAULT_RUNS_DIR.to_string(),
            max_files: DEFAULT_MAX_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
