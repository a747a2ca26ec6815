//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `carto`.
#[derive(Debug, Parser)]
#[command(name = "carto", version, about = "Deterministic repository maps and context packs")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a map snapshot of the repository and persist it.
    Map {
        /// Root directories to walk (repeatable; default ".").
        #[arg(long = "root")]
        roots: Vec<String>,
        /// Exclude globs applied on top of the built-in excludes (repeatable).
        #[arg(long = "exclude")]
        excludes: Vec<String>,
        /// Output directory (default CARTO_OUT_DIR or "map").
        #[arg(long)]
        out: Option<PathBuf>,
        /// Cap on files collected (default CARTO_MAX_FILES or 20000).
        #[arg(long)]
        max_files: Option<usize>,
        /// Cap on file size eligible for extraction, in bytes.
        #[arg(long)]
        max_file_bytes: Option<u64>,
        /// Rescan every file instead of reusing the previous snapshot.
        #[arg(long)]
        full: bool,
        /// Previous snapshot to reuse and diff against
        /// (default <out>/map.json).
        #[arg(long)]
        previous: Option<PathBuf>,
    },
    /// Run a ranked query against a persisted map snapshot.
    Query {
        /// Query tokens, whitespace-separated.
        query: String,
        /// Snapshot to query (default <out>/map.json).
        #[arg(long)]
        map: Option<PathBuf>,
        /// Maximum results (clamped to 1..=200).
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Render a hash-verified context pack for a board task.
    Render {
        /// Board task id.
        #[arg(long)]
        task: String,
        /// Role whose policy shapes the capsule.
        #[arg(long)]
        role: String,
        /// Context mode.
        #[arg(long, default_value = "strict")]
        mode: String,
        /// Token budget recorded in the pack.
        #[arg(long, default_value_t = 12_000)]
        budget_tokens: u64,
    },
    /// Validate a rendered context pack against the repository.
    Validate {
        /// Run id under the runs directory.
        #[arg(long, conflicts_with = "pack")]
        run: Option<String>,
        /// Explicit path to a rendered pack JSON file.
        #[arg(long)]
        pack: Option<PathBuf>,
    },
}
