//! Map engine: deterministic, content-addressed repository snapshots.
//!
//! A build walks the configured roots, detects modules and entry points
//! from project manifests, extracts key symbols and configuration keys
//! with line-oriented pattern rules, cross-references documentation, and
//! produces a snapshot whose `hash` and `facts_hash` are stable across
//! rebuilds of an unchanged tree.

pub mod diff;
pub mod docrefs;
pub mod engine;
pub mod extract;
pub mod query;
pub mod scanner;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema version tag written into every map snapshot.
pub const MAP_SCHEMA_VERSION: &str = "map/1";
/// Generator name recorded in snapshots and version descriptors.
pub const GENERATOR_NAME: &str = "carto";
/// Cap on key symbols retained in a snapshot.
pub const MAX_KEY_SYMBOLS: usize = 6_000;
/// Cap on config keys retained in a snapshot.
pub const MAX_CONFIG_KEYS: usize = 8_000;
/// Cap on each sample list in the link report.
pub const LINK_REPORT_SAMPLE_CAP: usize = 200;

/// Errors from map building, persistence, and querying.
#[derive(Debug, Error)]
pub enum MapError {
    /// The query string was empty after trimming.
    #[error("missing_query: query must not be empty")]
    MissingQuery,
    /// An exclude glob failed to compile.
    #[error("invalid exclude pattern `{pattern}`: {detail}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Compiler diagnostic.
        detail: String,
    },
    /// Directory traversal failed.
    #[error("walk failed at {path}: {detail}")]
    Walk {
        /// Path where traversal failed.
        path: String,
        /// Underlying error.
        detail: String,
    },
    /// A read or write outside the degrade-and-continue paths failed.
    #[error("io failure at {path}: {detail}")]
    Io {
        /// Path involved in the failure.
        path: String,
        /// Underlying error.
        detail: String,
    },
    /// Snapshot serialization failed.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The output-directory lock could not be acquired.
    #[error("lock failed at {path}: {detail}")]
    Lock {
        /// Lock file path.
        path: String,
        /// Underlying error.
        detail: String,
    },
}

impl MapError {
    /// Machine-readable error code for the routing layer.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingQuery => "missing_query",
            Self::Pattern { .. } => "bad_exclude_pattern",
            Self::Walk { .. } => "walk_failed",
            Self::Io { .. } => "io_failed",
            Self::Serialize(_) => "serialize_failed",
            Self::Lock { .. } => "lock_failed",
        }
    }
}

/// Identity of the snapshot producer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Generator {
    /// Producer name.
    pub name: String,
    /// Producer version.
    pub version: String,
}

impl Generator {
    /// The generator descriptor for this build of the crate.
    #[must_use]
    pub fn current() -> Self {
        Self { name: GENERATOR_NAME.to_string(), version: env!("CARGO_PKG_VERSION").to_string() }
    }
}

/// What the scan covered: roots walked and globs excluded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Coverage {
    /// Root directories walked, relative to the repo root.
    pub roots: Vec<String>,
    /// Exclude glob patterns applied during the walk.
    pub excluded_globs: Vec<String>,
}

/// Ecosystem a detected module belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// `package.json` marker.
    Node,
    /// `go.mod` marker.
    Go,
    /// `Cargo.toml` marker.
    Rust,
    /// `pyproject.toml` / `requirements.txt` marker.
    Python,
    /// Marker of no recognized ecosystem.
    Generic,
    /// Configured root with no project marker.
    Root,
}

/// One detected project-marker directory or configured root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Module {
    /// Stable id, `mod:<root>`.
    pub id: String,
    /// Directory relative to the repo root (`.` for the root itself).
    pub root: String,
    /// Detected ecosystem.
    pub kind: ModuleKind,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f64,
    /// Marker filenames (or other signals) that triggered detection.
    pub signals: Vec<String>,
    /// Documentation files referencing this module's path.
    pub doc_refs: Vec<String>,
}

/// A runnable entry point declared by a project manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryPoint {
    /// Stable id, `pkg:<root>:<name>`.
    pub id: String,
    /// Entry kind (`script` or `bin`).
    pub kind: String,
    /// Manifest path the entry was derived from.
    pub path: String,
    /// Command that runs the entry point.
    pub command: String,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f64,
    /// Which manifest declaration produced the entry.
    pub reason: String,
    /// Documentation files referencing the manifest path.
    pub doc_refs: Vec<String>,
}

/// Category of an extracted symbol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// Function or method declaration.
    Function,
    /// Class declaration.
    Class,
    /// Constant declaration.
    Const,
    /// Type alias, enum, trait, or interface.
    Type,
    /// Struct declaration.
    Struct,
}

/// One extracted declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeySymbol {
    /// Declared name.
    pub symbol: String,
    /// Declaration category.
    pub kind: SymbolKind,
    /// Source file, relative to the repo root.
    pub path: String,
    /// 1-based line of the declaration.
    pub line: u32,
    /// `[start, end]` window of ±3 lines around the declaration.
    pub line_window: [u32; 2],
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,
    /// Documentation files referencing the source path.
    pub doc_refs: Vec<String>,
}

/// One extracted environment-style configuration key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigKey {
    /// Configuration key name.
    pub key: String,
    /// Source file, relative to the repo root.
    pub path: String,
    /// 1-based line where the key appears.
    pub line: u32,
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,
    /// Which pattern rule matched.
    pub reason: String,
}

/// One detected test-framework entry point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestEntryPoint {
    /// Stable id, `test:<root>:<framework>`.
    pub id: String,
    /// Framework name (`cargo`, `npm`, `pytest`, `go`).
    pub kind: String,
    /// Command that runs the tests.
    pub command: String,
    /// Test directories found under the module root.
    pub paths: Vec<String>,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f64,
    /// Which marker produced the detection.
    pub reason: String,
}

/// Reverse mapping from a code path to a documentation file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct DocRef {
    /// Code path named in the documentation.
    pub code_path: String,
    /// Documentation file containing the reference.
    pub doc_path: String,
    /// How the reference was found.
    pub reason: String,
}

/// Size/mtime metadata for one scanned file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileIndexEntry {
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime: i64,
    /// File size in bytes.
    pub size: u64,
}

/// A complete map snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Map {
    /// Snapshot schema version.
    pub schema_version: String,
    /// Wall-clock build time (excluded from the content hash).
    pub generated_at: DateTime<Utc>,
    /// Producer identity.
    pub generator: Generator,
    /// What the scan covered.
    pub coverage: Coverage,
    /// Detected modules.
    pub modules: Vec<Module>,
    /// Manifest-declared entry points.
    pub entry_points: Vec<EntryPoint>,
    /// Extracted declarations, capped and sorted.
    pub key_symbols: Vec<KeySymbol>,
    /// Detected test entry points.
    pub test_entry_points: Vec<TestEntryPoint>,
    /// Extracted configuration keys, capped and sorted.
    pub configs: Vec<ConfigKey>,
    /// Documentation cross-references.
    pub doc_refs: Vec<DocRef>,
    /// Per-file size/mtime index (excluded from the content hash; the
    /// sole basis for incremental reuse).
    pub file_index: BTreeMap<String, FileIndexEntry>,
    /// Content hash over the canonical subset of this snapshot.
    pub hash: String,
    /// Narrower hash over observable facts only.
    pub facts_hash: String,
}

/// Counts recorded in the version descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MapStats {
    /// Files listed in the file index.
    pub files: usize,
    /// Detected modules.
    pub modules: usize,
    /// Entry points.
    pub entry_points: usize,
    /// Key symbols.
    pub key_symbols: usize,
    /// Config keys.
    pub configs: usize,
    /// Test entry points.
    pub test_entry_points: usize,
}

/// Per-build version descriptor, written alongside the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionDescriptor {
    /// Descriptor schema version.
    pub schema_version: String,
    /// Build timestamp.
    pub generated_at: DateTime<Utc>,
    /// When this snapshot should be considered stale.
    pub valid_until: DateTime<Utc>,
    /// Producer identity.
    pub generator: Generator,
    /// Path of the persisted snapshot.
    pub map_path: String,
    /// Path of the persisted link report.
    pub link_report_path: String,
    /// Snapshot content hash.
    pub hash: String,
    /// Snapshot facts hash.
    pub facts_hash: String,
    /// What the scan covered.
    pub coverage: Coverage,
    /// Entity counts.
    pub stats: MapStats,
}

/// Full-scan counts of entities missing documentation references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LinkCounts {
    /// Modules with no doc references.
    pub modules_missing: usize,
    /// Entry points with no doc references.
    pub entry_points_missing: usize,
    /// Key symbols with no doc references.
    pub key_symbols_missing: usize,
}

/// Capped sample lists of entities missing documentation references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MissingDocRefs {
    /// Up to 200 module ids.
    pub modules: Vec<String>,
    /// Up to 200 entry point ids.
    pub entry_points: Vec<String>,
    /// Up to 200 symbol names qualified by path.
    pub key_symbols: Vec<String>,
}

/// Completeness audit of doc-to-code cross-references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkReport {
    /// Report schema version.
    pub schema_version: String,
    /// Build timestamp.
    pub generated_at: DateTime<Utc>,
    /// Hash of the snapshot the report describes.
    pub map_hash: String,
    /// Full-scan counts (never capped).
    pub counts: LinkCounts,
    /// Capped sample lists.
    pub missing_doc_refs: MissingDocRefs,
}

/// The `(hash, facts_hash)` pair identifying one snapshot in a diff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashPair {
    /// Content hash.
    pub hash: String,
    /// Facts hash.
    pub facts_hash: String,
}

/// Set difference over one facts vector triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FactsDelta {
    /// Module roots.
    pub modules: Vec<String>,
    /// Entry point ids.
    pub entry_points: Vec<String>,
    /// Contract ids (test entry points).
    pub contracts: Vec<String>,
}

/// Facts-level difference between two snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapDiff {
    /// Diff schema version.
    pub schema_version: String,
    /// Diff timestamp.
    pub generated_at: DateTime<Utc>,
    /// Previous snapshot identity.
    pub previous: HashPair,
    /// Current snapshot identity.
    pub current: HashPair,
    /// Facts present in current but not previous.
    pub added: FactsDelta,
    /// Facts present in previous but not current.
    pub removed: FactsDelta,
}
