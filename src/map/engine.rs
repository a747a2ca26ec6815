//! Map build orchestration, persistence, and incremental reuse.
//!
//! A build is best-effort: unreadable files reduce completeness but
//! never fail the build, and the result is either fully complete or an
//! error — never partial output presented as success.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::Duration;
use fs2::FileExt;
use serde_json::json;

use super::diff::{diff_maps, render_markdown, Facts};
use super::docrefs::DocIndex;
use super::extract;
use super::scanner::{self, ExcludeSet, MarkerFile, ScannedFile};
use super::{
    ConfigKey, Coverage, EntryPoint, FileIndexEntry, Generator, KeySymbol, LinkCounts,
    LinkReport, Map, MapDiff, MapError, MapStats, MissingDocRefs, Module, ModuleKind,
    TestEntryPoint, VersionDescriptor, LINK_REPORT_SAMPLE_CAP, MAP_SCHEMA_VERSION,
    MAX_CONFIG_KEYS, MAX_KEY_SYMBOLS,
};
use crate::config::{DEFAULT_MAX_FILES, DEFAULT_MAX_FILE_BYTES};
use crate::context::ServiceContext;
use crate::hash;

/// Directories excluded from every scan, in addition to configured
/// excludes. The output directories exclude themselves so a build never
/// indexes its own artifacts.
pub const DEFAULT_EXCLUDES: [&str; 10] = [
    ".git",
    "node_modules",
    "target",
    "map",
    "runs",
    ".venv",
    "venv",
    "dist",
    "build",
    "__pycache__",
];

/// Script names admitted from manifest `scripts` tables.
const CORE_SCRIPTS: [&str; 5] = ["start", "dev", "build", "test", "smoke"];
/// Namespaced script prefixes admitted from manifest `scripts` tables.
const CORE_SCRIPT_PREFIXES: [&str; 4] = ["test:", "build:", "dev:", "smoke:"];

/// How long a snapshot is considered fresh.
const SNAPSHOT_TTL_HOURS: i64 = 24;

/// Inputs for one build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Root directories to walk, relative to the repo root.
    pub roots: Vec<String>,
    /// Exclude globs, applied on top of [`DEFAULT_EXCLUDES`].
    pub excludes: Vec<String>,
    /// Cap on files collected.
    pub max_files: usize,
    /// Cap on file size eligible for extraction.
    pub max_file_bytes: u64,
    /// Reuse prior extraction for files with unchanged size/mtime.
    pub incremental: bool,
    /// Previous snapshot to reuse and diff against.
    pub previous_map_path: Option<PathBuf>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            roots: vec![".".to_string()],
            excludes: Vec::new(),
            max_files: DEFAULT_MAX_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            incremental: true,
            previous_map_path: None,
        }
    }
}

/// Output of one build.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// The snapshot.
    pub map: Map,
    /// Version descriptor written alongside it.
    pub version: VersionDescriptor,
    /// Doc-reference completeness audit.
    pub link_report: LinkReport,
    /// Facts diff, present only when a previous snapshot was loaded.
    pub diff: Option<MapDiff>,
}

/// Builds a map snapshot of the repository at `repo_root`.
///
/// # Errors
///
/// Fails on directory-traversal errors, invalid exclude patterns, or
/// serialization failures. Per-file read errors degrade (the file stays
/// in the file index without extraction) and never fail the build.
pub fn build(
    ctx: &ServiceContext,
    repo_root: &Path,
    options: &BuildOptions,
) -> Result<BuildResult, MapError> {
    let generated_at = ctx.clock.now();

    let mut excluded_globs: Vec<String> =
        DEFAULT_EXCLUDES.iter().map(ToString::to_string).collect();
    excluded_globs.extend(options.excludes.iter().cloned());
    let excludes = ExcludeSet::compile(&excluded_globs)?;

    let scan = scanner::scan(repo_root, &options.roots, &excludes, options.max_files)?;
    log::debug!("scan collected {} files, {} markers", scan.files.len(), scan.markers.len());

    let previous = if options.incremental {
        options.previous_map_path.as_deref().and_then(|p| load_previous(ctx, p))
    } else {
        None
    };

    let file_paths: HashSet<&str> = scan.files.iter().map(|f| f.rel_path.as_str()).collect();
    let mut modules = detect_modules(&scan.markers, &options.roots);
    let (mut entry_points, test_scripts) =
        collect_entry_points(ctx, repo_root, &scan.markers, &file_paths);
    let mut test_entry_points =
        detect_test_entry_points(&modules, &scan.markers, &file_paths, &test_scripts);

    let (mut key_symbols, mut configs) =
        extract_all(ctx, repo_root, &scan.files, previous.as_ref(), options);

    let doc_index = DocIndex::build(ctx, repo_root);
    for module in &mut modules {
        module.doc_refs = doc_index.refs_under(&module.root);
    }
    for entry in &mut entry_points {
        entry.doc_refs = doc_index.refs_for(&entry.path);
    }
    for symbol in &mut key_symbols {
        symbol.doc_refs = doc_index.refs_for(&symbol.path);
    }

    // Deterministic ordering and caps: identical inputs always yield
    // byte-identical snapshots.
    modules.sort_by(|a, b| a.root.cmp(&b.root));
    entry_points.sort_by(|a, b| a.id.cmp(&b.id));
    test_entry_points.sort_by(|a, b| a.id.cmp(&b.id));
    key_symbols.sort_by(|a, b| {
        (&a.path, a.line, &a.symbol).cmp(&(&b.path, b.line, &b.symbol))
    });
    key_symbols.truncate(MAX_KEY_SYMBOLS);
    configs.sort_by(|a, b| (&a.key, &a.path, a.line).cmp(&(&b.key, &b.path, b.line)));
    configs.truncate(MAX_CONFIG_KEYS);

    let file_index: BTreeMap<String, FileIndexEntry> = scan
        .files
        .iter()
        .map(|f| (f.rel_path.clone(), FileIndexEntry { mtime: f.mtime_ms, size: f.size }))
        .collect();

    let mut map = Map {
        schema_version: MAP_SCHEMA_VERSION.to_string(),
        generated_at,
        generator: Generator::current(),
        coverage: Coverage { roots: options.roots.clone(), excluded_globs },
        modules,
        entry_points,
        key_symbols,
        test_entry_points,
        configs,
        doc_refs: doc_index.entries().to_vec(),
        file_index,
        hash: String::new(),
        facts_hash: String::new(),
    };
    map.hash = content_hash_of(&map)?;
    map.facts_hash = hash::content_hash(&Facts::of(&map))?;

    let stats = MapStats {
        files: map.file_index.len(),
        modules: map.modules.len(),
        entry_points: map.entry_points.len(),
        key_symbols: map.key_symbols.len(),
        configs: map.configs.len(),
        test_entry_points: map.test_entry_points.len(),
    };
    let version = VersionDescriptor {
        schema_version: MAP_SCHEMA_VERSION.to_string(),
        generated_at,
        valid_until: generated_at + Duration::hours(SNAPSHOT_TTL_HOURS),
        generator: map.generator.clone(),
        map_path: "map.json".to_string(),
        link_report_path: "link_report.json".to_string(),
        hash: map.hash.clone(),
        facts_hash: map.facts_hash.clone(),
        coverage: map.coverage.clone(),
        stats,
    };

    let link_report = link_report(&map);
    let diff = previous.map(|prev| diff_maps(&prev, &map, generated_at));

    Ok(BuildResult { map, version, link_report, diff })
}

/// Content hash over the canonical subset of a snapshot, excluding the
/// volatile `generated_at` and `file_index` fields (and the hash fields
/// themselves), so two builds of an unchanged tree hash identically.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn content_hash_of(map: &Map) -> Result<String, serde_json::Error> {
    let subset = json!({
        "schema_version": map.schema_version,
        "generator": map.generator,
        "coverage": map.coverage,
        "modules": map.modules,
        "entry_points": map.entry_points,
        "key_symbols": map.key_symbols,
        "test_entry_points": map.test_entry_points,
        "configs": map.configs,
        "doc_refs": map.doc_refs,
    });
    hash::content_hash(&subset)
}

/// Loads a snapshot from disk.
///
/// # Errors
///
/// Returns [`MapError::Io`] when the file cannot be read and
/// [`MapError::Serialize`] when it cannot be parsed.
pub fn load_map(ctx: &ServiceContext, path: &Path) -> Result<Map, MapError> {
    let text = ctx
        .fs
        .read_to_string(path)
        .map_err(|e| MapError::Io { path: path.display().to_string(), detail: e.to_string() })?;
    Ok(serde_json::from_str(&text)?)
}

fn load_previous(ctx: &ServiceContext, path: &Path) -> Option<Map> {
    match load_map(ctx, path) {
        Ok(map) => Some(map),
        Err(err) => {
            log::debug!("no previous snapshot at {}: {err}", path.display());
            None
        }
    }
}

fn detect_modules(markers: &[MarkerFile], roots: &[String]) -> Vec<Module> {
    // Precedence when one directory carries several markers.
    const KIND_ORDER: [(&str, ModuleKind); 5] = [
        ("Cargo.toml", ModuleKind::Rust),
        ("go.mod", ModuleKind::Go),
        ("package.json", ModuleKind::Node),
        ("pyproject.toml", ModuleKind::Python),
        ("requirements.txt", ModuleKind::Python),
    ];

    let mut by_dir: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for marker in markers {
        if scanner::PROJECT_MARKERS.contains(&marker.name.as_str()) {
            by_dir.entry(marker.dir.clone()).or_default().push(marker.name.clone());
        }
    }

    let mut modules: Vec<Module> = by_dir
        .into_iter()
        .map(|(dir, mut signals)| {
            signals.sort();
            let kind = KIND_ORDER
                .iter()
                .find(|(name, _)| signals.iter().any(|s| s == name))
                .map_or(ModuleKind::Generic, |(_, kind)| *kind);
            Module {
                id: format!("mod:{dir}"),
                root: dir,
                kind,
                confidence: 0.9,
                signals,
                doc_refs: Vec::new(),
            }
        })
        .collect();

    for root in roots {
        let normalized = if root.trim_matches('/').is_empty() { "." } else { root.trim_matches('/') };
        if !modules.iter().any(|m| m.root == normalized) {
            modules.push(Module {
                id: format!("mod:{normalized}"),
                root: normalized.to_string(),
                kind: ModuleKind::Root,
                confidence: 0.6,
                signals: vec!["configured-root".to_string()],
                doc_refs: Vec::new(),
            });
        }
    }
    modules
}

/// Collects manifest-declared entry points. Returns the entry points
/// plus the set of module dirs whose `package.json` declares a `test`
/// script (consumed by test-entry-point detection).
fn collect_entry_points(
    ctx: &ServiceContext,
    repo_root: &Path,
    markers: &[MarkerFile],
    file_paths: &HashSet<&str>,
) -> (Vec<EntryPoint>, HashSet<String>) {
    let mut entries = Vec::new();
    let mut test_scripts = HashSet::new();
    for marker in markers {
        let Ok(text) = ctx.fs.read_to_string(&repo_root.join(&marker.rel_path)) else {
            continue; // unreadable manifest degrades, never fails
        };
        match marker.name.as_str() {
            "package.json" => {
                parse_package_json(marker, &text, &mut entries, &mut test_scripts);
            }
            "Cargo.toml" => parse_cargo_toml(marker, &text, file_paths, &mut entries),
            _ => {}
        }
    }
    (entries, test_scripts)
}

fn admitted_script(name: &str) -> bool {
    CORE_SCRIPTS.contains(&name)
        || CORE_SCRIPT_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

fn parse_package_json(
    marker: &MarkerFile,
    text: &str,
    entries: &mut Vec<EntryPoint>,
    test_scripts: &mut HashSet<String>,
) {
    let Ok(manifest) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };
    if let Some(scripts) = manifest.get("scripts").and_then(|s| s.as_object()) {
        for name in scripts.keys() {
            if name == "test" {
                test_scripts.insert(marker.dir.clone());
            }
            if admitted_script(name) {
                entries.push(EntryPoint {
                    id: format!("pkg:{}:{name}", marker.dir),
                    kind: "script".to_string(),
                    path: marker.rel_path.clone(),
                    command: format!("npm run {name}"),
                    confidence: 0.8,
                    reason: format!("package.json scripts.{name}"),
                    doc_refs: Vec::new(),
                });
            }
        }
    }
    match manifest.get("bin") {
        Some(serde_json::Value::Object(bins)) => {
            for (name, target) in bins {
                entries.push(EntryPoint {
                    id: format!("pkg:{}:{name}", marker.dir),
                    kind: "bin".to_string(),
                    path: marker.rel_path.clone(),
                    command: format!("node {}", target.as_str().unwrap_or(name)),
                    confidence: 0.8,
                    reason: "package.json bin".to_string(),
                    doc_refs: Vec::new(),
                });
            }
        }
        Some(serde_json::Value::String(target)) => {
            let name = manifest.get("name").and_then(|n| n.as_str()).unwrap_or("main");
            entries.push(EntryPoint {
                id: format!("pkg:{}:{name}", marker.dir),
                kind: "bin".to_string(),
                path: marker.rel_path.clone(),
                command: format!("node {target}"),
                confidence: 0.8,
                reason: "package.json bin".to_string(),
                doc_refs: Vec::new(),
            });
        }
        _ => {}
    }
}

fn parse_cargo_toml(
    marker: &MarkerFile,
    text: &str,
    file_paths: &HashSet<&str>,
    entries: &mut Vec<EntryPoint>,
) {
    let Ok(manifest) = text.parse::<toml::Value>() else {
        return;
    };
    let mut declared_bin = false;
    if let Some(bins) = manifest.get("bin").and_then(|b| b.as_array()) {
        for bin in bins {
            if let Some(name) = bin.get("name").and_then(|n| n.as_str()) {
                declared_bin = true;
                entries.push(EntryPoint {
                    id: format!("pkg:{}:{name}", marker.dir),
                    kind: "bin".to_string(),
                    path: marker.rel_path.clone(),
                    command: format!("cargo run --bin {name}"),
                    confidence: 0.8,
                    reason: "Cargo.toml [[bin]]".to_string(),
                    doc_refs: Vec::new(),
                });
            }
        }
    }
    if !declared_bin {
        let main_rs = if marker.dir == "." {
            "src/main.rs".to_string()
        } else {
            format!("{}/src/main.rs", marker.dir)
        };
        if file_paths.contains(main_rs.as_str()) {
            if let Some(name) =
                manifest.get("package").and_then(|p| p.get("name")).and_then(|n| n.as_str())
            {
                entries.push(EntryPoint {
                    id: format!("pkg:{}:{name}", marker.dir),
                    kind: "bin".to_string(),
                    path: marker.rel_path.clone(),
                    command: "cargo run".to_string(),
                    confidence: 0.8,
                    reason: "Cargo.toml src/main.rs".to_string(),
                    doc_refs: Vec::new(),
                });
            }
        }
    }
}

fn detect_test_entry_points(
    modules: &[Module],
    markers: &[MarkerFile],
    file_paths: &HashSet<&str>,
    test_scripts: &HashSet<String>,
) -> Vec<TestEntryPoint> {
    let pytest_dirs: HashSet<&str> = markers
        .iter()
        .filter(|m| m.name == "pytest.ini")
        .map(|m| m.dir.as_str())
        .collect();

    let mut out = Vec::new();
    for module in modules {
        let tests_dir = if module.root == "." {
            "tests".to_string()
        } else {
            format!("{}/tests", module.root)
        };
        let has_tests_dir =
            file_paths.iter().any(|p| p.starts_with(&format!("{tests_dir}/")));
        let paths = if has_tests_dir { vec![tests_dir] } else { Vec::new() };

        let detected: Option<(&str, &str, String)> = match module.kind {
            ModuleKind::Rust => Some(("cargo", "Cargo.toml", "cargo test".to_string())),
            ModuleKind::Go => Some(("go", "go.mod", "go test ./...".to_string())),
            ModuleKind::Node if test_scripts.contains(&module.root) => {
                Some(("npm", "package.json scripts.test", "npm test".to_string()))
            }
            ModuleKind::Python
                if pytest_dirs.contains(module.root.as_str()) || has_tests_dir =>
            {
                Some(("pytest", "pytest marker", "pytest".to_string()))
            }
            _ => None,
        };
        if let Some((framework, reason, command)) = detected {
            out.push(TestEntryPoint {
                id: format!("test:{}:{framework}", module.root),
                kind: framework.to_string(),
                command,
                paths,
                confidence: 0.8,
                reason: reason.to_string(),
            });
        }
    }
    out
}

/// Runs extraction over every eligible file, reusing the previous
/// snapshot's records for files whose size and mtime are unchanged.
fn extract_all(
    ctx: &ServiceContext,
    repo_root: &Path,
    files: &[ScannedFile],
    previous: Option<&Map>,
    options: &BuildOptions,
) -> (Vec<KeySymbol>, Vec<ConfigKey>) {
    let mut prev_symbols: HashMap<&str, Vec<&KeySymbol>> = HashMap::new();
    let mut prev_configs: HashMap<&str, Vec<&ConfigKey>> = HashMap::new();
    if let Some(prev) = previous {
        for symbol in &prev.key_symbols {
            prev_symbols.entry(symbol.path.as_str()).or_default().push(symbol);
        }
        for config in &prev.configs {
            prev_configs.entry(config.path.as_str()).or_default().push(config);
        }
    }

    let mut symbols = Vec::new();
    let mut configs = Vec::new();
    for file in files {
        if !extract::is_extractable(&file.rel_path) {
            continue;
        }
        let reusable = previous
            .and_then(|prev| prev.file_index.get(&file.rel_path))
            .is_some_and(|entry| entry.mtime == file.mtime_ms && entry.size == file.size);
        if reusable {
            // Size+mtime unchanged: reuse prior extraction verbatim
            // without re-reading the file.
            symbols.extend(
                prev_symbols.get(file.rel_path.as_str()).into_iter().flatten().map(|s| (*s).clone()),
            );
            configs.extend(
                prev_configs.get(file.rel_path.as_str()).into_iter().flatten().map(|c| (*c).clone()),
            );
            continue;
        }
        if file.size > options.max_file_bytes {
            log::debug!("skipping oversized file {} ({} bytes)", file.rel_path, file.size);
            continue;
        }
        let Ok(content) = ctx.fs.read_to_string(&repo_root.join(&file.rel_path)) else {
            continue; // unreadable file stays in the index without extraction
        };
        let extraction = extract::extract_file(&file.rel_path, &content);
        symbols.extend(extraction.symbols);
        configs.extend(extraction.configs);
    }
    (symbols, configs)
}

/// Computes the doc-reference completeness audit for a snapshot.
///
/// Counts always reflect the full scan; the sample lists are capped at
/// [`LINK_REPORT_SAMPLE_CAP`].
#[must_use]
pub fn link_report(map: &Map) -> LinkReport {
    let module_missing: Vec<String> = map
        .modules
        .iter()
        .filter(|m| m.doc_refs.is_empty())
        .map(|m| m.id.clone())
        .collect();
    let entry_missing: Vec<String> = map
        .entry_points
        .iter()
        .filter(|e| e.doc_refs.is_empty())
        .map(|e| e.id.clone())
        .collect();
    let symbol_missing: Vec<String> = map
        .key_symbols
        .iter()
        .filter(|s| s.doc_refs.is_empty())
        .map(|s| format!("{}:{}", s.path, s.symbol))
        .collect();

    let counts = LinkCounts {
        modules_missing: module_missing.len(),
        entry_points_missing: entry_missing.len(),
        key_symbols_missing: symbol_missing.len(),
    };
    let cap = |mut v: Vec<String>| {
        v.truncate(LINK_REPORT_SAMPLE_CAP);
        v
    };
    LinkReport {
        schema_version: MAP_SCHEMA_VERSION.to_string(),
        generated_at: map.generated_at,
        map_hash: map.hash.clone(),
        counts,
        missing_doc_refs: MissingDocRefs {
            modules: cap(module_missing),
            entry_points: cap(entry_missing),
            key_symbols: cap(symbol_missing),
        },
    }
}

/// Paths of the artifacts written by [`persist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPaths {
    /// `map.json`
    pub map_json: PathBuf,
    /// `version.json`
    pub version_json: PathBuf,
    /// `link_report.json`
    pub link_report_json: PathBuf,
    /// `link_report.md`
    pub link_report_md: PathBuf,
    /// `diff.json`, when a diff was produced.
    pub diff_json: Option<PathBuf>,
    /// `diff.md`, when a diff was produced.
    pub diff_md: Option<PathBuf>,
}

/// Exclusive advisory lock on a map output directory. Held for the
/// duration of a persist so concurrent builds targeting the same
/// directory serialize instead of interleaving writes.
struct OutDirLock {
    file: std::fs::File,
}

impl OutDirLock {
    fn acquire(out_dir: &Path) -> Result<Self, MapError> {
        let path = out_dir.join(".carto.lock");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| MapError::Lock {
                path: path.display().to_string(),
                detail: e.to_string(),
            })?;
        file.lock_exclusive().map_err(|e| MapError::Lock {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        Ok(Self { file })
    }
}

impl Drop for OutDirLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

/// Persists a build's artifacts into `out_dir`.
///
/// Every artifact is written atomically (temp file, then rename) under
/// an exclusive lock on the output directory, so a crash never leaves a
/// torn file and concurrent builds serialize.
///
/// # Errors
///
/// Returns an error if the lock cannot be acquired or any write fails.
pub fn persist(
    ctx: &ServiceContext,
    out_dir: &Path,
    result: &BuildResult,
) -> Result<PersistedPaths, MapError> {
    ctx.fs.create_dir_all(out_dir).map_err(|e| MapError::Io {
        path: out_dir.display().to_string(),
        detail: e.to_string(),
    })?;
    let _lock = OutDirLock::acquire(out_dir)?;

    let paths = PersistedPaths {
        map_json: out_dir.join("map.json"),
        version_json: out_dir.join("version.json"),
        link_report_json: out_dir.join("link_report.json"),
        link_report_md: out_dir.join("link_report.md"),
        diff_json: result.diff.as_ref().map(|_| out_dir.join("diff.json")),
        diff_md: result.diff.as_ref().map(|_| out_dir.join("diff.md")),
    };

    let mut version = result.version.clone();
    version.map_path = paths.map_json.display().to_string();
    version.link_report_path = paths.link_report_json.display().to_string();

    write_json(ctx, &paths.map_json, &result.map)?;
    write_json(ctx, &paths.version_json, &version)?;
    write_json(ctx, &paths.link_report_json, &result.link_report)?;
    write_text(ctx, &paths.link_report_md, &render_link_report_md(&result.link_report))?;
    if let Some(diff) = &result.diff {
        if let (Some(diff_json), Some(diff_md)) = (&paths.diff_json, &paths.diff_md) {
            write_json(ctx, diff_json, diff)?;
            write_text(ctx, diff_md, &render_markdown(diff))?;
        }
    }
    Ok(paths)
}

fn write_json<T: serde::Serialize>(
    ctx: &ServiceContext,
    path: &Path,
    value: &T,
) -> Result<(), MapError> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    write_text(ctx, path, &text)
}

fn write_text(ctx: &ServiceContext, path: &Path, text: &str) -> Result<(), MapError> {
    ctx.fs.write_atomic(path, text).map_err(|e| MapError::Io {
        path: path.display().to_string(),
        detail: e.to_string(),
    })
}

/// Formats a link report for the Markdown rendition.
#[must_use]
pub fn render_link_report_md(report: &LinkReport) -> String {
    let mut lines = vec![
        "# Link report".to_string(),
        String::new(),
        format!("Map: `{}`", report.map_hash),
        String::new(),
        format!("- modules missing doc refs: {}", report.counts.modules_missing),
        format!("- entry points missing doc refs: {}", report.counts.entry_points_missing),
        format!("- key symbols missing doc refs: {}", report.counts.key_symbols_missing),
        String::new(),
    ];
    for (label, items) in [
        ("Modules", &report.missing_doc_refs.modules),
        ("Entry points", &report.missing_doc_refs.entry_points),
        ("Key symbols", &report.missing_doc_refs.key_symbols),
    ] {
        if !items.is_empty() {
            lines.push(format!("## {label} (sample)"));
            for item in items {
                lines.push(format!("- {item}"));
            }
            lines.push(String::new());
        }
    }
    lines.join("\n")
}
