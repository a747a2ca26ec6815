//! The render pipeline: assemble, hash, and persist a context pack.
//!
//! Rendering is sequential and fail-fast: legal prefix, binding refs,
//! role capsule, task bundle, then assembly and persistence. Every run
//! owns a fresh run directory; a run id is never reused.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use super::bundle::{self, TaskBundle};
use super::refs;
use super::role;
use super::{pack_hash, ContextPack, RenderError, Slot, PACK_SCHEMA_VERSION, SLOT_KINDS};
use crate::context::ServiceContext;
use crate::hash;

/// Location of the legal prefix, relative to the repo root.
pub const LEGAL_PREFIX_PATH: &str = "context/legal_prefix.txt";

/// Inputs for one render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Board task to bundle.
    pub task_id: String,
    /// Role whose policy shapes the capsule.
    pub role: String,
    /// Context mode, also used for ref scoping.
    pub mode: String,
    /// Token budget recorded in the pack.
    pub budget_tokens: u64,
}

/// A successful render: the pack plus where it was persisted.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// The assembled pack.
    pub pack: ContextPack,
    /// Run directory owning all artifacts.
    pub run_dir: PathBuf,
    /// Path of `rendered_context_pack.json`.
    pub pack_path: PathBuf,
    /// Path of `rendered_context_pack.txt`.
    pub txt_path: PathBuf,
}

/// Resolves the run directory for a run id.
#[must_use]
pub fn run_dir(runs_root: &Path, run_id: &str) -> PathBuf {
    runs_root.join(run_id)
}

/// Resolves the primary pack artifact for a run id.
#[must_use]
pub fn pack_path(runs_root: &Path, run_id: &str) -> PathBuf {
    run_dir(runs_root, run_id).join("rendered_context_pack.json")
}

/// Renders a context pack for `request` into a fresh run directory
/// under `runs_root`.
///
/// # Errors
///
/// Fails with a coded [`RenderError`] at the first pipeline stage that
/// cannot complete; nothing is persisted on failure before the
/// assembly stage.
pub fn render(
    ctx: &ServiceContext,
    repo_root: &Path,
    runs_root: &Path,
    request: &RenderRequest,
) -> Result<RenderOutcome, RenderError> {
    let created_at = ctx.clock.now();
    let suffix: String = ctx.id_gen.generate_id().chars().take(8).collect();
    let run_id = format!("{}-{suffix}", created_at.format("%Y%m%dT%H%M%S%3fZ"));

    let dir = run_dir(runs_root, &run_id);
    if ctx.fs.exists(&dir) {
        return Err(RenderError::RunDirExists { path: dir.display().to_string() });
    }
    log::info!("rendering pack for task {} as role {} (run {run_id})", request.task_id, request.role);

    let legal_text = ctx
        .fs
        .read_to_string(&repo_root.join(LEGAL_PREFIX_PATH))
        .map_err(|e| RenderError::LegalPrefix { detail: e.to_string() })?;

    let index = refs::load(ctx, repo_root)?;
    let selected = refs::select(&index, &request.role, &request.mode);
    refs::verify_all(ctx, repo_root, &selected)?;

    let capsule = role::load_capsule(ctx, repo_root, &request.role)?;
    let task_bundle = bundle::load(ctx, repo_root, &request.task_id)?;

    let bodies: [Option<Value>; 7] = [
        Some(json!({ "text": legal_text })),
        Some(json!({ "refs": selected })),
        Some(capsule),
        Some(serde_json::to_value(&task_bundle)?),
        None,
        None,
        None,
    ];
    let slots: Vec<Slot> = SLOT_KINDS
        .iter()
        .zip(bodies)
        .enumerate()
        .map(|(index, (kind, body))| Slot { index, kind: (*kind).to_string(), body })
        .collect();

    let mut pack = ContextPack {
        schema_version: PACK_SCHEMA_VERSION.to_string(),
        context_pack_id: format!("cp-{run_id}"),
        run_id: run_id.clone(),
        created_at,
        mode: request.mode.clone(),
        budget_tokens: request.budget_tokens,
        slots,
        hash: String::new(),
    };
    pack.hash = pack_hash(&serde_json::to_value(&pack)?)?;

    persist(ctx, repo_root, &dir, request, &pack, &task_bundle)
}

fn persist(
    ctx: &ServiceContext,
    repo_root: &Path,
    dir: &Path,
    request: &RenderRequest,
    pack: &ContextPack,
    task_bundle: &TaskBundle,
) -> Result<RenderOutcome, RenderError> {
    let io_err = |path: &Path| {
        let path = path.display().to_string();
        move |e: crate::ports::PortError| RenderError::Io { path, detail: e.to_string() }
    };

    let bundle_dir = dir.join("task_bundle");
    ctx.fs.create_dir_all(&bundle_dir).map_err(io_err(&bundle_dir))?;

    let pack_file = dir.join("rendered_context_pack.json");
    let txt_file = dir.join("rendered_context_pack.txt");
    let meta_file = dir.join("meta.json");

    write_json(ctx, &pack_file, pack)?;
    ctx.fs
        .write_atomic(&txt_file, &render_text(pack))
        .map_err(io_err(&txt_file))?;

    let manifest = copy_bundle(ctx, repo_root, &bundle_dir, request, task_bundle)?;
    write_json(ctx, &bundle_dir.join("manifest.json"), &manifest)?;

    let meta = json!({
        "task_id": request.task_id,
        "role": request.role,
        "mode": request.mode,
        "budget_tokens": request.budget_tokens,
        "run_id": pack.run_id,
        "created_at": pack.created_at,
        "hash": pack.hash,
        "pack_path": pack_file.display().to_string(),
        "txt_path": txt_file.display().to_string(),
    });
    write_json(ctx, &meta_file, &meta)?;

    Ok(RenderOutcome {
        pack: pack.clone(),
        run_dir: dir.to_path_buf(),
        pack_path: pack_file,
        txt_path: txt_file,
    })
}

/// Copies task artifacts into the run's `task_bundle/` directory and
/// returns the manifest. Copies are best-effort: a failed copy leaves
/// the file absent from the manifest rather than failing the render.
fn copy_bundle(
    ctx: &ServiceContext,
    repo_root: &Path,
    bundle_dir: &Path,
    request: &RenderRequest,
    task_bundle: &TaskBundle,
) -> Result<Value, RenderError> {
    let mut entries: Vec<Value> = Vec::new();
    let mut record = |ctx: &ServiceContext, name: &str, text: &str| {
        let target = bundle_dir.join(name);
        match ctx.fs.write_atomic(&target, text) {
            Ok(()) => entries.push(json!({
                "name": name,
                "path": target.display().to_string(),
                "sha256": hash::hash_bytes(text.as_bytes()),
            })),
            Err(e) => log::warn!("bundle copy of {name} failed: {e}"),
        }
    };

    if let Some(task) = &task_bundle.task {
        let mut text = serde_json::to_string_pretty(task)?;
        text.push('\n');
        record(ctx, "task.json", &text);
    }
    let source_dir = bundle::task_dir(repo_root, &request.task_id);
    for name in [bundle::PINS_FILE, bundle::PREFLIGHT_FILE, bundle::REPLAY_FILE] {
        if let Ok(text) = ctx.fs.read_to_string(&source_dir.join(name)) {
            record(ctx, name, &text);
        }
    }
    Ok(json!({ "files": entries }))
}

fn write_json<T: serde::Serialize>(
    ctx: &ServiceContext,
    path: &Path,
    value: &T,
) -> Result<(), RenderError> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    ctx.fs.write_atomic(path, &text).map_err(|e| RenderError::Io {
        path: path.display().to_string(),
        detail: e.to_string(),
    })
}

/// Plain-text rendition: slots in order, each under a header line.
#[must_use]
pub fn render_text(pack: &ContextPack) -> String {
    let mut out = String::new();
    for slot in &pack.slots {
        out.push_str(&format!("=== [{}] {} ===\n", slot.index, slot.kind));
        match &slot.body {
            Some(body) if slot.kind == "LEGAL_PREFIX" => {
                let text = body.get("text").and_then(Value::as_str).unwrap_or_default();
                out.push_str(text);
                if !text.ends_with('\n') {
                    out.push('\n');
                }
            }
            Some(body) => {
                out.push_str(&serde_json::to_string_pretty(body).unwrap_or_default());
                out.push('\n');
            }
            None => out.push_str("(reserved)\n"),
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{mem_context, MemFs};
    use crate::pack::{REFS_SCHEMA_VERSION, ROLE_SCHEMA_VERSION};
    use crate::ports::tasks::BoardTask;
    use pretty_assertions::assert_eq;

    fn request() -> RenderRequest {
        RenderRequest {
            task_id: "T-1".to_string(),
            role: "builder".to_string(),
            mode: "strict".to_string(),
            budget_tokens: 12_000,
        }
    }

    fn seed_repo(fs: &MemFs) {
        fs.seed("/repo/context/legal_prefix.txt", "All output is reviewed.\n");
        let doc = "# Coding standards\n";
        fs.seed("/repo/context/standards.md", doc);
        fs.seed(
            "/repo/context/refs_index.json",
            &serde_json::to_string(&serde_json::json!({
                "schema_version": REFS_SCHEMA_VERSION,
                "refs": [{
                    "id": "standards",
                    "path": "context/standards.md",
                    "hash": hash::hash_bytes(doc.as_bytes()),
                    "version": "3",
                    "scope": ["*"],
                }]
            }))
            .unwrap(),
        );
        fs.seed(
            "/repo/context/roles/builder.policy.json",
            &format!(
                r#"{{"schema_version": "{ROLE_SCHEMA_VERSION}", "role": "builder", "context_mode": "strict", "capabilities": ["edit"]}}"#
            ),
        );
        fs.seed("/repo/tasks/T-1/pins.json", r#"{"node": "22.1.0"}"#);
        fs.seed("/repo/tasks/T-1/preflight.json", r#"{"checks": []}"#);
    }

    fn board_task() -> BoardTask {
        BoardTask {
            id: "T-1".to_string(),
            title: "Ship it".to_string(),
            lane: "doing".to_string(),
            role: Some("builder".to_string()),
            extra: serde_json::Map::new(),
        }
    }

    fn render_ok(fs: MemFs) -> (crate::context::ServiceContext, RenderOutcome) {
        let ctx = mem_context(fs, vec![board_task()]);
        let outcome =
            render(&ctx, Path::new("/repo"), Path::new("/repo/runs"), &request()).unwrap();
        (ctx, outcome)
    }

    #[test]
    fn renders_all_seven_slots_with_a_verifiable_hash() {
        let fs = MemFs::new();
        seed_repo(&fs);
        let (_ctx, outcome) = render_ok(fs);
        let pack = &outcome.pack;

        assert_eq!(pack.slots.len(), 7);
        let kinds: Vec<&str> = pack.slots.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, SLOT_KINDS.to_vec());
        assert!(pack.slots[0].body.is_some());
        assert!(pack.slots[4].body.is_none());

        let value = serde_json::to_value(pack).unwrap();
        assert_eq!(pack_hash(&value).unwrap(), pack.hash);
        assert_eq!(pack.context_pack_id, format!("cp-{}", pack.run_id));
    }

    #[test]
    fn run_id_combines_timestamp_and_id_suffix() {
        // FixedClock 2026-01-15T12:00:00Z, SequentialIdGenerator id-00000000.
        let fs = MemFs::new();
        seed_repo(&fs);
        let (_ctx, outcome) = render_ok(fs);
        assert_eq!(outcome.pack.run_id, "20260115T120000000Z-id-00000");
        assert_eq!(outcome.run_dir, Path::new("/repo/runs/20260115T120000000Z-id-00000"));
    }

    #[test]
    fn persists_pack_text_meta_and_bundle_manifest() {
        let fs = MemFs::new();
        seed_repo(&fs);
        let (ctx, outcome) = render_ok(fs);

        let pack_text = ctx.fs.read_to_string(&outcome.pack_path).unwrap();
        assert!(pack_text.ends_with('\n'));
        let reloaded: ContextPack = serde_json::from_str(&pack_text).unwrap();
        assert_eq!(reloaded.hash, outcome.pack.hash);

        let txt = ctx.fs.read_to_string(&outcome.txt_path).unwrap();
        assert!(txt.starts_with("=== [0] LEGAL_PREFIX ===\nAll output is reviewed."));
        assert!(txt.contains("=== [6] OPTIONAL_CONTEXT ===\n(reserved)"));

        let manifest: serde_json::Value = serde_json::from_str(
            &ctx.fs.read_to_string(&outcome.run_dir.join("task_bundle/manifest.json")).unwrap(),
        )
        .unwrap();
        let names: Vec<&str> = manifest["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["task.json", "pins.json", "preflight.json"]);
        let pins = ctx.fs.read_to_string(&outcome.run_dir.join("task_bundle/pins.json")).unwrap();
        assert_eq!(manifest["files"][1]["sha256"], hash::hash_bytes(pins.as_bytes()));

        let meta: serde_json::Value = serde_json::from_str(
            &ctx.fs.read_to_string(&outcome.run_dir.join("meta.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(meta["task_id"], "T-1");
        assert_eq!(meta["hash"], outcome.pack.hash);
    }

    #[test]
    fn missing_legal_prefix_fails_first() {
        let fs = MemFs::new();
        seed_repo(&fs);
        fs.remove("/repo/context/legal_prefix.txt");
        // Also break a ref: the prefix failure must win, it is checked first.
        fs.seed("/repo/context/standards.md", "tampered\n");
        let ctx = mem_context(fs, vec![board_task()]);
        let err =
            render(&ctx, Path::new("/repo"), Path::new("/repo/runs"), &request()).unwrap_err();
        assert_eq!(err.code(), "legal_prefix_missing_or_unreadable");
    }

    #[test]
    fn tampered_ref_fails_with_integrity_code() {
        let fs = MemFs::new();
        seed_repo(&fs);
        fs.seed("/repo/context/standards.md", "# Coding standards (edited)\n");
        let ctx = mem_context(fs, vec![board_task()]);
        let err =
            render(&ctx, Path::new("/repo"), Path::new("/repo/runs"), &request()).unwrap_err();
        assert_eq!(err.code(), "refs_integrity_failed");
    }

    #[test]
    fn missing_task_artifact_fails_with_bundle_code() {
        let fs = MemFs::new();
        seed_repo(&fs);
        fs.remove("/repo/tasks/T-1/preflight.json");
        let ctx = mem_context(fs, vec![board_task()]);
        let err =
            render(&ctx, Path::new("/repo"), Path::new("/repo/runs"), &request()).unwrap_err();
        assert_eq!(err.code(), "task_bundle_incomplete");
    }

    #[test]
    fn existing_run_directory_is_never_reused() {
        let fs = MemFs::new();
        seed_repo(&fs);
        fs.seed("/repo/runs/20260115T120000000Z-id-00000/meta.json", "{}");
        let ctx = mem_context(fs, vec![board_task()]);
        let err =
            render(&ctx, Path::new("/repo"), Path::new("/repo/runs"), &request()).unwrap_err();
        assert_eq!(err.code(), "run_dir_exists");
    }
}
