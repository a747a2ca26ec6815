//! Integration tests for top-level CLI behavior.

use std::path::Path;
use std::process::Command;

fn run_carto(dir: &Path, args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_carto");
    Command::new(bin)
        .current_dir(dir)
        .args(args)
        .output()
        .expect("failed to run carto binary")
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

/// Scaffolds a small repository with one node module, docs, and the
/// context assets a render needs.
fn scaffold(root: &Path) {
    write(
        root,
        "package.json",
        r#"{"name":"gateway","scripts":{"start":"node src/index.js","test":"jest"}}"#,
    );
    write(root, "src/index.js", "export function gateway(req) {}\n");
    write(root, "README.md", "Entry point: `src/index.js`.\n");
    write(root, ".env", "PORT=8080\n");

    let standards = "# Coding standards\n";
    write(root, "context/standards.md", standards);
    write(root, "context/legal_prefix.txt", "All output is reviewed before merge.\n");
    write(
        root,
        "context/refs_index.json",
        &format!(
            r#"{{"schema_version":"refs_index/1","refs":[{{"id":"standards","path":"context/standards.md","hash":"{}","version":"3","scope":["*"]}}]}}"#,
            sha256_hex(standards.as_bytes())
        ),
    );
    write(
        root,
        "context/roles/builder.policy.json",
        r#"{"schema_version":"role_policy/1","role":"builder","context_mode":"strict","capabilities":["edit"]}"#,
    );
    write(root, "board/tasks/T-1.json", r#"{"id":"T-1","title":"Ship it","lane":"doing"}"#);
    write(root, "tasks/T-1/pins.json", r#"{"node":"22.1.0"}"#);
    write(root, "tasks/T-1/preflight.json", r#"{"checks":["lint"]}"#);
}

#[test]
fn map_builds_and_persists_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    scaffold(dir.path());

    let output = run_carto(dir.path(), &["map"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Map generated"));
    assert!(dir.path().join("map/map.json").exists());
    assert!(dir.path().join("map/version.json").exists());
    assert!(dir.path().join("map/link_report.json").exists());
    assert!(dir.path().join("map/link_report.md").exists());
}

#[test]
fn second_incremental_map_reports_no_changes() {
    let dir = tempfile::tempdir().unwrap();
    scaffold(dir.path());

    assert!(run_carto(dir.path(), &["map"]).status.success());
    let output = run_carto(dir.path(), &["map"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("No observable changes"));
    assert!(dir.path().join("map/diff.json").exists());
}

#[test]
fn query_returns_ranked_hits() {
    let dir = tempfile::tempdir().unwrap();
    scaffold(dir.path());
    assert!(run_carto(dir.path(), &["map"]).status.success());

    let output = run_carto(dir.path(), &["query", "gateway"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("src/index.js:gateway"));

    let output = run_carto(dir.path(), &["query", "   "]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing_query"));
}

#[test]
fn render_then_validate_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    scaffold(dir.path());

    let output = run_carto(dir.path(), &["render", "--task", "T-1", "--role", "builder"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let run_id = stdout
        .lines()
        .find_map(|l| l.strip_prefix("run "))
        .expect("render output names the run id")
        .trim()
        .to_string();
    assert!(dir
        .path()
        .join(format!("runs/{run_id}/rendered_context_pack.json"))
        .exists());
    assert!(dir.path().join(format!("runs/{run_id}/task_bundle/manifest.json")).exists());

    let output = run_carto(dir.path(), &["validate", "--run", &run_id]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Pack valid"));

    // Tampering with the pinned asset must fail validation afterwards.
    write(dir.path(), "context/standards.md", "# Coding standards (edited)\n");
    let output = run_carto(dir.path(), &["validate", "--run", &run_id]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("REF_HASH_MISMATCH"));
}

#[test]
fn render_fails_cleanly_without_legal_prefix() {
    let dir = tempfile::tempdir().unwrap();
    scaffold(dir.path());
    std::fs::remove_file(dir.path().join("context/legal_prefix.txt")).unwrap();

    let output = run_carto(dir.path(), &["render", "--task", "T-1", "--role", "builder"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("legal_prefix_missing_or_unreadable"));
}

#[test]
fn render_reports_unknown_task() {
    let dir = tempfile::tempdir().unwrap();
    scaffold(dir.path());

    let output = run_carto(dir.path(), &["render", "--task", "T-404", "--role", "builder"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("task_not_found"));
}

#[test]
fn validate_requires_a_target() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_carto(dir.path(), &["validate"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--run") || stderr.contains("--pack"));
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_carto(dir.path(), &["nonsense"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}
