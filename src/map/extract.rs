//! Per-extension symbol and configuration-key extraction.
//!
//! Extraction is line-oriented pattern matching, one pass per line, no
//! parsing. Each supported extension maps to a strategy variant; every
//! match yields a record with a fixed confidence and, for symbols, a
//! ±3-line window around the declaration.

use super::{ConfigKey, KeySymbol, SymbolKind};

/// Supported source-file extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    /// `.rs`
    Rust,
    /// `.py`
    Python,
    /// `.js`, `.jsx`, `.mjs`, `.cjs`
    JavaScript,
    /// `.ts`, `.tsx`
    TypeScript,
    /// `.go`
    Go,
}

impl Extension {
    /// Selects the extraction strategy for a path, if any.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        // Path::extension, so a dotless file named `go` or `rs` is not
        // mistaken for source.
        let ext = std::path::Path::new(path).extension()?.to_str()?;
        match ext {
            "rs" => Some(Self::Rust),
            "py" => Some(Self::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "tsx" => Some(Self::TypeScript),
            "go" => Some(Self::Go),
            _ => None,
        }
    }
}

/// Returns `true` for `.env`-style files (config keys only).
#[must_use]
pub fn is_env_file(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    name == ".env" || name.starts_with(".env.")
}

/// Returns `true` if the file participates in extraction at all.
#[must_use]
pub fn is_extractable(path: &str) -> bool {
    Extension::from_path(path).is_some() || is_env_file(path)
}

/// Records extracted from one file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Extraction {
    /// Declared symbols.
    pub symbols: Vec<KeySymbol>,
    /// Environment-style configuration keys.
    pub configs: Vec<ConfigKey>,
}

/// Extracts symbols and config keys from one file's content.
#[must_use]
pub fn extract_file(rel_path: &str, content: &str) -> Extraction {
    let mut out = Extraction::default();
    if let Some(extension) = Extension::from_path(rel_path) {
        for (idx, raw) in content.lines().enumerate() {
            let line = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            let trimmed = raw.trim();
            if trimmed.starts_with("//") || trimmed.starts_with('#') {
                continue;
            }
            match extension {
                Extension::Rust => extract_rust_line(rel_path, trimmed, line, &mut out),
                Extension::Python => extract_python_line(rel_path, trimmed, line, &mut out),
                Extension::JavaScript => {
                    extract_js_line(rel_path, trimmed, line, false, &mut out);
                }
                Extension::TypeScript => {
                    extract_js_line(rel_path, trimmed, line, true, &mut out);
                }
                Extension::Go => extract_go_line(rel_path, trimmed, line, &mut out),
            }
        }
    } else if is_env_file(rel_path) {
        extract_dotenv(rel_path, content, &mut out);
    }
    out
}

const DECLARED_CONFIDENCE: f64 = 0.75;
const HEURISTIC_CONFIDENCE: f64 = 0.7;
const CONFIG_CONFIDENCE: f64 = 0.7;

fn push_symbol(
    out: &mut Extraction,
    path: &str,
    name: &str,
    kind: SymbolKind,
    line: u32,
    confidence: f64,
) {
    if name.is_empty() {
        return;
    }
    out.symbols.push(KeySymbol {
        symbol: name.to_string(),
        kind,
        path: path.to_string(),
        line,
        line_window: [line.saturating_sub(3).max(1), line.saturating_add(3)],
        confidence,
        doc_refs: Vec::new(),
    });
}

fn push_config(out: &mut Extraction, path: &str, key: &str, line: u32, reason: &str) {
    if key.is_empty() {
        return;
    }
    out.configs.push(ConfigKey {
        key: key.to_string(),
        path: path.to_string(),
        line,
        confidence: CONFIG_CONFIDENCE,
        reason: reason.to_string(),
    });
}

/// Leading identifier (`[A-Za-z_][A-Za-z0-9_]*`) of `s`, if any.
fn leading_ident(s: &str) -> Option<&str> {
    let mut end = 0;
    for (i, c) in s.char_indices() {
        let ok = c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit());
        if !ok {
            break;
        }
        end = i + c.len_utf8();
    }
    if end == 0 {
        None
    } else {
        Some(&s[..end])
    }
}

/// First single- or double-quoted token in `s`, if any.
fn first_quoted(s: &str) -> Option<&str> {
    let open = s.find(['"', '\''])?;
    let quote = s.as_bytes()[open] as char;
    let rest = &s[open + 1..];
    let close = rest.find(quote)?;
    let token = &rest[..close];
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn extract_rust_line(path: &str, line_text: &str, line: u32, out: &mut Extraction) {
    let rules: [(&str, SymbolKind, f64); 14] = [
        ("pub fn ", SymbolKind::Function, DECLARED_CONFIDENCE),
        ("fn ", SymbolKind::Function, HEURISTIC_CONFIDENCE),
        ("pub struct ", SymbolKind::Struct, DECLARED_CONFIDENCE),
        ("struct ", SymbolKind::Struct, HEURISTIC_CONFIDENCE),
        ("pub enum ", SymbolKind::Type, DECLARED_CONFIDENCE),
        ("enum ", SymbolKind::Type, HEURISTIC_CONFIDENCE),
        ("pub trait ", SymbolKind::Type, DECLARED_CONFIDENCE),
        ("trait ", SymbolKind::Type, HEURISTIC_CONFIDENCE),
        ("pub type ", SymbolKind::Type, DECLARED_CONFIDENCE),
        ("type ", SymbolKind::Type, HEURISTIC_CONFIDENCE),
        ("pub const ", SymbolKind::Const, DECLARED_CONFIDENCE),
        ("const ", SymbolKind::Const, HEURISTIC_CONFIDENCE),
        ("pub static ", SymbolKind::Const, DECLARED_CONFIDENCE),
        ("static ", SymbolKind::Const, HEURISTIC_CONFIDENCE),
    ];
    for (prefix, kind, confidence) in rules {
        if let Some(rest) = line_text.strip_prefix(prefix) {
            if let Some(name) = leading_ident(rest) {
                push_symbol(out, path, name, kind, line, confidence);
            }
            break; // one match per line
        }
    }
    if let Some(pos) = line_text.find("env::var(") {
        if let Some(key) = first_quoted(&line_text[pos..]) {
            push_config(out, path, key, line, "rust:env::var");
        }
    }
}

fn extract_python_line(path: &str, line_text: &str, line: u32, out: &mut Extraction) {
    if let Some(rest) =
        line_text.strip_prefix("def ").or_else(|| line_text.strip_prefix("async def "))
    {
        if let Some(name) = leading_ident(rest) {
            push_symbol(out, path, name, SymbolKind::Function, line, HEURISTIC_CONFIDENCE);
        }
    } else if let Some(rest) = line_text.strip_prefix("class ") {
        if let Some(name) = leading_ident(rest) {
            push_symbol(out, path, name, SymbolKind::Class, line, HEURISTIC_CONFIDENCE);
        }
    }
    for (needle, reason) in [
        ("os.environ[", "python:os.environ"),
        ("os.environ.get(", "python:os.environ.get"),
        ("os.getenv(", "python:os.getenv"),
    ] {
        if let Some(pos) = line_text.find(needle) {
            if let Some(key) = first_quoted(&line_text[pos..]) {
                push_config(out, path, key, line, reason);
            }
            break;
        }
    }
}

fn extract_js_line(path: &str, line_text: &str, line: u32, typescript: bool, out: &mut Extraction) {
    let (exported, body) = match line_text.strip_prefix("export ") {
        Some(rest) => (true, rest.strip_prefix("default ").unwrap_or(rest)),
        None => (false, line_text),
    };
    let confidence = if exported { DECLARED_CONFIDENCE } else { HEURISTIC_CONFIDENCE };

    let stripped = body.strip_prefix("async ").unwrap_or(body);
    if let Some(rest) = stripped.strip_prefix("function ") {
        if let Some(name) = leading_ident(rest) {
            push_symbol(out, path, name, SymbolKind::Function, line, confidence);
        }
    } else if let Some(rest) = body.strip_prefix("class ") {
        if let Some(name) = leading_ident(rest) {
            push_symbol(out, path, name, SymbolKind::Class, line, confidence);
        }
    } else if let Some(rest) = body.strip_prefix("const ") {
        if let Some(name) = leading_ident(rest) {
            push_symbol(out, path, name, SymbolKind::Const, line, confidence);
        }
    } else if typescript {
        if let Some(rest) = body.strip_prefix("interface ") {
            if let Some(name) = leading_ident(rest) {
                push_symbol(out, path, name, SymbolKind::Type, line, confidence);
            }
        } else if let Some(rest) = body.strip_prefix("type ") {
            if let Some(name) = leading_ident(rest) {
                push_symbol(out, path, name, SymbolKind::Type, line, confidence);
            }
        } else if let Some(rest) = body.strip_prefix("enum ") {
            if let Some(name) = leading_ident(rest) {
                push_symbol(out, path, name, SymbolKind::Type, line, confidence);
            }
        }
    }

    for (needle, reason) in
        [("process.env.", "js:process.env"), ("import.meta.env.", "js:import.meta.env")]
    {
        if let Some(pos) = line_text.find(needle) {
            if let Some(key) = leading_ident(&line_text[pos + needle.len()..]) {
                push_config(out, path, key, line, reason);
            }
            break;
        }
    }
}

fn extract_go_line(path: &str, line_text: &str, line: u32, out: &mut Extraction) {
    if let Some(rest) = line_text.strip_prefix("func ") {
        // Method receivers: `func (r *Repo) Name(...)`.
        let rest = if let Some(after) = rest.strip_prefix('(') {
            after.find(')').map_or("", |i| after[i + 1..].trim_start())
        } else {
            rest
        };
        if let Some(name) = leading_ident(rest) {
            push_symbol(out, path, name, SymbolKind::Function, line, HEURISTIC_CONFIDENCE);
        }
    } else if let Some(rest) = line_text.strip_prefix("type ") {
        if let Some(name) = leading_ident(rest) {
            let kind = if rest[name.len()..].trim_start().starts_with("struct") {
                SymbolKind::Struct
            } else {
                SymbolKind::Type
            };
            push_symbol(out, path, name, kind, line, HEURISTIC_CONFIDENCE);
        }
    } else if let Some(rest) = line_text.strip_prefix("const ") {
        if let Some(name) = leading_ident(rest) {
            push_symbol(out, path, name, SymbolKind::Const, line, HEURISTIC_CONFIDENCE);
        }
    }
    if let Some(pos) = line_text.find("os.Getenv(") {
        if let Some(key) = first_quoted(&line_text[pos..]) {
            push_config(out, path, key, line, "go:os.Getenv");
        }
    }
}

fn extract_dotenv(path: &str, content: &str, out: &mut Extraction) {
    for (idx, raw) in content.lines().enumerate() {
        let line = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        let trimmed = raw.trim();
        if trimmed.starts_with('#') {
            continue;
        }
        let Some((key, _)) = trimmed.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let valid = !key.is_empty()
            && key.chars().next().is_some_and(|c| c.is_ascii_uppercase() || c == '_')
            && key.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if valid {
            push_config(out, path, key, line, "dotenv");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn symbols(path: &str, src: &str) -> Vec<(String, SymbolKind, u32)> {
        extract_file(path, src)
            .symbols
            .into_iter()
            .map(|s| (s.symbol, s.kind, s.line))
            .collect()
    }

    #[test]
    fn extension_dispatch_covers_supported_suffixes() {
        assert_eq!(Extension::from_path("a/b.rs"), Some(Extension::Rust));
        assert_eq!(Extension::from_path("a/b.tsx"), Some(Extension::TypeScript));
        assert_eq!(Extension::from_path("a/b.cjs"), Some(Extension::JavaScript));
        assert_eq!(Extension::from_path("a/b.md"), None);
        assert!(is_env_file(".env.local"));
        assert!(!is_env_file("environment.txt"));
    }

    #[test]
    fn dotless_files_named_like_extensions_are_not_source() {
        assert_eq!(Extension::from_path("go"), None);
        assert_eq!(Extension::from_path("scripts/py"), None);
        assert_eq!(Extension::from_path("bin/rs"), None);
        assert_eq!(Extension::from_path(".rs"), None);
    }

    #[test]
    fn rust_declarations_are_extracted() {
        let src = "pub fn gateway() {}\nstruct Inner;\npub trait Store {}\nconst LIMIT: u32 = 1;\n";
        assert_eq!(
            symbols("src/lib.rs", src),
            vec![
                ("gateway".to_string(), SymbolKind::Function, 1),
                ("Inner".to_string(), SymbolKind::Struct, 2),
                ("Store".to_string(), SymbolKind::Type, 3),
                ("LIMIT".to_string(), SymbolKind::Const, 4),
            ]
        );
    }

    #[test]
    fn rust_pub_declarations_get_higher_confidence() {
        let out = extract_file("src/lib.rs", "pub fn a() {}\nfn b() {}\n");
        assert_eq!(out.symbols[0].confidence, 0.75);
        assert_eq!(out.symbols[1].confidence, 0.7);
    }

    #[test]
    fn line_window_is_clamped_at_one() {
        let out = extract_file("src/lib.rs", "fn early() {}\n");
        assert_eq!(out.symbols[0].line_window, [1, 4]);
    }

    #[test]
    fn comments_are_skipped() {
        let src = "// fn ghost() {}\n# not rust anyway\nfn real() {}\n";
        assert_eq!(symbols("src/lib.rs", src), vec![("real".to_string(), SymbolKind::Function, 3)]);
    }

    #[test]
    fn python_defs_classes_and_environ() {
        let src = "class Runner:\n    def start(self):\n        return os.environ.get(\"PORT\")\n";
        let out = extract_file("app.py", src);
        assert_eq!(out.symbols.len(), 2);
        assert_eq!(out.symbols[0].kind, SymbolKind::Class);
        assert_eq!(out.configs.len(), 1);
        assert_eq!(out.configs[0].key, "PORT");
        assert_eq!(out.configs[0].reason, "python:os.environ.get");
    }

    #[test]
    fn javascript_exports_and_process_env() {
        let src = "export function gateway(req) {}\nconst retries = process.env.RETRIES;\n";
        let out = extract_file("src/index.js", src);
        assert_eq!(out.symbols[0].symbol, "gateway");
        assert_eq!(out.symbols[0].confidence, 0.75);
        assert_eq!(out.symbols[1].symbol, "retries");
        assert_eq!(out.configs[0].key, "RETRIES");
    }

    #[test]
    fn typescript_interface_and_type_aliases() {
        let src = "export interface Task {}\ntype Lane = string;\nexport enum Mode { A }\n";
        let out = extract_file("src/types.ts", src);
        let kinds: Vec<SymbolKind> = out.symbols.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SymbolKind::Type, SymbolKind::Type, SymbolKind::Type]);
    }

    #[test]
    fn go_methods_and_getenv() {
        let src = "func (s *Server) Dispatch() {}\ntype Board struct {}\nv := os.Getenv(\"ADDR\")\n";
        let out = extract_file("main.go", src);
        assert_eq!(out.symbols[0].symbol, "Dispatch");
        assert_eq!(out.symbols[1].kind, SymbolKind::Struct);
        assert_eq!(out.configs[0].key, "ADDR");
    }

    #[test]
    fn dotenv_keys_are_config_only() {
        let src = "# comment\nPORT=8080\nlowercase=skip\nDB_URL=postgres://x\n";
        let out = extract_file(".env", src);
        assert!(out.symbols.is_empty());
        let keys: Vec<&str> = out.configs.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["PORT", "DB_URL"]);
        assert_eq!(out.configs[0].line, 2);
    }

    #[test]
    fn rust_env_var_key_is_captured() {
        let out = extract_file("src/main.rs", "let port = std::env::var(\"PORT\")?;\n");
        assert_eq!(out.configs[0].key, "PORT");
        assert_eq!(out.configs[0].reason, "rust:env::var");
    }
}
