//! Ranked lookup over a map snapshot.
//!
//! Scoring is lexical: each whitespace-separated token is matched
//! case-insensitively against each of an entity's searchable fields
//! (exact 6.0, prefix 4.0, substring 2.0), summed across tokens and
//! fields, plus a one-time kind offset so structural entities outrank
//! leaf records at equal lexical relevance.

use super::{Map, MapError};

/// Hard ceiling on results regardless of the requested limit.
pub const MAX_RESULTS: usize = 200;

const EXACT: f64 = 6.0;
const PREFIX: f64 = 4.0;
const SUBSTRING: f64 = 2.0;
/// Kind offset for modules and entry points.
const STRUCTURAL_OFFSET: f64 = 0.2;
/// Kind offset for key symbols, configs, and test entry points.
const LEAF_OFFSET: f64 = 0.1;

/// One ranked query result.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct QueryHit {
    /// Entity category (`module`, `entry_point`, `key_symbol`,
    /// `config`, `test_entry_point`).
    pub kind: &'static str,
    /// Entity id (config keys use `cfg:<key>`).
    pub id: String,
    /// Source path for tie-breaking and display.
    pub path: String,
    /// Relevance score.
    pub score: f64,
}

struct Candidate<'a> {
    kind: &'static str,
    id: String,
    path: String,
    fields: Vec<&'a str>,
    offset: f64,
}

/// Runs a ranked query over a snapshot.
///
/// Results are sorted by score descending, ties broken by `(path, id)`
/// ascending, and capped at `min(MAX_RESULTS, max(1, limit))`.
///
/// # Errors
///
/// Returns [`MapError::MissingQuery`] when `q` is empty after trimming.
pub fn query(map: &Map, q: &str, limit: usize) -> Result<Vec<QueryHit>, MapError> {
    let tokens: Vec<String> = q.split_whitespace().map(str::to_lowercase).collect();
    if tokens.is_empty() {
        return Err(MapError::MissingQuery);
    }

    let mut candidates: Vec<Candidate<'_>> = Vec::new();
    for module in &map.modules {
        candidates.push(Candidate {
            kind: "module",
            id: module.id.clone(),
            path: module.root.clone(),
            fields: vec![&module.id, &module.root],
            offset: STRUCTURAL_OFFSET,
        });
    }
    for entry in &map.entry_points {
        candidates.push(Candidate {
            kind: "entry_point",
            id: entry.id.clone(),
            path: entry.path.clone(),
            fields: vec![&entry.id, &entry.command, &entry.path],
            offset: STRUCTURAL_OFFSET,
        });
    }
    for symbol in &map.key_symbols {
        candidates.push(Candidate {
            kind: "key_symbol",
            id: format!("{}:{}", symbol.path, symbol.symbol),
            path: symbol.path.clone(),
            fields: vec![&symbol.symbol, &symbol.path],
            offset: LEAF_OFFSET,
        });
    }
    for config in &map.configs {
        candidates.push(Candidate {
            kind: "config",
            id: format!("cfg:{}", config.key),
            path: config.path.clone(),
            fields: vec![&config.key, &config.path],
            offset: LEAF_OFFSET,
        });
    }
    for test in &map.test_entry_points {
        candidates.push(Candidate {
            kind: "test_entry_point",
            id: test.id.clone(),
            path: test.paths.first().cloned().unwrap_or_default(),
            fields: vec![&test.id, &test.command],
            offset: LEAF_OFFSET,
        });
    }

    let mut hits: Vec<QueryHit> = candidates
        .into_iter()
        .filter_map(|c| {
            let lexical: f64 = tokens.iter().map(|t| fields_score(t, &c.fields)).sum();
            (lexical > 0.0).then(|| QueryHit {
                kind: c.kind,
                id: c.id,
                path: c.path,
                score: lexical + c.offset,
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.id.cmp(&b.id))
    });
    hits.truncate(MAX_RESULTS.min(limit.max(1)));
    Ok(hits)
}

/// Score of one lowercased token summed across an entity's fields.
fn fields_score(token: &str, fields: &[&str]) -> f64 {
    let mut total = 0.0_f64;
    for field in fields {
        let field = field.to_lowercase();
        total += if field == token {
            EXACT
        } else if field.starts_with(token) {
            PREFIX
        } else if field.contains(token) {
            SUBSTRING
        } else {
            0.0
        };
    }
    total
}
