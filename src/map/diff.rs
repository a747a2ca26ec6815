//! Facts-level diffing between two map snapshots.
//!
//! The diff is a pure set difference over the facts vectors (module
//! roots, entry point ids, contract ids); scan noise such as mtime
//! churn never appears here.

use chrono::{DateTime, Utc};

use super::{FactsDelta, HashPair, Map, MapDiff, MAP_SCHEMA_VERSION};

/// The observable-truth vectors of one snapshot, deduplicated and
/// sorted. `contracts` are the verification contracts represented by
/// test entry points.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Facts {
    /// Module roots.
    pub modules: Vec<String>,
    /// Entry point ids.
    pub entry_points: Vec<String>,
    /// Contract ids.
    pub contracts: Vec<String>,
}

impl Facts {
    /// Extracts the facts vectors from a snapshot.
    #[must_use]
    pub fn of(map: &Map) -> Self {
        Self {
            modules: dedup_sorted(map.modules.iter().map(|m| m.root.clone())),
            entry_points: dedup_sorted(map.entry_points.iter().map(|e| e.id.clone())),
            contracts: dedup_sorted(map.test_entry_points.iter().map(|t| t.id.clone())),
        }
    }
}

fn dedup_sorted(iter: impl Iterator<Item = String>) -> Vec<String> {
    let mut v: Vec<String> = iter.collect();
    v.sort();
    v.dedup();
    v
}

fn set_difference(a: &[String], b: &[String]) -> Vec<String> {
    a.iter().filter(|x| !b.contains(x)).cloned().collect()
}

/// Computes the facts diff from `previous` to `current`.
#[must_use]
pub fn diff_maps(previous: &Map, current: &Map, generated_at: DateTime<Utc>) -> MapDiff {
    let prev = Facts::of(previous);
    let curr = Facts::of(current);
    MapDiff {
        schema_version: MAP_SCHEMA_VERSION.to_string(),
        generated_at,
        previous: HashPair {
            hash: previous.hash.clone(),
            facts_hash: previous.facts_hash.clone(),
        },
        current: HashPair { hash: current.hash.clone(), facts_hash: current.facts_hash.clone() },
        added: FactsDelta {
            modules: set_difference(&curr.modules, &prev.modules),
            entry_points: set_difference(&curr.entry_points, &prev.entry_points),
            contracts: set_difference(&curr.contracts, &prev.contracts),
        },
        removed: FactsDelta {
            modules: set_difference(&prev.modules, &curr.modules),
            entry_points: set_difference(&prev.entry_points, &curr.entry_points),
            contracts: set_difference(&prev.contracts, &curr.contracts),
        },
    }
}

/// Formats a diff for the Markdown rendition.
#[must_use]
pub fn render_markdown(diff: &MapDiff) -> String {
    let mut lines = vec![
        "# Map diff".to_string(),
        String::new(),
        format!("Previous: `{}` (facts `{}`)", diff.previous.hash, diff.previous.facts_hash),
        format!("Current:  `{}` (facts `{}`)", diff.current.hash, diff.current.facts_hash),
        String::new(),
    ];
    let empty = diff.added.modules.is_empty()
        && diff.added.entry_points.is_empty()
        && diff.added.contracts.is_empty()
        && diff.removed.modules.is_empty()
        && diff.removed.entry_points.is_empty()
        && diff.removed.contracts.is_empty();
    if empty {
        lines.push("No observable changes since the previous snapshot.".to_string());
        lines.push(String::new());
        return lines.join("\n");
    }
    for (label, delta, sign) in
        [("Added", &diff.added, '+'), ("Removed", &diff.removed, '-')]
    {
        for (section, items) in [
            ("modules", &delta.modules),
            ("entry points", &delta.entry_points),
            ("contracts", &delta.contracts),
        ] {
            if !items.is_empty() {
                lines.push(format!("## {label} {section}"));
                for item in items {
                    lines.push(format!("{sign} {item}"));
                }
                lines.push(String::new());
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::engine::tests_support::bare_map;

    #[test]
    fn diff_is_pure_set_difference() {
        let mut prev = bare_map();
        prev.modules = vec![module("a"), module("b")];
        let mut curr = bare_map();
        curr.modules = vec![module("b"), module("c")];

        let d = diff_maps(&prev, &curr, Utc::now());
        assert_eq!(d.added.modules, vec!["c"]);
        assert_eq!(d.removed.modules, vec!["a"]);
        assert!(d.added.entry_points.is_empty());
        assert!(d.removed.contracts.is_empty());
    }

    #[test]
    fn identical_maps_produce_empty_delta_and_clean_markdown() {
        let map = bare_map();
        let d = diff_maps(&map, &map, Utc::now());
        assert_eq!(d.added, FactsDelta::default());
        assert_eq!(d.removed, FactsDelta::default());
        assert!(render_markdown(&d).contains("No observable changes"));
    }

    #[test]
    fn markdown_lists_added_and_removed_facts() {
        let mut prev = bare_map();
        prev.modules = vec![module("legacy")];
        let mut curr = bare_map();
        curr.modules = vec![module("svc")];
        let d = diff_maps(&prev, &curr, Utc::now());
        let md = render_markdown(&d);
        assert!(md.contains("+ svc"));
        assert!(md.contains("- legacy"));
    }

    fn module(root: &str) -> crate::map::Module {
        crate::map::Module {
            id: format!("mod:{root}"),
            root: root.to_string(),
            kind: crate::map::ModuleKind::Generic,
            confidence: 0.9,
            signals: vec![],
            doc_refs: vec![],
        }
    }
}
