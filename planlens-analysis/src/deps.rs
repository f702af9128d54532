//! Dependency Extractor — direct-neighbor graph lookups.
//!
//! Single-hop only: `depends_on` comes straight from plan declarations plus
//! the parser's forward map, `used_by` from a reverse index built once per
//! run. Cycles cannot recurse; the result cap exists to bound output for
//! resources with unusually high fan-in or fan-out (a shared VPC), not for
//! cycle safety.

use std::collections::{HashMap, HashSet};

use crate::error::DependencyError;
use crate::types::{DependencyInfo, ResourceChangeInput};

pub const DEFAULT_MAX_DEPENDENCY_RESULTS: usize = 100;

/// Invert the plan's declared edges: address → plan-ordered list of
/// addresses that declare it as a dependency. Built once per analysis run.
pub fn build_reverse_index(plan: &[ResourceChangeInput]) -> HashMap<String, Vec<String>> {
    let mut index: HashMap<String, Vec<String>> = HashMap::new();
    for change in plan {
        for dep in &change.depends_on {
            index
                .entry(dep.clone())
                .or_default()
                .push(change.address.clone());
        }
    }
    index
}

/// Direct neighbors of one change. Declared dependencies are merged with the
/// plan-wide forward map in first-seen order; both directions are
/// deduplicated and cut at `max_results` with `partial` set.
pub fn extract(
    change: &ResourceChangeInput,
    forward_edges: &HashMap<String, Vec<String>>,
    reverse_index: &HashMap<String, Vec<String>>,
    max_results: usize,
) -> Result<DependencyInfo, DependencyError> {
    if change.address.is_empty() {
        return Err(DependencyError {
            address: change.address.clone(),
            reason: "change has no address".into(),
        });
    }

    let declared = change.depends_on.iter();
    let forwarded = forward_edges.get(&change.address).into_iter().flatten();
    let mut depends_on = dedup_ordered(declared.chain(forwarded));
    let mut used_by = dedup_ordered(reverse_index.get(&change.address).into_iter().flatten());

    let mut partial = false;
    if depends_on.len() > max_results {
        depends_on.truncate(max_results);
        partial = true;
    }
    if used_by.len() > max_results {
        used_by.truncate(max_results);
        partial = true;
    }

    Ok(DependencyInfo {
        depends_on,
        used_by,
        partial,
    })
}

fn dedup_ordered<'a>(addresses: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for addr in addresses {
        if seen.insert(addr.as_str()) {
            out.push(addr.clone());
        }
    }
    out
}

// ── Tests ────────────────────────────────────────────────────────────────────
