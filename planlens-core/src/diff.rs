//! Property Diff Engine — bounded recursive before/after comparison.
//!
//! Walks two opaque JSON trees and emits leaf-level `PropertyChange`s in a
//! deterministic order (map keys visited sorted, depth-first). Every axis of
//! the walk is budgeted: recursion depth, change count, and cumulative
//! estimated bytes. Exceeding any budget stops collection and flags the set
//! as truncated instead of failing.
//!
//! Comparison rules:
//! - null vs null ⇒ equal, nothing recorded
//! - one side null ⇒ one change at the current path, no recursion
//! - map vs map ⇒ union of keys; common keys recurse, one-sided keys emit
//!   a single change without descending into their subtree
//! - sequence vs sequence ⇒ compared as opaque wholes (one change carrying
//!   both full sequences — element-wise diffs of list attributes are noise)
//! - scalar vs scalar ⇒ direct equality
//! - mismatched shapes ⇒ one best-effort whole-value change plus a
//!   `DiffError` naming only the path and the two kinds
//!
//! The engine never sets `sensitive` — tagging is the caller's concern.

use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use crate::error::DiffError;

pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_MAX_PROPERTIES: usize = 100;
pub const DEFAULT_MAX_TOTAL_BYTES: usize = 10 * 1024 * 1024;

// ── Paths ────────────────────────────────────────────────────────────────────

/// One step in a property path: a map key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => write!(f, "{k}"),
            Self::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// Renders `["a", Key("b"), Index(2)]` as `a.b[2]`.
pub fn path_to_string(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
            PathSegment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    out
}

// ── Change Units ─────────────────────────────────────────────────────────────

/// Leaf-level diff unit: one changed property at an ordered path.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PropertyChange {
    pub path: Vec<PathSegment>,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub sensitive: bool,
    /// Estimated serialized size of both sides, from [`estimate_size`].
    pub size_bytes: usize,
}

impl PropertyChange {
    pub fn path_string(&self) -> String {
        path_to_string(&self.path)
    }

    /// The root attribute this change falls under, when the path starts
    /// with a key. Sensitivity rules register attribute names, so tagging
    /// matches on this.
    pub fn root_attribute(&self) -> Option<&str> {
        match self.path.first() {
            Some(PathSegment::Key(k)) => Some(k),
            _ => None,
        }
    }
}

/// Ordered change list for one resource, plus the truncation verdict.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PropertyChangeSet {
    pub changes: Vec<PropertyChange>,
    pub truncated: bool,
    pub total_bytes: usize,
}

impl PropertyChangeSet {
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn sensitive_count(&self) -> usize {
        self.changes.iter().filter(|c| c.sensitive).count()
    }
}

// ── Limits ───────────────────────────────────────────────────────────────────

/// Explicit budgets for the recursive walk. Runaway nesting is cut off by
/// depth, wide resources by count, and large payloads by estimated bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DiffLimits {
    pub max_depth: usize,
    pub max_properties: usize,
    pub max_total_bytes: usize,
}

impl Default for DiffLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_properties: DEFAULT_MAX_PROPERTIES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
        }
    }
}

// ── Size Estimation ──────────────────────────────────────────────────────────

/// Cheap recursive size estimate — fixed costs for scalars, string lengths,
/// container overhead. Close enough for budget accounting without paying for
/// full serialization.
pub fn estimate_size(value: &Value) -> usize {
    match value {
        Value::Null => 4,
        Value::Bool(_) => 5,
        Value::Number(_) => 8,
        Value::String(s) => s.len() + 2,
        Value::Array(items) => 2 + items.len() + items.iter().map(estimate_size).sum::<usize>(),
        Value::Object(map) => {
            2 + map
                .iter()
                .map(|(k, v)| k.len() + 4 + estimate_size(v))
                .sum::<usize>()
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "map",
    }
}

// ── The Walk ─────────────────────────────────────────────────────────────────

/// Compare two optional trees and collect ordered, budgeted changes.
///
/// Shape mismatches degrade to a whole-value change and are reported in the
/// error list — they never abort the walk.
pub fn diff(
    before: Option<&Value>,
    after: Option<&Value>,
    limits: &DiffLimits,
) -> (PropertyChangeSet, Vec<DiffError>) {
    let mut walker = DiffWalker {
        limits,
        set: PropertyChangeSet::default(),
        errors: Vec::new(),
        budget_hit: false,
    };
    walker.walk(Vec::new(), before, after, 0);
    (walker.set, walker.errors)
}

struct DiffWalker<'a> {
    limits: &'a DiffLimits,
    set: PropertyChangeSet,
    errors: Vec<DiffError>,
    budget_hit: bool,
}

impl DiffWalker<'_> {
    fn walk(
        &mut self,
        path: Vec<PathSegment>,
        before: Option<&Value>,
        after: Option<&Value>,
        depth: usize,
    ) {
        if self.budget_hit {
            return;
        }
        // JSON null and an absent value mean the same thing here.
        let before = before.filter(|v| !v.is_null());
        let after = after.filter(|v| !v.is_null());

        match (before, after) {
            (None, None) => {}
            (Some(b), Some(a)) => self.walk_present(path, b, a, depth),
            // Value appeared or disappeared: one change, no recursion into
            // the non-null subtree.
            (b, a) => self.record(path, b.cloned(), a.cloned()),
        }
    }

    fn walk_present(&mut self, path: Vec<PathSegment>, before: &Value, after: &Value, depth: usize) {
        match (before, after) {
            (Value::Object(bm), Value::Object(am)) => {
                if depth >= self.limits.max_depth {
                    // Too deep to descend: emit the subtree as one opaque change.
                    debug!(path = %path_to_string(&path), depth, "depth limit reached, emitting opaque subtree");
                    self.set.truncated = true;
                    self.record(path, Some(before.clone()), Some(after.clone()));
                    return;
                }
                // Sorted union keeps output (and truncation) reproducible.
                let keys: BTreeSet<&String> = bm.keys().chain(am.keys()).collect();
                for key in keys {
                    if self.budget_hit {
                        return;
                    }
                    let mut child_path = path.clone();
                    child_path.push(PathSegment::Key(key.clone()));
                    self.walk(child_path, bm.get(key), am.get(key), depth + 1);
                }
            }
            (Value::Array(_), Value::Array(_)) => {
                // Sequences are opaque wholes: length or element difference
                // yields one change carrying both sides.
                if before != after {
                    self.record(path, Some(before.clone()), Some(after.clone()));
                }
            }
            (b, a) if value_kind(b) == value_kind(a) => {
                if b != a {
                    self.record(path, Some(b.clone()), Some(a.clone()));
                }
            }
            (b, a) => {
                // Incomparable shapes: best-effort whole-value change.
                self.errors.push(DiffError::ShapeMismatch {
                    path: path_to_string(&path),
                    left_kind: value_kind(b),
                    right_kind: value_kind(a),
                });
                self.record(path, Some(b.clone()), Some(a.clone()));
            }
        }
    }

    fn record(&mut self, path: Vec<PathSegment>, before: Option<Value>, after: Option<Value>) {
        if self.set.changes.len() >= self.limits.max_properties {
            debug!(
                path = %path_to_string(&path),
                collected = self.set.changes.len(),
                "property budget reached, truncating diff"
            );
            self.set.truncated = true;
            self.budget_hit = true;
            return;
        }
        let size_bytes = before.as_ref().map(estimate_size).unwrap_or(0)
            + after.as_ref().map(estimate_size).unwrap_or(0);
        if self.set.total_bytes + size_bytes > self.limits.max_total_bytes {
            debug!(
                path = %path_to_string(&path),
                collected_bytes = self.set.total_bytes,
                "byte budget reached, truncating diff"
            );
            self.set.truncated = true;
            self.budget_hit = true;
            return;
        }
        self.set.total_bytes += size_bytes;
        self.set.changes.push(PropertyChange {
            path,
            before,
            after,
            sensitive: false,
            size_bytes,
        });
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
