//! Collapsible values — the progressive-disclosure contract.
//!
//! A `CollapsibleValue` defers detail rendering to the output layer: the
//! summary always renders, the detail only when expanded. Detail payloads
//! are size-capped and sensitive values are redacted before they ever reach
//! a renderer, regardless of destination format.

use serde_json::{json, Value};

use crate::diff::PropertyChange;
use crate::REDACTION_MARKER;

pub const DEFAULT_DETAIL_BUDGET: usize = 500;

/// `(summary, detail, expand_by_default)` triple, independent of output
/// format. The renderer decides presentation; never risk or sensitivity.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CollapsibleValue {
    pub summary: String,
    pub detail: Value,
    pub expand_by_default: bool,
}

impl CollapsibleValue {
    pub fn new(summary: impl Into<String>, detail: Value, expand_by_default: bool) -> Self {
        Self {
            summary: summary.into(),
            detail,
            expand_by_default,
        }
    }

    /// Like [`CollapsibleValue::new`], but caps the serialized detail at
    /// `budget` characters. Overflow replaces the payload with a truncation
    /// marker; the summary keeps reporting the true count.
    pub fn capped(
        summary: impl Into<String>,
        detail: Value,
        expand_by_default: bool,
        budget: usize,
    ) -> Self {
        let rendered = detail.to_string();
        let detail = if rendered.len() > budget {
            Value::String(format!("[detail truncated: {} chars]", rendered.len()))
        } else {
            detail
        };
        Self {
            summary: summary.into(),
            detail,
            expand_by_default,
        }
    }
}

/// Serialize a change list into a detail payload, substituting the
/// fixed-width redaction marker for sensitive values. The `sensitive` flag
/// itself stays visible so renderers can badge the row.
pub fn redact_changes(changes: &[PropertyChange]) -> Value {
    Value::Array(
        changes
            .iter()
            .map(|change| {
                let (before, after) = if change.sensitive {
                    (json!(REDACTION_MARKER), json!(REDACTION_MARKER))
                } else {
                    (
                        change.before.clone().unwrap_or(Value::Null),
                        change.after.clone().unwrap_or(Value::Null),
                    )
                };
                json!({
                    "path": change.path_string(),
                    "before": before,
                    "after": after,
                    "sensitive": change.sensitive,
                })
            })
            .collect(),
    )
}
