//! Risk Assessor — deterministic action × sensitivity rule table.
//!
//! Pure function, no I/O, so the whole table is exhaustively testable. The
//! first matching rule fixes the level; every matching rule contributes its
//! reason, so a replace that also touches sensitive properties accumulates
//! both reasons.

use crate::types::{ChangeAction, RiskLevel};

pub const REASON_SENSITIVE_DELETION: &str = "sensitive resource deletion";
pub const REASON_DELETION: &str = "resource deletion";
pub const REASON_SENSITIVE_REPLACEMENT: &str = "sensitive resource replacement";
pub const REASON_REPLACEMENT: &str = "resource replacement";
pub const REASON_SENSITIVE_PROPERTY: &str = "sensitive property change";
/// Appended when a pipeline stage failed for the resource and its risk was
/// escalated instead of defaulted.
pub const REASON_INCOMPLETE_ANALYSIS: &str = "incomplete analysis";

/// Rule precedence, first match fixes the level:
/// 1. delete + sensitive resource ⇒ critical
/// 2. delete ⇒ high
/// 3. replace + sensitive resource ⇒ high
/// 4. replace ⇒ medium
/// 5. update/replace touching ≥1 sensitive property ⇒ medium
/// 6. else ⇒ low, no reasons
pub fn assess(
    action: ChangeAction,
    is_sensitive_resource: bool,
    sensitive_properties_touched: usize,
) -> (RiskLevel, Vec<String>) {
    let mut level: Option<RiskLevel> = None;
    let mut reasons: Vec<String> = Vec::new();

    if action == ChangeAction::Delete && is_sensitive_resource {
        level.get_or_insert(RiskLevel::Critical);
        reasons.push(REASON_SENSITIVE_DELETION.into());
    }
    if action == ChangeAction::Delete && !is_sensitive_resource {
        level.get_or_insert(RiskLevel::High);
        reasons.push(REASON_DELETION.into());
    }
    if action == ChangeAction::Replace && is_sensitive_resource {
        level.get_or_insert(RiskLevel::High);
        reasons.push(REASON_SENSITIVE_REPLACEMENT.into());
    }
    if action == ChangeAction::Replace && !is_sensitive_resource {
        level.get_or_insert(RiskLevel::Medium);
        reasons.push(REASON_REPLACEMENT.into());
    }
    if matches!(action, ChangeAction::Update | ChangeAction::Replace)
        && sensitive_properties_touched > 0
    {
        level.get_or_insert(RiskLevel::Medium);
        reasons.push(REASON_SENSITIVE_PROPERTY.into());
    }

    (level.unwrap_or(RiskLevel::Low), reasons)
}

pub fn is_dangerous(level: RiskLevel) -> bool {
    level != RiskLevel::Low
}

// ── Tests ────────────────────────────────────────────────────────────────────
