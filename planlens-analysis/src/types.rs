//! Shared types for the analysis layer.

use std::fmt;

use planlens_core::collapsible::CollapsibleValue;
use planlens_core::diff::PropertyChangeSet;
use serde_json::Value;

// ── Actions & Risk ───────────────────────────────────────────────────────────

/// What the plan will do to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeAction {
    NoOp,
    Create,
    Update,
    Delete,
    Replace,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoOp => "no-op",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Replace => "replace",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel { Low, Medium, High, Critical }

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

// ── Plan Input ───────────────────────────────────────────────────────────────

/// One normalized resource change descriptor, owned by the plan parser.
/// The engine only reads it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResourceChangeInput {
    pub address: String,
    pub resource_type: String,
    pub module_path: String,
    pub action: ChangeAction,
    pub before: Option<Value>,
    pub after: Option<Value>,
    /// Dependency addresses declared in the plan, already direct.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

// ── Analysis Output ──────────────────────────────────────────────────────────

/// Direct-neighbor dependency view for one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DependencyInfo {
    pub depends_on: Vec<String>,
    pub used_by: Vec<String>,
    /// Set when either list was cut at the result cap.
    pub partial: bool,
}

/// Everything the renderer needs for one resource, risk and sensitivity
/// decisions already made.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResourceAnalysis {
    pub address: String,
    pub resource_type: String,
    pub module_path: String,
    pub action: ChangeAction,
    pub changes: PropertyChangeSet,
    pub risk: RiskLevel,
    /// Ordered, deduplicated danger reasons.
    pub danger_reasons: Vec<String>,
    pub dependencies: DependencyInfo,
    pub provider: String,
    pub change_details: CollapsibleValue,
    pub dependency_details: CollapsibleValue,
}

impl ResourceAnalysis {
    pub fn is_dangerous(&self) -> bool {
        self.risk != RiskLevel::Low
    }
}

// ── Per-Resource Errors ──────────────────────────────────────────────────────

/// Which pipeline stage a non-fatal failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStage {
    Diff,
    Risk,
    Dependency,
    Sensitivity,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Diff => "diff",
            Self::Risk => "risk",
            Self::Dependency => "dependency",
            Self::Sensitivity => "sensitivity",
        };
        write!(f, "{s}")
    }
}

/// A per-resource failure. Recorded in the report for operator diagnosis;
/// never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisError {
    pub address: String,
    pub stage: AnalysisStage,
    pub message: String,
    pub cause: Option<String>,
}

// ── Statistics ───────────────────────────────────────────────────────────────

/// Flat counts for dashboards and CI gating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisStats {
    pub no_op: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub replace: usize,
    pub total: usize,
    /// Analyses with `RiskLevel >= High`.
    pub high_risk: usize,
}

impl AnalysisStats {
    pub fn record(&mut self, action: ChangeAction, risk: RiskLevel) {
        match action {
            ChangeAction::NoOp => self.no_op += 1,
            ChangeAction::Create => self.create += 1,
            ChangeAction::Update => self.update += 1,
            ChangeAction::Delete => self.delete += 1,
            ChangeAction::Replace => self.replace += 1,
        }
        self.total += 1;
        if risk >= RiskLevel::High {
            self.high_risk += 1;
        }
    }
}

// ── Grouping ─────────────────────────────────────────────────────────────────

/// Indices into the report's analyses list for one provider — no data
/// duplication.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProviderGroup {
    pub provider: String,
    pub indices: Vec<usize>,
}

/// Grouping outcome. When `applied` is false the groups list is empty and
/// callers render the flat analyses list.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProviderGroups {
    pub applied: bool,
    pub groups: Vec<ProviderGroup>,
}

// ── Report ───────────────────────────────────────────────────────────────────

/// The finished analysis: plan-ordered resource analyses, aggregate stats,
/// the non-fatal error list, and the grouping verdict. Immutable once handed
/// to the caller.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisReport {
    pub analyses: Vec<ResourceAnalysis>,
    pub stats: AnalysisStats,
    pub errors: Vec<AnalysisError>,
    pub groups: ProviderGroups,
    pub generated_at: i64,
}
