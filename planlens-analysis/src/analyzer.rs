//! Analysis Orchestrator — fans work out per resource, composes the report.
//!
//! Builds the dependency reverse index once, then a bounded worker pool
//! evaluates each resource independently: diff → sensitivity tagging → risk
//! → dependency lookup → collapsible wrapping. Workers only read shared
//! immutable structures and each writes its own pre-sized output slot, so
//! there is no cross-slot contention. A failing stage degrades that one
//! resource, escalates its risk, and leaves siblings untouched.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use planlens_core::cancel::CancelToken;
use planlens_core::collapsible::{redact_changes, CollapsibleValue, DEFAULT_DETAIL_BUDGET};
use planlens_core::diff::{diff, DiffLimits, PropertyChangeSet};
use planlens_core::provider::{ProviderResolver, UnderscorePrefixResolver};

use crate::deps::{self, DEFAULT_MAX_DEPENDENCY_RESULTS};
use crate::error::{PlanLensError, PlanLensResult};
use crate::grouping::{self, DEFAULT_GROUP_THRESHOLD};
use crate::risk::{self, REASON_INCOMPLETE_ANALYSIS};
use crate::sensitivity::SensitivityIndex;
use crate::types::{
    AnalysisError, AnalysisReport, AnalysisStage, AnalysisStats, ChangeAction, DependencyInfo,
    ResourceAnalysis, ResourceChangeInput, RiskLevel,
};

// ── Configuration ────────────────────────────────────────────────────────────

/// Knobs the command layer maps flags onto. Everything has a production
/// default; the engine owns no flags itself.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub diff_limits: DiffLimits,
    pub max_dependency_results: usize,
    pub group_threshold: usize,
    /// Worker pool size; `None` sizes to available CPUs.
    pub workers: Option<usize>,
    /// Global override forcing every collapsible open.
    pub expand_all: bool,
    /// Serialized detail cap per collapsible payload, in characters.
    pub detail_budget: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            diff_limits: DiffLimits::default(),
            max_dependency_results: DEFAULT_MAX_DEPENDENCY_RESULTS,
            group_threshold: DEFAULT_GROUP_THRESHOLD,
            workers: None,
            expand_all: false,
            detail_budget: DEFAULT_DETAIL_BUDGET,
        }
    }
}

// ── The Engine ───────────────────────────────────────────────────────────────

pub struct Analyzer {
    config: AnalyzerConfig,
    resolver: Box<dyn ProviderResolver>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            config,
            resolver: Box::new(UnderscorePrefixResolver),
        }
    }

    pub fn with_resolver(mut self, resolver: Box<dyn ProviderResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    // ── Main entry point ─────────────────────────────────────────────────

    /// Analyze a whole plan. Blocks until complete or cancelled; on
    /// cancellation the partial report rides inside the error. Per-resource
    /// failures never abort the batch.
    pub fn analyze(
        &self,
        cancel: &CancelToken,
        plan: &[ResourceChangeInput],
        forward_edges: &HashMap<String, Vec<String>>,
        index: &SensitivityIndex,
    ) -> PlanLensResult<AnalysisReport> {
        let reverse_index = deps::build_reverse_index(plan);
        let workers = self
            .config
            .workers
            .or_else(|| thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
            .clamp(1, plan.len().max(1));
        debug!(resources = plan.len(), workers, "dispatching analysis");

        // One slot per resource; a worker owns a slot for the index it
        // claimed, so writes never contend.
        let slots: Vec<Mutex<Option<(ResourceAnalysis, Vec<AnalysisError>)>>> =
            (0..plan.len()).map(|_| Mutex::new(None)).collect();
        let cursor = AtomicUsize::new(0);

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    // Cancellation is observed between resources: claimed
                    // work always completes.
                    if cancel.is_cancelled() {
                        break;
                    }
                    let i = cursor.fetch_add(1, Ordering::Relaxed);
                    if i >= plan.len() {
                        break;
                    }
                    let outcome =
                        self.analyze_resource(&plan[i], forward_edges, &reverse_index, index);
                    *slots[i].lock() = Some(outcome);
                });
            }
        });

        let mut analyses = Vec::with_capacity(plan.len());
        let mut errors = Vec::new();
        let mut stats = AnalysisStats::default();
        for slot in slots {
            if let Some((analysis, resource_errors)) = slot.into_inner() {
                stats.record(analysis.action, analysis.risk);
                errors.extend(resource_errors);
                analyses.push(analysis);
            }
        }

        let groups = grouping::group_by_provider(&analyses, self.config.group_threshold);
        let report = AnalysisReport {
            analyses,
            stats,
            errors,
            groups,
            generated_at: chrono::Utc::now().timestamp(),
        };

        if cancel.is_cancelled() {
            warn!(
                completed = report.analyses.len(),
                total = plan.len(),
                "analysis cancelled"
            );
            return Err(PlanLensError::Cancelled {
                completed: report.analyses.len(),
                total: plan.len(),
                partial: Box::new(report),
            });
        }

        info!(
            resources = report.analyses.len(),
            high_risk = report.stats.high_risk,
            errors = report.errors.len(),
            grouped = report.groups.applied,
            "plan analysis complete"
        );
        Ok(report)
    }

    // ── Per-Resource Pipeline ────────────────────────────────────────────

    fn analyze_resource(
        &self,
        change: &ResourceChangeInput,
        forward_edges: &HashMap<String, Vec<String>>,
        reverse_index: &HashMap<String, Vec<String>>,
        index: &SensitivityIndex,
    ) -> (ResourceAnalysis, Vec<AnalysisError>) {
        let mut errors: Vec<AnalysisError> = Vec::new();
        let sensitive_resource = index.is_sensitive_resource(&change.resource_type);

        // Property diff runs for updates only: replace renders reasons-only,
        // and for create/delete the action already conveys the whole event.
        let mut changes = PropertyChangeSet::default();
        if change.action == ChangeAction::Update {
            let (set, diff_errors) = diff(
                change.before.as_ref(),
                change.after.as_ref(),
                &self.config.diff_limits,
            );
            changes = set;
            for err in diff_errors {
                errors.push(AnalysisError {
                    address: change.address.clone(),
                    stage: AnalysisStage::Diff,
                    message: err.to_string(),
                    cause: None,
                });
            }
        }

        // Sensitivity tagging is post-hoc; the diff engine stays type-agnostic.
        let mut touched = 0;
        for c in &mut changes.changes {
            if let Some(attribute) = c.root_attribute() {
                if index.is_sensitive_property(&change.resource_type, attribute) {
                    c.sensitive = true;
                    touched += 1;
                }
            }
        }

        let (mut risk_level, mut reasons) = risk::assess(change.action, sensitive_resource, touched);

        let dependencies = match deps::extract(
            change,
            forward_edges,
            reverse_index,
            self.config.max_dependency_results,
        ) {
            Ok(info) => info,
            Err(err) => {
                errors.push(AnalysisError {
                    address: change.address.clone(),
                    stage: AnalysisStage::Dependency,
                    message: err.to_string(),
                    cause: None,
                });
                DependencyInfo::default()
            }
        };

        // Conservative fallback: a failed stage escalates, never defaults to
        // low — false positives over false negatives.
        if !errors.is_empty() && risk_level < RiskLevel::High {
            risk_level = RiskLevel::High;
            reasons.push(REASON_INCOMPLETE_ANALYSIS.into());
        }

        let mut seen = HashSet::new();
        reasons.retain(|r| seen.insert(r.clone()));

        let provider = self.resolver.provider_of(&change.resource_type);
        let expand = self.config.expand_all
            || risk_level >= RiskLevel::High
            || changes.sensitive_count() > 0;

        let change_details = CollapsibleValue::capped(
            change_summary(&changes),
            redact_changes(&changes.changes),
            expand,
            self.config.detail_budget,
        );
        let dependency_details = CollapsibleValue::capped(
            dependency_summary(&dependencies),
            serde_json::to_value(&dependencies).unwrap_or(serde_json::Value::Null),
            expand,
            self.config.detail_budget,
        );

        let analysis = ResourceAnalysis {
            address: change.address.clone(),
            resource_type: change.resource_type.clone(),
            module_path: change.module_path.clone(),
            action: change.action,
            changes,
            risk: risk_level,
            danger_reasons: reasons,
            dependencies,
            provider,
            change_details,
            dependency_details,
        };
        (analysis, errors)
    }
}

fn change_summary(changes: &PropertyChangeSet) -> String {
    let mut summary = format!("{} property change(s)", changes.len());
    let sensitive = changes.sensitive_count();
    if sensitive > 0 {
        summary.push_str(&format!(", {sensitive} sensitive"));
    }
    if changes.truncated {
        summary.push_str(" (truncated)");
    }
    summary
}

fn dependency_summary(info: &DependencyInfo) -> String {
    let mut summary = format!(
        "depends on {}, used by {}",
        info.depends_on.len(),
        info.used_by.len()
    );
    if info.partial {
        summary.push_str(" (partial)");
    }
    summary
}
