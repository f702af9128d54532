//! End-to-end scenarios for the plan analysis engine.
//!
//! These exercise real multi-resource plans across crate boundaries:
//! - Sensitivity config → index → risk scoring → report
//! - Dependency reverse-index wiring through the orchestrator
//! - Provider grouping gates on realistic plan shapes
//! - Progressive-disclosure payloads (redaction, detail caps)
//! - Report serialization for downstream renderers

use std::collections::HashMap;

use planlens_analysis::{
    Analyzer, AnalyzerConfig, ChangeAction, ResourceChangeInput, RiskLevel, SensitivityIndex,
    SensitivityRule,
};
use planlens_core::cancel::CancelToken;
use planlens_core::diff::DiffLimits;
use planlens_core::REDACTION_MARKER;
use serde_json::json;

fn resource(
    address: &str,
    resource_type: &str,
    action: ChangeAction,
    before: Option<serde_json::Value>,
    after: Option<serde_json::Value>,
    depends_on: &[&str],
) -> ResourceChangeInput {
    ResourceChangeInput {
        address: address.into(),
        resource_type: resource_type.into(),
        module_path: "module.app".into(),
        action,
        before,
        after,
        depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
    }
}

/// A 12-resource plan across two providers with one sensitive database,
/// one sensitive property, and a dependency fan-in on the VPC.
fn fixture_plan() -> (Vec<ResourceChangeInput>, SensitivityIndex) {
    let (index, errors) = SensitivityIndex::build(&[
        SensitivityRule::Resource {
            resource_type: "aws_db_instance".into(),
        },
        SensitivityRule::Property {
            resource_type: "aws_instance".into(),
            property: "user_data".into(),
        },
    ]);
    assert!(errors.is_empty());

    let mut plan = vec![
        resource(
            "aws_vpc.main",
            "aws_vpc",
            ChangeAction::Update,
            Some(json!({"cidr_block": "10.0.0.0/16"})),
            Some(json!({"cidr_block": "10.1.0.0/16"})),
            &[],
        ),
        resource(
            "aws_db_instance.primary",
            "aws_db_instance",
            ChangeAction::Delete,
            Some(json!({"engine": "postgres"})),
            None,
            &["aws_vpc.main"],
        ),
        resource(
            "aws_instance.web",
            "aws_instance",
            ChangeAction::Update,
            Some(json!({"user_data": "#!/bin/sh\nexport TOKEN=old", "ami": "ami-1"})),
            Some(json!({"user_data": "#!/bin/sh\nexport TOKEN=new", "ami": "ami-2"})),
            &["aws_vpc.main"],
        ),
    ];
    for i in 0..6 {
        plan.push(resource(
            &format!("aws_instance.worker{i}"),
            "aws_instance",
            ChangeAction::Create,
            None,
            Some(json!({"ami": "ami-2"})),
            &["aws_vpc.main"],
        ));
    }
    plan.push(resource(
        "google_compute_instance.batch",
        "google_compute_instance",
        ChangeAction::Replace,
        Some(json!({"machine_type": "n1-standard-1"})),
        Some(json!({"machine_type": "n2-standard-2"})),
        &[],
    ));
    plan.push(resource(
        "google_storage_bucket.assets",
        "google_storage_bucket",
        ChangeAction::NoOp,
        Some(json!({"location": "EU"})),
        Some(json!({"location": "EU"})),
        &[],
    ));
    plan.push(resource(
        "cloudflare.zone",
        "cloudflare",
        ChangeAction::Update,
        Some(json!({"paused": false})),
        Some(json!({"paused": true})),
        &[],
    ));
    (plan, index)
}

// ── Scenario 1: full plan → risk-scored, grouped report ──────────────────

#[test]
fn test_full_plan_analysis() {
    let (plan, index) = fixture_plan();
    let report = Analyzer::new()
        .analyze(&CancelToken::new(), &plan, &HashMap::new(), &index)
        .unwrap();

    assert_eq!(report.analyses.len(), 12);
    assert!(report.errors.is_empty());

    // Sensitive database deletion tops the scale.
    let db = &report.analyses[1];
    assert_eq!(db.risk, RiskLevel::Critical);
    assert_eq!(db.danger_reasons, vec!["sensitive resource deletion"]);

    // Sensitive user_data update is medium and tagged.
    let web = &report.analyses[2];
    assert_eq!(web.risk, RiskLevel::Medium);
    assert_eq!(web.changes.sensitive_count(), 1);

    // Plain replace is medium with the replacement reason.
    let batch = &report.analyses[9];
    assert_eq!(batch.risk, RiskLevel::Medium);
    assert_eq!(batch.danger_reasons, vec!["resource replacement"]);

    // Stats line up with the plan.
    assert_eq!(report.stats.total, 12);
    assert_eq!(report.stats.create, 6);
    assert_eq!(report.stats.update, 3);
    assert_eq!(report.stats.delete, 1);
    assert_eq!(report.stats.replace, 1);
    assert_eq!(report.stats.no_op, 1);
    assert_eq!(report.stats.high_risk, 1);
}

// ── Scenario 2: grouping gates ───────────────────────────────────────────

#[test]
fn test_grouping_applied_on_large_heterogeneous_plan() {
    let (plan, index) = fixture_plan();
    let report = Analyzer::new()
        .analyze(&CancelToken::new(), &plan, &HashMap::new(), &index)
        .unwrap();

    assert!(report.groups.applied);
    let providers: Vec<&str> = report
        .groups
        .groups
        .iter()
        .map(|g| g.provider.as_str())
        .collect();
    // First-seen order; the non-underscored type falls back to "unknown".
    assert_eq!(providers, vec!["aws", "google", "unknown"]);

    // Groups index the flat list without duplicating analyses.
    let indexed: usize = report.groups.groups.iter().map(|g| g.indices.len()).sum();
    assert_eq!(indexed, report.analyses.len());
    for group in &report.groups.groups {
        for &i in &group.indices {
            assert_eq!(report.analyses[i].provider, group.provider);
        }
    }
}

#[test]
fn test_grouping_skipped_below_threshold() {
    let (mut plan, index) = fixture_plan();
    plan.truncate(9);
    let report = Analyzer::new()
        .analyze(&CancelToken::new(), &plan, &HashMap::new(), &index)
        .unwrap();
    assert!(!report.groups.applied);
    assert!(report.groups.groups.is_empty());
}

// ── Scenario 3: dependencies through the orchestrator ────────────────────

#[test]
fn test_dependency_fan_in_on_shared_vpc() {
    let (plan, index) = fixture_plan();
    let report = Analyzer::new()
        .analyze(&CancelToken::new(), &plan, &HashMap::new(), &index)
        .unwrap();

    let vpc = &report.analyses[0];
    // db + web + 6 workers all declared the VPC.
    assert_eq!(vpc.dependencies.used_by.len(), 8);
    assert_eq!(vpc.dependencies.used_by[0], "aws_db_instance.primary");
    assert!(!vpc.dependencies.partial);

    let web = &report.analyses[2];
    assert_eq!(web.dependencies.depends_on, vec!["aws_vpc.main"]);
}

#[test]
fn test_dependency_cap_marks_partial() {
    let (plan, index) = fixture_plan();
    let config = AnalyzerConfig {
        max_dependency_results: 3,
        ..AnalyzerConfig::default()
    };
    let report = Analyzer::with_config(config)
        .analyze(&CancelToken::new(), &plan, &HashMap::new(), &index)
        .unwrap();

    let vpc = &report.analyses[0];
    assert_eq!(vpc.dependencies.used_by.len(), 3);
    assert!(vpc.dependencies.partial);
    assert!(vpc
        .dependency_details
        .summary
        .contains("(partial)"));
}

// ── Scenario 4: progressive disclosure payloads ──────────────────────────

#[test]
fn test_sensitive_values_never_reach_the_detail_payload() {
    let (plan, index) = fixture_plan();
    let report = Analyzer::new()
        .analyze(&CancelToken::new(), &plan, &HashMap::new(), &index)
        .unwrap();

    let web = &report.analyses[2];
    let rendered = web.change_details.detail.to_string();
    assert!(!rendered.contains("TOKEN=old"));
    assert!(!rendered.contains("TOKEN=new"));
    assert!(rendered.contains(REDACTION_MARKER));
    // The non-sensitive ami change renders in the clear.
    assert!(rendered.contains("ami-1"));
    assert!(web.change_details.expand_by_default);
}

#[test]
fn test_detail_budget_truncates_payload_not_summary() {
    let (plan, index) = fixture_plan();
    let config = AnalyzerConfig {
        detail_budget: 40,
        ..AnalyzerConfig::default()
    };
    let report = Analyzer::with_config(config)
        .analyze(&CancelToken::new(), &plan, &HashMap::new(), &index)
        .unwrap();

    let web = &report.analyses[2];
    let marker = web.change_details.detail.as_str().unwrap();
    assert!(marker.starts_with("[detail truncated:"));
    // Summary still reports the true change count.
    assert!(web.change_details.summary.starts_with("2 property change(s)"));
}

// ── Scenario 5: diff budgets through the orchestrator ────────────────────

#[test]
fn test_diff_limits_flow_through_config() {
    let index = SensitivityIndex::build(&[]).0;
    let plan = vec![resource(
        "aws_instance.wide",
        "aws_instance",
        ChangeAction::Update,
        Some(json!({"a": 1, "b": 1, "c": 1, "d": 1, "e": 1})),
        Some(json!({"a": 2, "b": 2, "c": 2, "d": 2, "e": 2})),
        &[],
    )];
    let config = AnalyzerConfig {
        diff_limits: DiffLimits {
            max_properties: 2,
            ..DiffLimits::default()
        },
        ..AnalyzerConfig::default()
    };
    let report = Analyzer::with_config(config)
        .analyze(&CancelToken::new(), &plan, &HashMap::new(), &index)
        .unwrap();

    let wide = &report.analyses[0];
    assert_eq!(wide.changes.len(), 2);
    assert!(wide.changes.truncated);
    assert!(wide.change_details.summary.contains("(truncated)"));
}

// ── Scenario 6: the report is renderer-ready JSON ────────────────────────

#[test]
fn test_report_round_trips_through_json() {
    let (plan, index) = fixture_plan();
    let report = Analyzer::new()
        .analyze(&CancelToken::new(), &plan, &HashMap::new(), &index)
        .unwrap();

    let rendered = serde_json::to_string(&report).unwrap();
    let parsed: planlens_analysis::AnalysisReport = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed.analyses.len(), report.analyses.len());
    assert_eq!(parsed.stats, report.stats);
    // Actions keep their wire spelling.
    assert!(rendered.contains("\"no-op\""));
    assert!(rendered.contains("\"replace\""));
}
