//! Grouping Engine — partitions analyses by provider, behind gates.
//!
//! Applies only above a size threshold **and** with more than one distinct
//! provider; anything else renders flat. Group order is first-seen across
//! the plan sequence, not alphabetical, preserving plan-file locality for
//! readers.

use crate::types::{ProviderGroup, ProviderGroups, ResourceAnalysis};

pub const DEFAULT_GROUP_THRESHOLD: usize = 10;

/// Partition by each analysis's already-resolved provider key. Groups hold
/// indices into the input slice, never copies. Below the gates the result is
/// `applied = false` with no groups and callers render the flat list.
pub fn group_by_provider(analyses: &[ResourceAnalysis], threshold: usize) -> ProviderGroups {
    let mut groups: Vec<ProviderGroup> = Vec::new();
    for (i, analysis) in analyses.iter().enumerate() {
        match groups.iter().position(|g| g.provider == analysis.provider) {
            Some(pos) => groups[pos].indices.push(i),
            None => groups.push(ProviderGroup {
                provider: analysis.provider.clone(),
                indices: vec![i],
            }),
        }
    }

    let applied = analyses.len() >= threshold && groups.len() > 1;
    ProviderGroups {
        applied,
        groups: if applied { groups } else { Vec::new() },
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangeAction, DependencyInfo, RiskLevel};
    use planlens_core::collapsible::CollapsibleValue;
    use planlens_core::diff::PropertyChangeSet;
    use serde_json::Value;

    fn analysis(address: &str, provider: &str) -> ResourceAnalysis {
        ResourceAnalysis {
            address: address.into(),
            resource_type: format!("{provider}_thing"),
            module_path: String::new(),
            action: ChangeAction::Update,
            changes: PropertyChangeSet::default(),
            risk: RiskLevel::Low,
            danger_reasons: Vec::new(),
            dependencies: DependencyInfo::default(),
            provider: provider.into(),
            change_details: CollapsibleValue::new("", Value::Null, false),
            dependency_details: CollapsibleValue::new("", Value::Null, false),
        }
    }

    fn make(providers: &[&str]) -> Vec<ResourceAnalysis> {
        providers
            .iter()
            .enumerate()
            .map(|(i, p)| analysis(&format!("{p}.r{i}"), p))
            .collect()
    }

    #[test]
    fn test_below_threshold_not_applied() {
        // 9 changes across 3 providers at threshold 10.
        let analyses = make(&["aws", "gcp", "azure", "aws", "gcp", "azure", "aws", "gcp", "azure"]);
        let groups = group_by_provider(&analyses, 10);
        assert!(!groups.applied);
        assert!(groups.groups.is_empty());
    }

    #[test]
    fn test_single_provider_not_applied() {
        let analyses = make(&["aws"; 10]);
        let groups = group_by_provider(&analyses, 10);
        assert!(!groups.applied);
        assert!(groups.groups.is_empty());
    }

    #[test]
    fn test_threshold_and_diversity_met() {
        let analyses = make(&["aws", "aws", "gcp", "aws", "gcp", "aws", "aws", "gcp", "aws", "aws"]);
        let groups = group_by_provider(&analyses, 10);
        assert!(groups.applied);
        assert_eq!(groups.groups.len(), 2);
    }

    #[test]
    fn test_first_seen_order_and_indices() {
        let analyses = make(&[
            "gcp", "aws", "gcp", "unknown", "aws", "gcp", "aws", "gcp", "aws", "gcp",
        ]);
        let groups = group_by_provider(&analyses, 10);
        assert!(groups.applied);
        let providers: Vec<&str> = groups.groups.iter().map(|g| g.provider.as_str()).collect();
        // First-seen across the plan, not alphabetical.
        assert_eq!(providers, vec!["gcp", "aws", "unknown"]);
        assert_eq!(groups.groups[0].indices, vec![0, 2, 5, 7, 9]);
        assert_eq!(groups.groups[1].indices, vec![1, 4, 6, 8]);
        assert_eq!(groups.groups[2].indices, vec![3]);
        // Every index accounted for exactly once.
        let total: usize = groups.groups.iter().map(|g| g.indices.len()).sum();
        assert_eq!(total, analyses.len());
    }
}
