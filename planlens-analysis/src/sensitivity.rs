//! Sensitivity Index — compiles user-supplied rules into O(1) lookups.
//!
//! Built exactly once per analysis run and never mutated afterwards, so
//! workers share it by reference without locking. Invalid rules are
//! collected and excluded — one malformed config line never blocks
//! analysis. Duplicates are a warning; the first registration wins.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, warn};

// ── Rules ────────────────────────────────────────────────────────────────────

/// A sensitivity declaration from user config: a whole resource type, or one
/// property of a resource type. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensitivityRule {
    Resource { resource_type: String },
    Property { resource_type: String, property: String },
}

impl fmt::Display for SensitivityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource { resource_type } => write!(f, "{resource_type}"),
            Self::Property { resource_type, property } => {
                write!(f, "{resource_type}.{property}")
            }
        }
    }
}

/// A malformed rule, excluded from the index but reported to the operator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValidationError {
    pub rule: String,
    pub reason: String,
}

/// Resource types follow `provider_resource`: a non-empty prefix and suffix
/// around the first underscore.
fn provider_shaped(resource_type: &str) -> bool {
    matches!(resource_type.split_once('_'), Some((prefix, rest)) if !prefix.is_empty() && !rest.is_empty())
}

// ── Index ────────────────────────────────────────────────────────────────────

/// Read-only membership structure. Lookups are a set probe and a two-level
/// map probe; the miss path allocates nothing.
#[derive(Debug, Clone, Default)]
pub struct SensitivityIndex {
    resources: HashSet<String>,
    properties: HashMap<String, HashSet<String>>,
}

impl SensitivityIndex {
    /// Validate and compile rules. Invalid rules land in the error list and
    /// are skipped; valid rules proceed.
    pub fn build(rules: &[SensitivityRule]) -> (Self, Vec<ValidationError>) {
        let mut index = Self::default();
        let mut rejected = Vec::new();

        for rule in rules {
            if let Err(reason) = validate(rule) {
                warn!(rule = %rule, %reason, "sensitivity rule rejected");
                rejected.push(ValidationError {
                    rule: rule.to_string(),
                    reason,
                });
                continue;
            }
            match rule {
                SensitivityRule::Resource { resource_type } => {
                    if !index.resources.insert(resource_type.clone()) {
                        warn!(rule = %rule, "duplicate sensitivity rule ignored");
                    }
                }
                SensitivityRule::Property { resource_type, property } => {
                    let entry = index.properties.entry(resource_type.clone()).or_default();
                    if !entry.insert(property.clone()) {
                        warn!(rule = %rule, "duplicate sensitivity rule ignored");
                    }
                }
            }
        }

        debug!(
            resources = index.resources.len(),
            property_types = index.properties.len(),
            rejected = rejected.len(),
            "sensitivity index built"
        );
        (index, rejected)
    }

    /// O(1) set probe. Exact and case-sensitive.
    pub fn is_sensitive_resource(&self, resource_type: &str) -> bool {
        self.resources.contains(resource_type)
    }

    /// O(1) two-level probe. An absent type is false without allocating.
    pub fn is_sensitive_property(&self, resource_type: &str, property: &str) -> bool {
        self.properties
            .get(resource_type)
            .map_or(false, |props| props.contains(property))
    }

    pub fn resource_rule_count(&self) -> usize {
        self.resources.len()
    }

    pub fn property_rule_count(&self) -> usize {
        self.properties.values().map(HashSet::len).sum()
    }
}

fn validate(rule: &SensitivityRule) -> Result<(), String> {
    let resource_type = match rule {
        SensitivityRule::Resource { resource_type } => resource_type,
        SensitivityRule::Property { resource_type, .. } => resource_type,
    };
    if resource_type.is_empty() {
        return Err("resource type is empty".into());
    }
    if !provider_shaped(resource_type) {
        return Err(format!(
            "resource type '{resource_type}' is not provider_resource shaped"
        ));
    }
    if let SensitivityRule::Property { property, .. } = rule {
        if property.is_empty() {
            return Err("property name is empty".into());
        }
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(t: &str) -> SensitivityRule {
        SensitivityRule::Resource {
            resource_type: t.into(),
        }
    }

    fn property(t: &str, p: &str) -> SensitivityRule {
        SensitivityRule::Property {
            resource_type: t.into(),
            property: p.into(),
        }
    }

    #[test]
    fn test_membership_is_exact_and_case_sensitive() {
        let (index, errors) = SensitivityIndex::build(&[
            resource("aws_db_instance"),
            property("aws_instance", "user_data"),
        ]);
        assert!(errors.is_empty());

        assert!(index.is_sensitive_resource("aws_db_instance"));
        assert!(!index.is_sensitive_resource("AWS_db_instance"));
        assert!(!index.is_sensitive_resource("aws_db"));

        assert!(index.is_sensitive_property("aws_instance", "user_data"));
        assert!(!index.is_sensitive_property("aws_instance", "user_dat"));
        assert!(!index.is_sensitive_property("aws_instance", "User_Data"));
        // Absent type ⇒ false, not a panic or allocation.
        assert!(!index.is_sensitive_property("gcp_instance", "user_data"));
    }

    #[test]
    fn test_invalid_rules_excluded_not_fatal() {
        let (index, errors) = SensitivityIndex::build(&[
            resource(""),
            resource("noprefix"),
            property("aws_instance", ""),
            resource("aws_db_instance"),
        ]);
        assert_eq!(errors.len(), 3);
        // The valid rule still landed.
        assert!(index.is_sensitive_resource("aws_db_instance"));
        assert_eq!(index.resource_rule_count(), 1);
        assert_eq!(index.property_rule_count(), 0);
    }

    #[test]
    fn test_validation_error_names_the_rule() {
        let (_, errors) = SensitivityIndex::build(&[resource("noprefix")]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "noprefix");
        assert!(errors[0].reason.contains("provider_resource"));
    }

    #[test]
    fn test_duplicates_warn_but_do_not_error() {
        let (index, errors) = SensitivityIndex::build(&[
            resource("aws_db_instance"),
            resource("aws_db_instance"),
            property("aws_instance", "user_data"),
            property("aws_instance", "user_data"),
        ]);
        assert!(errors.is_empty());
        assert_eq!(index.resource_rule_count(), 1);
        assert_eq!(index.property_rule_count(), 1);
    }

    #[test]
    fn test_underscore_shape_required() {
        let (_, errors) = SensitivityIndex::build(&[resource("_leading"), resource("trailing_")]);
        assert_eq!(errors.len(), 2);
    }
}
