//! Pipeline conditions that gate when transformations are applied.
//!
//! Conditions are evaluated against the whole [`Rule`]; a processing item
//! fires only when all of its conditions match.

use rkql_ast::{LogSource, Rule};

/// A condition evaluated against a [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleCondition {
    /// Match logsource fields (category, product, service). `None` = any.
    Logsource {
        category: Option<String>,
        product: Option<String>,
        service: Option<String>,
    },
}

impl RuleCondition {
    /// Shorthand for a product+service logsource condition.
    pub fn service(product: &str, service: &str) -> Self {
        RuleCondition::Logsource {
            category: None,
            product: Some(product.to_string()),
            service: Some(service.to_string()),
        }
    }

    /// Shorthand for a product+category logsource condition.
    pub fn category(product: &str, category: &str) -> Self {
        RuleCondition::Logsource {
            category: Some(category.to_string()),
            product: Some(product.to_string()),
            service: None,
        }
    }

    pub fn matches(&self, rule: &Rule) -> bool {
        match self {
            RuleCondition::Logsource {
                category,
                product,
                service,
            } => logsource_matches(&rule.logsource, category, product, service),
        }
    }
}

/// Each specified condition field must equal the rule's logsource field;
/// unspecified fields match anything.
fn logsource_matches(
    logsource: &LogSource,
    category: &Option<String>,
    product: &Option<String>,
    service: &Option<String>,
) -> bool {
    let field_matches = |cond: &Option<String>, actual: &Option<String>| match cond {
        Some(want) => actual.as_deref() == Some(want.as_str()),
        None => true,
    };
    field_matches(category, &logsource.category)
        && field_matches(product, &logsource.product)
        && field_matches(service, &logsource.service)
}

/// Check if all rule conditions match (vacuously true when empty).
pub fn all_rule_conditions_match(conditions: &[RuleCondition], rule: &Rule) -> bool {
    conditions.iter().all(|c| c.matches(rule))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rkql_ast::{ConditionNode, FieldCondition};

    fn rule_with(logsource: LogSource) -> Rule {
        Rule::new(
            "Test",
            logsource,
            ConditionNode::leaf(FieldCondition::field_equals("a", "1")),
        )
    }

    #[test]
    fn test_logsource_condition_matches_specified_fields() {
        let cond = RuleCondition::service("windows", "security");
        assert!(cond.matches(&rule_with(LogSource::service("windows", "security"))));
        assert!(!cond.matches(&rule_with(LogSource::service("windows", "sysmon"))));
        assert!(!cond.matches(&rule_with(LogSource::service("linux", "security"))));
    }

    #[test]
    fn test_unspecified_fields_match_anything() {
        let cond = RuleCondition::Logsource {
            category: None,
            product: Some("windows".to_string()),
            service: None,
        };
        assert!(cond.matches(&rule_with(LogSource::service("windows", "security"))));
        assert!(cond.matches(&rule_with(LogSource::service("windows", "sysmon"))));
    }

    #[test]
    fn test_category_condition() {
        let cond = RuleCondition::category("windows", "process_creation");
        let mut ls = LogSource::category("process_creation");
        ls.product = Some("windows".to_string());
        assert!(cond.matches(&rule_with(ls)));
        assert!(!cond.matches(&rule_with(LogSource::category("process_creation"))));
    }

    #[test]
    fn test_empty_condition_list_matches() {
        assert!(all_rule_conditions_match(
            &[],
            &rule_with(LogSource::default())
        ));
    }
}
