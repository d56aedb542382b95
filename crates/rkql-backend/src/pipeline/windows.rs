//! Built-in pipeline for Windows rules targeting Azure Log Analytics
//! tables.
//!
//! Maps well-known Windows services to their Log Analytics table and
//! rewrites process-creation rules onto `SecurityEvent` with the matching
//! `EventID` filter.

use std::collections::HashMap;

use rkql_ast::LiteralValue;

use super::conditions::RuleCondition;
use super::transformations::Transformation;
use super::{Pipeline, ProcessingItem};

/// Service name to Log Analytics table, for `product: windows` rules.
pub fn windows_service_map() -> &'static [(&'static str, &'static str)] {
    &[
        ("security", "SecurityEvent"),
        ("sysmon", "SysmonEvent"),
        ("powershell", "Event"),
        ("office365", "OfficeActivity"),
        ("azuread", "AuditLogs"),
        ("azureactivity", "AzureActivity"),
    ]
}

/// The built-in Windows pipeline.
pub fn windows_pipeline() -> Pipeline {
    let mut items: Vec<ProcessingItem> = windows_service_map()
        .iter()
        .map(|(service, table)| ProcessingItem {
            id: Some(format!("kql_windows_{service}")),
            transformation: Transformation::AddLogsourceTable {
                table: (*table).to_string(),
            },
            rule_conditions: vec![RuleCondition::service("windows", service)],
        })
        .collect();

    // schema-level renames shared by all Windows tables
    items.push(ProcessingItem {
        id: Some("kql_field_mapping".to_string()),
        transformation: Transformation::FieldNameMapping {
            mapping: HashMap::new(),
        },
        rule_conditions: Vec::new(),
    });

    // process_creation rules land in SecurityEvent, filtered to the
    // process-creation audit event
    items.push(ProcessingItem {
        id: Some("kql_process_creation_logsource".to_string()),
        transformation: Transformation::AddLogsourceTable {
            table: "SecurityEvent".to_string(),
        },
        rule_conditions: vec![RuleCondition::category("windows", "process_creation")],
    });
    items.push(ProcessingItem {
        id: Some("kql_process_creation_event_id".to_string()),
        transformation: Transformation::AddCondition {
            field: "EventID".to_string(),
            value: LiteralValue::string("4688"),
            negated: false,
        },
        rule_conditions: vec![RuleCondition::category("windows", "process_creation")],
    });

    Pipeline {
        name: "KQL Windows Pipeline".to_string(),
        priority: 20,
        items,
    }
}

/// Derive a table name from a free-form logsource value: capitalize each
/// segment around `-` or `_`, or the whole value when it has uniform case.
pub fn logsource_value_to_table(value: &str) -> String {
    for sep in ['-', '_'] {
        if value.contains(sep) {
            return value
                .split(sep)
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(&sep.to_string());
        }
    }
    let uniform_case = value.chars().all(|c| !c.is_uppercase())
        || value.chars().all(|c| !c.is_lowercase());
    if uniform_case {
        capitalize(value)
    } else {
        value.to_string()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rkql_ast::{ConditionNode, FieldCondition, LogSource, Rule};

    #[test]
    fn test_service_map_covers_known_services() {
        let map: HashMap<_, _> = windows_service_map().iter().copied().collect();
        assert_eq!(map.get("security"), Some(&"SecurityEvent"));
        assert_eq!(map.get("sysmon"), Some(&"SysmonEvent"));
        assert_eq!(map.get("powershell"), Some(&"Event"));
        assert_eq!(map.get("azuread"), Some(&"AuditLogs"));
    }

    #[test]
    fn test_pipeline_injects_table_for_security_service() {
        let mut rule = Rule::new(
            "Test",
            LogSource::service("windows", "security"),
            ConditionNode::leaf(FieldCondition::field_equals("fieldA", "valueA")),
        );
        windows_pipeline().apply(&mut rule);

        let ConditionNode::And(children) = &rule.condition else {
            panic!("expected top-level AND");
        };
        let ConditionNode::Leaf(marker) = &children[0] else {
            panic!("expected marker leaf");
        };
        assert_eq!(
            marker.values[0],
            rkql_ast::LiteralValue::raw_string("SecurityEvent")
        );
    }

    #[test]
    fn test_pipeline_skips_non_windows_rules() {
        let mut rule = Rule::new(
            "Test",
            LogSource::service("linux", "security"),
            ConditionNode::leaf(FieldCondition::field_equals("fieldA", "valueA")),
        );
        let before = rule.clone();
        windows_pipeline().apply(&mut rule);
        assert_eq!(rule, before);
    }

    #[test]
    fn test_process_creation_gets_table_and_event_id() {
        let mut logsource = LogSource::category("process_creation");
        logsource.product = Some("windows".to_string());
        let mut rule = Rule::new(
            "Test",
            logsource,
            ConditionNode::leaf(FieldCondition::field_equals("CommandLine", "whoami")),
        );
        windows_pipeline().apply(&mut rule);

        // outermost injection is the EventID conjunct, marker below it
        let ConditionNode::And(outer) = &rule.condition else {
            panic!("expected top-level AND");
        };
        let ConditionNode::Leaf(event_id) = &outer[0] else {
            panic!("expected EventID leaf");
        };
        assert_eq!(event_id.field.as_deref(), Some("EventID"));

        let ConditionNode::And(inner) = &outer[1] else {
            panic!("expected nested AND");
        };
        let ConditionNode::Leaf(marker) = &inner[0] else {
            panic!("expected marker leaf");
        };
        assert_eq!(
            marker.field.as_deref(),
            Some(crate::config::LOGSOURCE_MARKER_FIELD)
        );
    }

    #[test]
    fn test_logsource_value_to_table() {
        assert_eq!(logsource_value_to_table("security"), "Security");
        assert_eq!(logsource_value_to_table("SECURITY"), "Security");
        assert_eq!(logsource_value_to_table("azure-activity"), "Azure-Activity");
        assert_eq!(logsource_value_to_table("azure_activity"), "Azure_Activity");
        assert_eq!(logsource_value_to_table("OfficeActivity"), "OfficeActivity");
    }
}
