//! Pipeline-to-query tests: rules rewritten by a pipeline and then
//! converted end to end.

use rkql_ast::{ConditionNode, FieldCondition, LogSource, Rule};
use rkql_backend::KustoBackend;
use rkql_backend::pipeline::{parse_pipeline, windows_pipeline};

fn leaf_eq(field: &str, value: &str) -> ConditionNode {
    ConditionNode::leaf(FieldCondition::field_equals(field, value))
}

#[test]
fn test_windows_security_rule_selects_security_event_table() {
    let mut rule = Rule::new(
        "Failed Logon",
        LogSource::service("windows", "security"),
        ConditionNode::and(vec![leaf_eq("fieldA", "valueA"), leaf_eq("fieldB", "valueB")]),
    );
    windows_pipeline().apply(&mut rule);

    let query = KustoBackend::new().convert_rule(&rule).unwrap();
    assert_eq!(
        query,
        "SecurityEvent\n| where ((fieldA =~ \"valueA\" and fieldB =~ \"valueB\"))"
    );
}

#[test]
fn test_windows_sysmon_rule_selects_sysmon_event_table() {
    let mut rule = Rule::new(
        "Sysmon Rule",
        LogSource::service("windows", "sysmon"),
        leaf_eq("Image", "cmd.exe"),
    );
    windows_pipeline().apply(&mut rule);

    let query = KustoBackend::new().convert_rule(&rule).unwrap();
    assert_eq!(query, "SysmonEvent\n| where (Image =~ \"cmd.exe\")");
}

#[test]
fn test_process_creation_rule_gets_event_id_conjunct() {
    let mut logsource = LogSource::category("process_creation");
    logsource.product = Some("windows".to_string());
    let mut rule = Rule::new(
        "Process Creation",
        logsource,
        leaf_eq("CommandLine", "whoami"),
    );
    windows_pipeline().apply(&mut rule);

    let query = KustoBackend::new().convert_rule(&rule).unwrap();
    assert_eq!(
        query,
        "SecurityEvent\n| where (EventID =~ \"4688\" and (CommandLine =~ \"whoami\"))"
    );
}

#[test]
fn test_unmatched_rule_falls_back_to_union() {
    let mut rule = Rule::new(
        "Linux Rule",
        LogSource::service("linux", "auditd"),
        leaf_eq("fieldA", "valueA"),
    );
    windows_pipeline().apply(&mut rule);

    let query = KustoBackend::new().convert_rule(&rule).unwrap();
    assert_eq!(query, "union *\n| where (fieldA =~ \"valueA\")");
}

#[test]
fn test_yaml_pipeline_end_to_end() {
    let yaml = r#"
name: Custom Mapping
priority: 10
transformations:
  - id: select_table
    type: add_logsource_table
    table: CustomLogs
    rule_conditions:
      - type: logsource
        product: custom
  - id: rename
    type: field_name_mapping
    mapping:
      cmd: CommandLine
"#;
    let pipeline = parse_pipeline(yaml).unwrap();

    let mut logsource = LogSource::default();
    logsource.product = Some("custom".to_string());
    let mut rule = Rule::new("Custom", logsource, leaf_eq("cmd", "whoami"));
    pipeline.apply(&mut rule);

    let query = KustoBackend::new().convert_rule(&rule).unwrap();
    assert_eq!(query, "CustomLogs\n| where (CommandLine =~ \"whoami\")");
}
