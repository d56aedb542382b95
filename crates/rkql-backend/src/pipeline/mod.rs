//! Pre-processing pipelines that rewrite rules before conversion.
//!
//! Pipelines are parsed from YAML (or built in code, like the Windows
//! pipeline) and applied to [`Rule`]s before the backend walks the
//! condition tree: injecting logsource tables, renaming fields, adding
//! required conjuncts.
//!
//! # Example
//!
//! ```rust
//! use rkql_backend::pipeline::parse_pipeline;
//!
//! let yaml = r#"
//! name: Custom Field Mapping
//! priority: 10
//! transformations:
//!   - id: rename_command_line
//!     type: field_name_mapping
//!     mapping:
//!       CommandLine: ProcessCommandLine
//!     rule_conditions:
//!       - type: logsource
//!         product: windows
//! "#;
//!
//! let pipeline = parse_pipeline(yaml).unwrap();
//! assert_eq!(pipeline.name, "Custom Field Mapping");
//! ```

pub mod conditions;
pub mod transformations;
pub mod windows;

use std::collections::HashMap;
use std::path::Path;

use rkql_ast::{LiteralValue, Rule};

use crate::error::{BackendError, Result};

pub use conditions::{RuleCondition, all_rule_conditions_match};
pub use transformations::Transformation;
pub use windows::{logsource_value_to_table, windows_pipeline, windows_service_map};

// =============================================================================
// Pipeline types
// =============================================================================

/// A processing pipeline: ordered transformations with gating conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    /// Pipeline name.
    pub name: String,
    /// Priority (lower runs first). Default: 0.
    pub priority: i32,
    /// Ordered list of transformations with their conditions.
    pub items: Vec<ProcessingItem>,
}

/// A single transformation with its gating conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingItem {
    /// Optional ID for diagnostics.
    pub id: Option<String>,
    /// The transformation to apply.
    pub transformation: Transformation,
    /// Rule-level conditions; all must match for the item to fire.
    pub rule_conditions: Vec<RuleCondition>,
}

impl Pipeline {
    /// Apply this pipeline to a rule, mutating it in place.
    pub fn apply(&self, rule: &mut Rule) {
        for item in &self.items {
            if !all_rule_conditions_match(&item.rule_conditions, rule) {
                continue;
            }
            item.transformation.apply(rule);
        }
    }
}

/// Apply several pipelines in priority order (ties keep argument order).
pub fn apply_pipelines(pipelines: &[Pipeline], rule: &mut Rule) {
    let mut ordered: Vec<&Pipeline> = pipelines.iter().collect();
    ordered.sort_by_key(|p| p.priority);
    for pipeline in ordered {
        pipeline.apply(rule);
    }
}

// =============================================================================
// YAML parsing
// =============================================================================

/// Parse a pipeline from a YAML string.
pub fn parse_pipeline(yaml: &str) -> Result<Pipeline> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    parse_pipeline_value(&value)
}

/// Parse a pipeline from a YAML file.
pub fn parse_pipeline_file(path: &Path) -> Result<Pipeline> {
    let content = std::fs::read_to_string(path)?;
    parse_pipeline(&content)
}

fn parse_pipeline_value(value: &serde_yaml::Value) -> Result<Pipeline> {
    let obj = value
        .as_mapping()
        .ok_or_else(|| BackendError::InvalidPipeline("pipeline YAML must be a mapping".to_string()))?;

    let name = obj
        .get(ykey("name"))
        .and_then(|v| v.as_str())
        .unwrap_or("unnamed")
        .to_string();

    let priority = obj
        .get(ykey("priority"))
        .and_then(|v| v.as_i64())
        .unwrap_or(0) as i32;

    let items = if let Some(items) = obj.get(ykey("transformations")) {
        parse_processing_items(items)?
    } else {
        Vec::new()
    };

    Ok(Pipeline {
        name,
        priority,
        items,
    })
}

fn ykey(s: &str) -> serde_yaml::Value {
    serde_yaml::Value::String(s.to_string())
}

fn parse_processing_items(value: &serde_yaml::Value) -> Result<Vec<ProcessingItem>> {
    let items = value.as_sequence().ok_or_else(|| {
        BackendError::InvalidPipeline("transformations must be a sequence".to_string())
    })?;
    items.iter().map(parse_processing_item).collect()
}

fn parse_processing_item(value: &serde_yaml::Value) -> Result<ProcessingItem> {
    let obj = value.as_mapping().ok_or_else(|| {
        BackendError::InvalidPipeline("transformation item must be a mapping".to_string())
    })?;

    let id = obj
        .get(ykey("id"))
        .and_then(|v| v.as_str())
        .map(String::from);

    let transformation = parse_transformation(obj)?;

    let rule_conditions = if let Some(conds) = obj.get(ykey("rule_conditions")) {
        parse_rule_conditions(conds)?
    } else {
        Vec::new()
    };

    Ok(ProcessingItem {
        id,
        transformation,
        rule_conditions,
    })
}

fn parse_transformation(obj: &serde_yaml::Mapping) -> Result<Transformation> {
    let type_str = obj
        .get(ykey("type"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            BackendError::InvalidPipeline("transformation must have a 'type' field".to_string())
        })?;

    match type_str {
        "add_logsource_table" => {
            let table = obj
                .get(ykey("table"))
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    BackendError::InvalidPipeline(
                        "add_logsource_table requires a 'table' string".to_string(),
                    )
                })?
                .to_string();
            Ok(Transformation::AddLogsourceTable { table })
        }

        "field_name_mapping" => {
            let mapping = parse_string_mapping(obj.get(ykey("mapping")))?;
            Ok(Transformation::FieldNameMapping { mapping })
        }

        "add_condition" => {
            let field = obj
                .get(ykey("field"))
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    BackendError::InvalidPipeline(
                        "add_condition requires a 'field' string".to_string(),
                    )
                })?
                .to_string();
            let value = obj.get(ykey("value")).ok_or_else(|| {
                BackendError::InvalidPipeline("add_condition requires a 'value'".to_string())
            })?;
            let value = parse_literal(value)?;
            let negated = obj
                .get(ykey("negated"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            Ok(Transformation::AddCondition {
                field,
                value,
                negated,
            })
        }

        "change_logsource" => Ok(Transformation::ChangeLogsource {
            category: yaml_str(obj, "category"),
            product: yaml_str(obj, "product"),
            service: yaml_str(obj, "service"),
        }),

        other => Err(BackendError::InvalidPipeline(format!(
            "unknown transformation type: {other}"
        ))),
    }
}

fn parse_rule_conditions(value: &serde_yaml::Value) -> Result<Vec<RuleCondition>> {
    let items = value.as_sequence().ok_or_else(|| {
        BackendError::InvalidPipeline("rule_conditions must be a sequence".to_string())
    })?;

    items
        .iter()
        .map(|item| {
            let obj = item.as_mapping().ok_or_else(|| {
                BackendError::InvalidPipeline("rule condition must be a mapping".to_string())
            })?;
            let type_str = obj
                .get(ykey("type"))
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    BackendError::InvalidPipeline(
                        "rule condition must have a 'type' field".to_string(),
                    )
                })?;
            match type_str {
                "logsource" => Ok(RuleCondition::Logsource {
                    category: yaml_str(obj, "category"),
                    product: yaml_str(obj, "product"),
                    service: yaml_str(obj, "service"),
                }),
                other => Err(BackendError::InvalidPipeline(format!(
                    "unknown rule condition type: {other}"
                ))),
            }
        })
        .collect()
}

fn parse_string_mapping(value: Option<&serde_yaml::Value>) -> Result<HashMap<String, String>> {
    let mut mapping = HashMap::new();
    let Some(value) = value else {
        return Ok(mapping);
    };
    let obj = value
        .as_mapping()
        .ok_or_else(|| BackendError::InvalidPipeline("'mapping' must be a mapping".to_string()))?;
    for (k, v) in obj {
        let (Some(key), Some(val)) = (k.as_str(), v.as_str()) else {
            return Err(BackendError::InvalidPipeline(
                "'mapping' entries must be string-to-string".to_string(),
            ));
        };
        mapping.insert(key.to_string(), val.to_string());
    }
    Ok(mapping)
}

fn parse_literal(value: &serde_yaml::Value) -> Result<LiteralValue> {
    match value {
        serde_yaml::Value::String(s) => Ok(LiteralValue::string(s)),
        serde_yaml::Value::Bool(b) => Ok(LiteralValue::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(LiteralValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(LiteralValue::Float(f))
            } else {
                Err(BackendError::InvalidPipeline(format!(
                    "unsupported numeric value: {n}"
                )))
            }
        }
        other => Err(BackendError::InvalidPipeline(format!(
            "unsupported condition value: {other:?}"
        ))),
    }
}

fn yaml_str(obj: &serde_yaml::Mapping, key: &str) -> Option<String> {
    obj.get(ykey(key)).and_then(|v| v.as_str()).map(String::from)
}
