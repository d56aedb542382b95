//! Rule metadata consumed by the backend and pipelines.

use serde::{Deserialize, Serialize};

use crate::condition::ConditionNode;

/// Log source specification attached to a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSource {
    pub category: Option<String>,
    pub product: Option<String>,
    pub service: Option<String>,
}

impl LogSource {
    pub fn category(name: &str) -> Self {
        LogSource {
            category: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn service(product: &str, service: &str) -> Self {
        LogSource {
            product: Some(product.to_string()),
            service: Some(service.to_string()),
            ..Default::default()
        }
    }
}

/// A detection rule: metadata plus an already-parsed condition tree.
///
/// The rule object model and its YAML loading live upstream; this is the
/// slice the translation backend consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub title: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub logsource: LogSource,
    pub condition: ConditionNode,
}

impl Rule {
    pub fn new(title: &str, logsource: LogSource, condition: ConditionNode) -> Self {
        Rule {
            title: title.to_string(),
            id: None,
            logsource,
            condition,
        }
    }
}
