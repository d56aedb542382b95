//! Pipeline transformations that rewrite [`Rule`]s before conversion.
//!
//! Each variant carries its configuration parameters and is applied in
//! place via [`Transformation::apply`]. Transformations are infallible:
//! anything that can go wrong is caught at pipeline parse time or during
//! conversion.

use std::collections::HashMap;
use std::mem;

use rkql_ast::{Comparison, ConditionNode, FieldCondition, LiteralValue, Rule};

use crate::config::LOGSOURCE_MARKER_FIELD;

/// All supported pipeline transformation types.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformation {
    /// Inject the target table as a logsource marker leaf; the backend
    /// converts it into the query prefix.
    AddLogsourceTable { table: String },

    /// Map field names via a lookup table.
    FieldNameMapping { mapping: HashMap<String, String> },

    /// Add a required field=value conjunct to the rule's condition.
    AddCondition {
        field: String,
        value: LiteralValue,
        negated: bool,
    },

    /// Replace logsource fields.
    ChangeLogsource {
        category: Option<String>,
        product: Option<String>,
        service: Option<String>,
    },
}

impl Transformation {
    /// Apply this transformation to a rule, mutating it in place.
    pub fn apply(&self, rule: &mut Rule) {
        match self {
            Transformation::AddLogsourceTable { table } => {
                let marker = ConditionNode::leaf(FieldCondition::new(
                    Some(LOGSOURCE_MARKER_FIELD.to_string()),
                    Comparison::Equals,
                    // no wildcard parsing for table names
                    vec![LiteralValue::raw_string(table)],
                ));
                prepend_conjunct(rule, marker);
            }

            Transformation::FieldNameMapping { mapping } => {
                rule.condition.for_each_leaf_mut(&mut |leaf| {
                    if let Some(name) = &leaf.field {
                        if let Some(mapped) = mapping.get(name) {
                            leaf.field = Some(mapped.clone());
                        }
                    }
                });
            }

            Transformation::AddCondition {
                field,
                value,
                negated,
            } => {
                let leaf = ConditionNode::leaf(FieldCondition::new(
                    Some(field.clone()),
                    Comparison::Equals,
                    vec![value.clone()],
                ));
                let injected = if *negated {
                    ConditionNode::negate(leaf)
                } else {
                    leaf
                };
                prepend_conjunct(rule, injected);
            }

            Transformation::ChangeLogsource {
                category,
                product,
                service,
            } => {
                rule.logsource.category = category.clone();
                rule.logsource.product = product.clone();
                rule.logsource.service = service.clone();
            }
        }
    }
}

/// Wrap the rule's condition in a new top-level AND with `node` first.
fn prepend_conjunct(rule: &mut Rule, node: ConditionNode) {
    let old = mem::replace(&mut rule.condition, ConditionNode::And(Vec::new()));
    rule.condition = ConditionNode::and(vec![node, old]);
}
