//! Condition tree types: boolean nodes over field/value comparisons.
//!
//! The tree is produced by an upstream rule parser and is immutable during
//! a conversion. Pipelines may rebuild it (e.g. wrapping the root in a new
//! AND) before the backend walks it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::LiteralValue;

// =============================================================================
// Comparison kinds
// =============================================================================

/// Numeric comparison operator for the `Compare` kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOperator {
    Lt,
    Lte,
    Gt,
    Gte,
}

/// Regular expression flags carried by a `Regex` comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegexFlag {
    #[serde(rename = "i")]
    IgnoreCase,
    #[serde(rename = "m")]
    Multiline,
    #[serde(rename = "s")]
    DotAll,
}

/// How a leaf compares its field against its values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Comparison {
    /// Plain equality. A wildcard-bearing value falls back to wildcard matching.
    Equals,
    Startswith,
    Endswith,
    Contains,
    /// Explicit wildcard match (value interpreted as a wildcard pattern).
    Wildcard,
    /// Regular expression match with optional flags.
    Regex {
        #[serde(default)]
        flags: Vec<RegexFlag>,
    },
    /// CIDR range membership.
    Cidr,
    /// Numeric comparison (`<`, `<=`, `>`, `>=`).
    Compare { op: CompareOperator },
    /// Field value in a list of literals.
    InList,
    /// Field is present in the event.
    Exists,
    /// Field is absent from the event.
    NotExists,
    /// Field has a null value.
    Null,
}

// =============================================================================
// Nodes
// =============================================================================

/// A leaf comparison: a field (optional; `None` means an unbound keyword
/// match against all fields), a comparison kind, and one or more values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCondition {
    pub field: Option<String>,
    pub comparison: Comparison,
    #[serde(default)]
    pub values: Vec<LiteralValue>,
    /// Case-sensitive string matching (default: case-insensitive).
    #[serde(default)]
    pub cased: bool,
}

impl FieldCondition {
    pub fn new(field: Option<String>, comparison: Comparison, values: Vec<LiteralValue>) -> Self {
        FieldCondition {
            field,
            comparison,
            values,
            cased: false,
        }
    }

    /// Field equality against a single string value.
    pub fn field_equals(field: &str, value: &str) -> Self {
        FieldCondition::new(
            Some(field.to_string()),
            Comparison::Equals,
            vec![LiteralValue::string(value)],
        )
    }
}

/// Parsed condition tree.
///
/// Boolean nodes carry ordered children; leaf nodes carry exactly one
/// comparison kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionNode {
    /// Logical AND of sub-conditions.
    And(Vec<ConditionNode>),
    /// Logical OR of sub-conditions.
    Or(Vec<ConditionNode>),
    /// Logical NOT of a sub-condition.
    Not(Box<ConditionNode>),
    /// A field/value comparison.
    Leaf(FieldCondition),
}

impl ConditionNode {
    pub fn and(children: Vec<ConditionNode>) -> Self {
        ConditionNode::And(children)
    }

    pub fn or(children: Vec<ConditionNode>) -> Self {
        ConditionNode::Or(children)
    }

    pub fn negate(child: ConditionNode) -> Self {
        ConditionNode::Not(Box::new(child))
    }

    pub fn leaf(cond: FieldCondition) -> Self {
        ConditionNode::Leaf(cond)
    }

    /// Walk every leaf mutably (used by pipeline field renames).
    pub fn for_each_leaf_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut FieldCondition),
    {
        match self {
            ConditionNode::And(children) | ConditionNode::Or(children) => {
                for c in children {
                    c.for_each_leaf_mut(f);
                }
            }
            ConditionNode::Not(inner) => inner.for_each_leaf_mut(f),
            ConditionNode::Leaf(cond) => f(cond),
        }
    }
}

impl fmt::Display for ConditionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionNode::And(args) => {
                let parts: Vec<String> = args.iter().map(|a| format!("{a}")).collect();
                write!(f, "({})", parts.join(" and "))
            }
            ConditionNode::Or(args) => {
                let parts: Vec<String> = args.iter().map(|a| format!("{a}")).collect();
                write!(f, "({})", parts.join(" or "))
            }
            ConditionNode::Not(arg) => write!(f, "not {arg}"),
            ConditionNode::Leaf(cond) => {
                let field = cond.field.as_deref().unwrap_or("<keyword>");
                let values: Vec<String> = cond.values.iter().map(|v| format!("{v}")).collect();
                write!(f, "{field}:{}", values.join("|"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_display() {
        let node = ConditionNode::and(vec![
            ConditionNode::leaf(FieldCondition::field_equals("fieldA", "valueA")),
            ConditionNode::negate(ConditionNode::leaf(FieldCondition::field_equals(
                "fieldB", "valueB",
            ))),
        ]);
        assert_eq!(format!("{node}"), "(fieldA:valueA and not fieldB:valueB)");
    }

    #[test]
    fn test_for_each_leaf_mut_visits_all() {
        let mut node = ConditionNode::or(vec![
            ConditionNode::leaf(FieldCondition::field_equals("a", "1")),
            ConditionNode::negate(ConditionNode::leaf(FieldCondition::field_equals("b", "2"))),
        ]);
        let mut seen = Vec::new();
        node.for_each_leaf_mut(&mut |leaf| {
            seen.push(leaf.field.clone().unwrap());
        });
        assert_eq!(seen, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_condition_json_round_trip() {
        let node = ConditionNode::leaf(FieldCondition::new(
            Some("src_ip".to_string()),
            Comparison::Cidr,
            vec![LiteralValue::string("10.0.0.0/8")],
        ));
        let json = serde_json::to_string(&node).unwrap();
        let back: ConditionNode = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }
}
