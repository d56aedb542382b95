//! # rkql-ast
//!
//! Condition-tree AST for the rkql translation backend.
//!
//! Detection rules arrive here already parsed: a boolean tree of AND/OR/NOT
//! nodes over field/value comparisons, plus the rule metadata (title,
//! logsource) that pre-processing pipelines consult. Parsing rule text is
//! deliberately out of scope; an upstream collaborator builds the tree.
//!
//! ## Quick Start
//!
//! ```rust
//! use rkql_ast::{ConditionNode, FieldCondition, LogSource, Rule};
//!
//! let condition = ConditionNode::and(vec![
//!     ConditionNode::leaf(FieldCondition::field_equals("fieldA", "valueA")),
//!     ConditionNode::leaf(FieldCondition::field_equals("fieldB", "valueB")),
//! ]);
//! let rule = Rule::new("Test", LogSource::category("test_category"), condition);
//! assert_eq!(rule.title, "Test");
//! ```

pub mod condition;
pub mod rule;
pub mod value;

// Re-export the most commonly used types at crate root
pub use condition::{CompareOperator, Comparison, ConditionNode, FieldCondition, RegexFlag};
pub use rule::{LogSource, Rule};
pub use value::{LiteralValue, PatternString, SpecialChar, StringPart};
