//! # rkql-backend
//!
//! Translation backend turning [`rkql_ast`] condition trees into KQL
//! (Kusto Query Language) query strings for Azure Log Analytics.
//!
//! ## Architecture
//!
//! - **Configuration** ([`BackendConfig`]): every token, template, and
//!   flag of the target dialect. New dialects are new configuration
//!   values, never new code paths.
//! - **Conversion** ([`KustoBackend`]): a two-phase walk over the
//!   condition tree. The walk renders inline fragments bottom-up; node
//!   kinds that cannot be inlined (logsource markers, and regex/CIDR in
//!   dialects without inline templates) register deferred clauses
//!   instead. Finalization assembles prefix, body, and deferred suffix.
//! - **Pipelines** ([`pipeline`]): pre-processing passes that rewrite a
//!   rule before conversion, e.g. mapping a Windows logsource onto its
//!   Log Analytics table.
//!
//! ## Quick Start
//!
//! ```rust
//! use rkql_ast::{ConditionNode, FieldCondition, LogSource, Rule};
//! use rkql_backend::KustoBackend;
//!
//! let condition = ConditionNode::and(vec![
//!     ConditionNode::leaf(FieldCondition::field_equals("fieldA", "valueA")),
//!     ConditionNode::leaf(FieldCondition::field_equals("fieldB", "valueB")),
//! ]);
//! let rule = Rule::new("Test", LogSource::category("test_category"), condition);
//!
//! let backend = KustoBackend::new();
//! let query = backend.convert_rule(&rule).unwrap();
//! assert_eq!(
//!     query,
//!     "union *\n| where (fieldA =~ \"valueA\" and fieldB =~ \"valueB\")"
//! );
//! ```
//!
//! ## With the Windows pipeline
//!
//! ```rust
//! use rkql_ast::{ConditionNode, FieldCondition, LogSource, Rule};
//! use rkql_backend::{KustoBackend, pipeline::windows_pipeline};
//!
//! let mut rule = Rule::new(
//!     "Test",
//!     LogSource::service("windows", "security"),
//!     ConditionNode::leaf(FieldCondition::field_equals("EventID", "4688")),
//! );
//! windows_pipeline().apply(&mut rule);
//!
//! let query = KustoBackend::new().convert_rule(&rule).unwrap();
//! assert!(query.starts_with("SecurityEvent\n| where "));
//! ```

pub mod config;
pub mod convert;
pub mod deferred;
pub mod error;
pub mod pipeline;
pub mod precedence;
pub mod quote;

pub use config::{BackendConfig, LOGSOURCE_MARKER_FIELD};
pub use convert::KustoBackend;
pub use deferred::{ConversionState, DeferredClause};
pub use error::{BackendError, Result};
