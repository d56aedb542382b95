//! Backend configuration: the tokens, templates, and flags that
//! parameterize every formatter call.
//!
//! One immutable [`BackendConfig`] instance describes one target dialect.
//! New dialects are new configuration values, not new types; the converter
//! algorithm never changes per dialect. [`BackendConfig::kusto`] is the
//! Azure Log Analytics / KQL dialect.

use std::collections::HashMap;

use regex::Regex;

use rkql_ast::{CompareOperator, RegexFlag};

/// Field name injected by the logsource pipeline transformation and
/// intercepted by the converter as a table-selection marker.
pub const LOGSOURCE_MARKER_FIELD: &str = "__kql_logsource";

/// Immutable set of format strings, tokens, and flags describing one
/// target query dialect.
///
/// Shared read-only across conversions; each conversion carries its own
/// mutable state separately.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Human-readable backend name.
    pub name: String,

    // Boolean operator tokens
    /// Separator inserted around boolean operators.
    pub token_separator: String,
    pub or_token: String,
    pub and_token: String,
    pub not_token: String,
    /// Token inserted between field and value, separators included.
    pub eq_token: String,
    /// Grouping template with `{expr}` placeholder.
    pub group_expression: String,
    /// Group every boolean child regardless of precedence, and wrap the
    /// top-level body once before deferral.
    pub parenthesize: bool,
    /// Emit the main expression as a deferred `where` stage (pipe dialects)
    /// instead of leaving it inline.
    pub defer_main_expression: bool,

    // Field name quoting
    /// Quote character for field names.
    pub field_quote: String,
    /// Field names are quoted depending on whether this pattern matches.
    pub field_quote_pattern: Regex,
    /// If true, quote when the pattern does NOT match.
    pub field_quote_pattern_negation: bool,
    /// Wrap quoted field names in a `[...]` bracket pair. Applied only
    /// when the base quoting fired.
    pub field_bracket_quoted: bool,
    /// Escape string prepended to every match of `field_escape_pattern`.
    pub field_escape: String,
    pub field_escape_pattern: Option<Regex>,

    // Value quoting
    pub str_quote: char,
    pub escape_char: char,
    pub wildcard_multi: char,
    pub wildcard_single: char,
    /// Characters escaped in addition to the quote and escape characters.
    pub add_escaped: String,
    /// Characters removed from string values entirely.
    pub filter_chars: String,
    pub bool_true: String,
    pub bool_false: String,

    // String matching templates ({field}, {value})
    pub startswith_expression: Option<String>,
    pub endswith_expression: Option<String>,
    pub contains_expression: Option<String>,
    /// Used when wildcards can't be matched with the eq token.
    pub wildcard_match_expression: Option<String>,
    pub case_sensitive_match_expression: Option<String>,
    pub case_sensitive_startswith_expression: Option<String>,
    pub case_sensitive_endswith_expression: Option<String>,
    pub case_sensitive_contains_expression: Option<String>,

    // Regular expressions ({field}, {regex})
    /// Inline regex template. `None` routes regex comparisons through the
    /// deferred-clause collector via `deferred_re_expression`.
    pub re_expression: Option<String>,
    pub re_escape_char: char,
    /// Characters escaped inside regex patterns.
    pub re_escape: Vec<char>,
    /// Also escape the regex escape character itself.
    pub re_escape_escape_char: bool,
    /// Prepend flags as a `(?ims)` style group.
    pub re_flag_prefix: bool,
    /// Flag-to-token table. A requested flag missing here fails the
    /// conversion instead of being dropped.
    pub re_flags: HashMap<RegexFlag, String>,
    /// Deferred regex fragment template ({field}, {regex}); consulted only
    /// when `re_expression` is `None`.
    pub deferred_re_expression: Option<String>,

    // CIDR ({field}, {value})
    /// Inline CIDR template. `None` routes CIDR comparisons through the
    /// deferred-clause collector via `deferred_cidr_expression`.
    pub cidr_expression: Option<String>,
    pub deferred_cidr_expression: Option<String>,

    // Numeric comparison ({field}, {operator}, {value})
    pub compare_op_expression: String,

    // Null / existence ({field})
    pub field_null_expression: String,
    pub field_exists_expression: String,
    /// If `None`, field non-existence negates `field_exists_expression`.
    pub field_not_exists_expression: Option<String>,

    // Field-in-list
    /// Collapse eligible OR nodes into in-expressions.
    pub convert_or_as_in: bool,
    /// Allow wildcard values inside in-expressions.
    pub in_expressions_allow_wildcards: bool,
    /// Template with {field}, {op}, {list} placeholders.
    pub field_in_list_expression: String,
    pub or_in_operator: String,
    pub list_separator: String,

    // Unbound values ({value})
    pub unbound_value_str_expression: String,
    pub unbound_value_num_expression: String,
    pub unbound_value_re_expression: String,

    // Deferred query parts
    /// Separator between the main query and the first deferred part.
    pub deferred_start: String,
    /// Separator between deferred parts.
    pub deferred_separator: String,
    /// Query prefix when only deferred expressions remain.
    pub deferred_only_query: String,
    /// Deferred clause templates ({op}, {value}).
    pub deferred_where_template: String,
    pub deferred_re_template: String,
    pub deferred_cidr_template: String,
    /// `{op}` token for negated deferred clauses.
    pub deferred_not_operator: String,

    /// Marker field name converted into a logsource deferred clause.
    pub logsource_marker_field: String,
}

impl BackendConfig {
    /// The Azure Log Analytics / KQL dialect.
    pub fn kusto() -> Self {
        let token_separator = " ".to_string();
        let mut re_flags = HashMap::new();
        re_flags.insert(RegexFlag::IgnoreCase, "i".to_string());
        re_flags.insert(RegexFlag::Multiline, "m".to_string());
        re_flags.insert(RegexFlag::DotAll, "s".to_string());

        BackendConfig {
            name: "Kusto backend".to_string(),

            eq_token: format!("{token_separator}=~{token_separator}"),
            or_token: "or".to_string(),
            and_token: "and".to_string(),
            not_token: "not".to_string(),
            group_expression: "({expr})".to_string(),
            parenthesize: true,
            defer_main_expression: true,
            token_separator,

            field_quote: "'".to_string(),
            // quote anything that is not purely word characters
            field_quote_pattern: Regex::new(r"^\w+$").expect("static pattern"),
            field_quote_pattern_negation: true,
            field_bracket_quoted: true,
            field_escape: "\\".to_string(),
            field_escape_pattern: Some(Regex::new(r"\\").expect("static pattern")),

            str_quote: '"',
            escape_char: '\\',
            wildcard_multi: '*',
            wildcard_single: '*',
            add_escaped: String::new(),
            filter_chars: String::new(),
            bool_true: "true".to_string(),
            bool_false: "false".to_string(),

            startswith_expression: Some("{field} startswith {value}".to_string()),
            endswith_expression: Some("{field} endswith {value}".to_string()),
            contains_expression: Some("{field} contains {value}".to_string()),
            wildcard_match_expression: Some("{field} match {value}".to_string()),
            case_sensitive_match_expression: Some("{field} casematch {value}".to_string()),
            case_sensitive_startswith_expression: Some(
                "{field} casematch_startswith {value}".to_string(),
            ),
            case_sensitive_endswith_expression: Some(
                "{field} casematch_endswith {value}".to_string(),
            ),
            case_sensitive_contains_expression: Some(
                "{field} casematch_contains {value}".to_string(),
            ),

            re_expression: Some("{field} matches regex \"{regex}\"".to_string()),
            re_escape_char: '\\',
            re_escape: Vec::new(),
            re_escape_escape_char: true,
            re_flag_prefix: true,
            re_flags,
            deferred_re_expression: None,

            cidr_expression: Some("ipv4_is_in_range({field}, \"{value}\")".to_string()),
            deferred_cidr_expression: None,

            compare_op_expression: "{field} {operator} {value}".to_string(),

            field_null_expression: "{field} is null".to_string(),
            field_exists_expression: "exists({field})".to_string(),
            field_not_exists_expression: Some("notexists({field})".to_string()),

            convert_or_as_in: true,
            in_expressions_allow_wildcards: true,
            field_in_list_expression: "{field} {op} ({list})".to_string(),
            or_in_operator: "in".to_string(),
            list_separator: ", ".to_string(),

            unbound_value_str_expression: "[\"*\"] contains {value}".to_string(),
            unbound_value_num_expression: "[\"*\"] contains \"{value}\"".to_string(),
            unbound_value_re_expression: "_=~{value}".to_string(),

            deferred_start: "\n| ".to_string(),
            deferred_separator: "\n| ".to_string(),
            deferred_only_query: "union *".to_string(),
            deferred_where_template: "where {op}{value}".to_string(),
            deferred_re_template: "where {op}{value}".to_string(),
            deferred_cidr_template: "where {op}{value}".to_string(),
            deferred_not_operator: "not".to_string(),

            logsource_marker_field: LOGSOURCE_MARKER_FIELD.to_string(),
        }
    }

    /// Replacement string for a numeric comparison operator.
    pub fn compare_operator(&self, op: CompareOperator) -> &'static str {
        match op {
            CompareOperator::Lt => "<",
            CompareOperator::Lte => "<=",
            CompareOperator::Gt => ">",
            CompareOperator::Gte => ">=",
        }
    }

    /// Wrap an expression in the grouping template.
    pub fn group(&self, expr: &str) -> String {
        self.group_expression.replace("{expr}", expr)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::kusto()
    }
}

/// Fill a template's `{placeholder}` slots.
pub(crate) fn fill(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in pairs {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kusto_tokens() {
        let cfg = BackendConfig::kusto();
        assert_eq!(cfg.eq_token, " =~ ");
        assert_eq!(cfg.deferred_only_query, "union *");
        assert!(cfg.parenthesize);
        assert!(cfg.re_expression.is_some());
    }

    #[test]
    fn test_group() {
        let cfg = BackendConfig::kusto();
        assert_eq!(cfg.group("a or b"), "(a or b)");
    }

    #[test]
    fn test_fill() {
        assert_eq!(
            fill("{field} {op} ({list})", &[("field", "f"), ("op", "in"), ("list", "1, 2")]),
            "f in (1, 2)"
        );
    }
}
