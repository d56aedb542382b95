//! The condition tree walker: renders a [`ConditionNode`] tree into a KQL
//! query string.
//!
//! Conversion is two-phase. The walk renders inline fragments bottom-up,
//! consulting the precedence resolver for grouping and the quoting engine
//! for literals; some node kinds register a deferred clause on the
//! conversion state instead of returning text. Finalization then assembles
//! prefix + inline body + deferred suffix into the output string.
//!
//! The walker is pure over its inputs: converting the same tree with the
//! same configuration twice yields byte-identical output.

use rkql_ast::{
    Comparison, ConditionNode, FieldCondition, LiteralValue, PatternString, Rule, SpecialChar,
    StringPart,
};

use crate::config::{BackendConfig, fill};
use crate::deferred::{ConversionState, DeferredClause};
use crate::error::{BackendError, Result};
use crate::precedence::{BoolOp, needs_grouping};
use crate::quote::{escape_regex, quote_field, quote_string, quote_value, regex_flag_prefix};

/// Result of rendering one node: inline text, or a sentinel meaning the
/// node registered a deferred clause and contributes nothing inline.
enum Fragment {
    Inline(String),
    Deferred,
}

/// A configuration-parameterized query backend.
///
/// One instance per dialect; immutable and shareable across threads. Each
/// conversion call owns its own [`ConversionState`].
#[derive(Debug, Clone, Default)]
pub struct KustoBackend {
    config: BackendConfig,
}

impl KustoBackend {
    /// Backend with the default KQL dialect configuration.
    pub fn new() -> Self {
        Self::with_config(BackendConfig::kusto())
    }

    pub fn with_config(config: BackendConfig) -> Self {
        KustoBackend { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Output format names this backend provides.
    pub fn formats(&self) -> &'static [&'static str] {
        &["default"]
    }

    /// Convert a single rule into a query string.
    pub fn convert_rule(&self, rule: &Rule) -> Result<String> {
        let mut state = ConversionState::new();
        let mut inline = None;

        match self.convert_node(&rule.condition, &mut state)? {
            Fragment::Inline(text) => {
                let body = if self.config.parenthesize {
                    self.config.group(&text)
                } else {
                    text
                };
                if self.config.defer_main_expression {
                    state.push(DeferredClause::Where {
                        negated: false,
                        text: body,
                    });
                } else {
                    inline = Some(body);
                }
            }
            Fragment::Deferred => {}
        }

        self.finalize(&rule.title, inline, state)
    }

    /// Convert a rule for a named output format.
    pub fn convert_rule_format(&self, rule: &Rule, format: &str) -> Result<String> {
        if !self.formats().contains(&format) {
            return Err(BackendError::UnknownFormat(format.to_string()));
        }
        self.convert_rule(rule)
    }

    /// Convert a batch of rules, one result per rule in input order.
    ///
    /// A failing rule does not affect the others; the caller decides how
    /// to report per-rule errors.
    pub fn convert_rules(&self, rules: &[Rule]) -> Vec<Result<String>> {
        rules.iter().map(|r| self.convert_rule(r)).collect()
    }

    // -------------------------------------------------------------------
    // Tree walk
    // -------------------------------------------------------------------

    fn convert_node(&self, node: &ConditionNode, state: &mut ConversionState) -> Result<Fragment> {
        match node {
            ConditionNode::And(children) => self.convert_and(children, state),
            ConditionNode::Or(children) => self.convert_or(children, state),
            ConditionNode::Not(inner) => self.convert_not(inner, state),
            ConditionNode::Leaf(cond) => self.convert_leaf(cond, state),
        }
    }

    /// The boolean operator a node renders as, accounting for multi-value
    /// leaf expansion. Used for the parent's grouping decision. `None`
    /// means the rendering never needs grouping.
    fn effective_op(&self, node: &ConditionNode) -> Option<BoolOp> {
        match node {
            ConditionNode::And(_) => Some(BoolOp::And),
            ConditionNode::Or(_) => Some(BoolOp::Or),
            ConditionNode::Not(_) => Some(BoolOp::Not),
            ConditionNode::Leaf(cond) => {
                if cond.values.len() > 1 && Self::expands_to_or(&cond.comparison) {
                    Some(BoolOp::Or)
                } else {
                    None
                }
            }
        }
    }

    /// Leaf kinds whose multiple values expand into an OR of single-value
    /// leaves before conversion.
    fn expands_to_or(comparison: &Comparison) -> bool {
        !matches!(
            comparison,
            Comparison::InList | Comparison::Exists | Comparison::NotExists | Comparison::Null
        )
    }

    fn convert_and(&self, children: &[ConditionNode], state: &mut ConversionState) -> Result<Fragment> {
        if children.is_empty() {
            return Err(BackendError::UnsupportedFeature(
                "empty AND condition".to_string(),
            ));
        }
        let mut parts = Vec::with_capacity(children.len());
        for child in children {
            let child_op = self.effective_op(child);
            match self.convert_node(child, state)? {
                Fragment::Inline(text) => {
                    let grouped = match child_op {
                        Some(op) if needs_grouping(op, BoolOp::And, self.config.parenthesize) => {
                            self.config.group(&text)
                        }
                        _ => text,
                    };
                    parts.push(grouped);
                }
                // deferred children AND-compose by construction
                Fragment::Deferred => {}
            }
        }
        if parts.is_empty() {
            return Ok(Fragment::Deferred);
        }
        let sep = &self.config.token_separator;
        let joiner = format!("{sep}{}{sep}", self.config.and_token);
        Ok(Fragment::Inline(parts.join(&joiner)))
    }

    fn convert_or(&self, children: &[ConditionNode], state: &mut ConversionState) -> Result<Fragment> {
        if children.is_empty() {
            return Err(BackendError::UnsupportedFeature(
                "empty OR condition".to_string(),
            ));
        }

        // OR→IN collapse, applied before precedence grouping
        if let Some(collapsed) = self.try_in_collapse(children) {
            return Ok(Fragment::Inline(collapsed));
        }

        let mut parts = Vec::with_capacity(children.len());
        for child in children {
            let child_op = self.effective_op(child);
            match self.convert_node(child, state)? {
                Fragment::Inline(text) => {
                    let grouped = match child_op {
                        Some(op) if needs_grouping(op, BoolOp::Or, self.config.parenthesize) => {
                            self.config.group(&text)
                        }
                        _ => text,
                    };
                    parts.push(grouped);
                }
                Fragment::Deferred => {
                    // deferred clauses are joined by pipes, which can only
                    // express AND composition
                    return Err(BackendError::UnsupportedFeature(
                        "deferred expressions cannot be OR-combined".to_string(),
                    ));
                }
            }
        }
        let sep = &self.config.token_separator;
        let joiner = format!("{sep}{}{sep}", self.config.or_token);
        Ok(Fragment::Inline(parts.join(&joiner)))
    }

    fn convert_not(&self, inner: &ConditionNode, state: &mut ConversionState) -> Result<Fragment> {
        let before = state.len();
        match self.convert_node(inner, state)? {
            Fragment::Inline(text) => {
                // negating a subtree that also registered deferred clauses
                // would leave those clauses un-negated in the pipe suffix
                if state.len() > before {
                    return Err(BackendError::UnsupportedFeature(
                        "cannot negate an expression mixing deferred and inline parts".to_string(),
                    ));
                }
                Ok(Fragment::Inline(format!(
                    "{}{}{}",
                    self.config.not_token,
                    self.config.token_separator,
                    self.config.group(&text)
                )))
            }
            Fragment::Deferred => {
                // deferred clauses AND-compose; negating several at once
                // cannot be expressed across separate pipe stages
                if state.len() != before + 1 {
                    return Err(BackendError::UnsupportedFeature(
                        "cannot negate more than one deferred expression".to_string(),
                    ));
                }
                if !state.negate_last() {
                    return Err(BackendError::UnsupportedFeature(
                        "cannot negate a logsource selection".to_string(),
                    ));
                }
                Ok(Fragment::Deferred)
            }
        }
    }

    // -------------------------------------------------------------------
    // Leaf rendering
    // -------------------------------------------------------------------

    fn convert_leaf(&self, cond: &FieldCondition, state: &mut ConversionState) -> Result<Fragment> {
        // logsource marker injected by the pipeline: becomes the table prefix
        if cond.field.as_deref() == Some(self.config.logsource_marker_field.as_str()) {
            let table = cond
                .values
                .first()
                .map(|v| v.to_string())
                .ok_or_else(|| {
                    BackendError::UnsupportedFeature("logsource marker without a table".to_string())
                })?;
            state.push(DeferredClause::Logsource { table });
            return Ok(Fragment::Deferred);
        }

        // multiple values expand to an OR of single-value leaves so that
        // grouping and OR→IN collapse apply uniformly
        if cond.values.len() > 1 && Self::expands_to_or(&cond.comparison) {
            let expanded: Vec<ConditionNode> = cond
                .values
                .iter()
                .map(|v| {
                    ConditionNode::Leaf(FieldCondition {
                        field: cond.field.clone(),
                        comparison: cond.comparison.clone(),
                        values: vec![v.clone()],
                        cased: cond.cased,
                    })
                })
                .collect();
            return self.convert_or(&expanded, state);
        }

        if cond.field.is_none() {
            return self.convert_unbound(cond).map(Fragment::Inline);
        }
        let field = quote_field(&self.config, cond.field.as_deref().unwrap_or_default());

        match &cond.comparison {
            Comparison::Equals => {
                let value = Self::single_value(cond)?;
                Ok(Fragment::Inline(self.render_eq(&field, value, cond.cased)))
            }
            Comparison::Wildcard => {
                let value = Self::single_value(cond)?;
                Ok(Fragment::Inline(self.render_wildcard(
                    &field,
                    value,
                    cond.cased,
                )))
            }
            Comparison::Startswith => {
                let value = Self::single_value(cond)?;
                Ok(Fragment::Inline(self.render_affix(
                    &field, value, cond.cased, false, true,
                )))
            }
            Comparison::Endswith => {
                let value = Self::single_value(cond)?;
                Ok(Fragment::Inline(self.render_affix(
                    &field, value, cond.cased, true, false,
                )))
            }
            Comparison::Contains => {
                let value = Self::single_value(cond)?;
                Ok(Fragment::Inline(self.render_affix(
                    &field, value, cond.cased, true, true,
                )))
            }
            Comparison::Regex { flags } => {
                let value = Self::single_value(cond)?;
                let pattern = match value {
                    LiteralValue::String(s) => s.original.as_str(),
                    _ => {
                        return Err(BackendError::UnsupportedFeature(
                            "regex comparison requires a string pattern".to_string(),
                        ));
                    }
                };
                let prefix = regex_flag_prefix(&self.config, flags)?;
                let regex = format!("{prefix}{}", escape_regex(&self.config, pattern));
                if let Some(template) = &self.config.re_expression {
                    return Ok(Fragment::Inline(fill(
                        template,
                        &[("field", &field), ("regex", &regex)],
                    )));
                }
                let template = self.config.deferred_re_expression.as_ref().ok_or_else(|| {
                    BackendError::UnsupportedFeature(
                        "regex matching is not supported by this backend".to_string(),
                    )
                })?;
                state.push(DeferredClause::Regex {
                    negated: false,
                    text: fill(template, &[("field", &field), ("regex", &regex)]),
                });
                Ok(Fragment::Deferred)
            }
            Comparison::Cidr => {
                let value = Self::single_value(cond)?;
                let cidr = match value {
                    LiteralValue::String(s) => s.as_plain().ok_or_else(|| {
                        BackendError::UnsupportedFeature(
                            "wildcards are not allowed in CIDR values".to_string(),
                        )
                    })?,
                    _ => {
                        return Err(BackendError::UnsupportedFeature(
                            "CIDR comparison requires a string value".to_string(),
                        ));
                    }
                };
                // validate before rendering
                cidr.parse::<ipnet::IpNet>()?;
                if let Some(template) = &self.config.cidr_expression {
                    return Ok(Fragment::Inline(fill(
                        template,
                        &[("field", &field), ("value", &cidr)],
                    )));
                }
                let template = self
                    .config
                    .deferred_cidr_expression
                    .as_ref()
                    .ok_or_else(|| {
                        BackendError::UnsupportedFeature(
                            "CIDR matching is not supported by this backend".to_string(),
                        )
                    })?;
                state.push(DeferredClause::Cidr {
                    negated: false,
                    text: fill(template, &[("field", &field), ("value", &cidr)]),
                });
                Ok(Fragment::Deferred)
            }
            Comparison::Compare { op } => {
                let value = Self::single_value(cond)?;
                let rendered = match value {
                    LiteralValue::Integer(n) => n.to_string(),
                    LiteralValue::Float(n) => n.to_string(),
                    LiteralValue::String(s) => s.as_plain().ok_or_else(|| {
                        BackendError::UnsupportedFeature(
                            "numeric comparison against a wildcard value".to_string(),
                        )
                    })?,
                    LiteralValue::Bool(_) => {
                        return Err(BackendError::UnsupportedFeature(
                            "numeric comparison against a boolean".to_string(),
                        ));
                    }
                };
                Ok(Fragment::Inline(fill(
                    &self.config.compare_op_expression,
                    &[
                        ("field", &field),
                        ("operator", self.config.compare_operator(*op)),
                        ("value", &rendered),
                    ],
                )))
            }
            Comparison::InList => Ok(Fragment::Inline(
                self.render_in_list(&field, &cond.values)?,
            )),
            Comparison::Exists => Ok(Fragment::Inline(fill(
                &self.config.field_exists_expression,
                &[("field", &field)],
            ))),
            Comparison::NotExists => {
                let text = match &self.config.field_not_exists_expression {
                    Some(template) => fill(template, &[("field", &field)]),
                    None => {
                        let exists = fill(&self.config.field_exists_expression, &[("field", &field)]);
                        format!(
                            "{}{}{}",
                            self.config.not_token,
                            self.config.token_separator,
                            self.config.group(&exists)
                        )
                    }
                };
                Ok(Fragment::Inline(text))
            }
            Comparison::Null => Ok(Fragment::Inline(fill(
                &self.config.field_null_expression,
                &[("field", &field)],
            ))),
        }
    }

    fn single_value(cond: &FieldCondition) -> Result<&LiteralValue> {
        cond.values.first().ok_or_else(|| {
            BackendError::UnsupportedFeature("comparison without a value".to_string())
        })
    }

    fn render_eq(&self, field: &str, value: &LiteralValue, cased: bool) -> String {
        if value.has_wildcards() {
            return self.render_wildcard(field, value, cased);
        }
        let quoted = quote_value(&self.config, value);
        if cased {
            if let Some(template) = &self.config.case_sensitive_match_expression {
                return fill(template, &[("field", field), ("value", &quoted)]);
            }
        }
        format!("{field}{}{quoted}", self.config.eq_token)
    }

    fn render_wildcard(&self, field: &str, value: &LiteralValue, cased: bool) -> String {
        let quoted = quote_value(&self.config, value);
        let template = if cased {
            self.config
                .case_sensitive_match_expression
                .as_ref()
                .or(self.config.wildcard_match_expression.as_ref())
        } else {
            self.config.wildcard_match_expression.as_ref()
        };
        match template {
            Some(t) => fill(t, &[("field", field), ("value", &quoted)]),
            None => format!("{field}{}{quoted}", self.config.eq_token),
        }
    }

    /// startswith / endswith / contains: dedicated template when available,
    /// equals-with-wildcard-value otherwise.
    fn render_affix(
        &self,
        field: &str,
        value: &LiteralValue,
        cased: bool,
        leading: bool,
        trailing: bool,
    ) -> String {
        let template = match (leading, trailing, cased) {
            (false, true, false) => self.config.startswith_expression.as_ref(),
            (false, true, true) => self.config.case_sensitive_startswith_expression.as_ref(),
            (true, false, false) => self.config.endswith_expression.as_ref(),
            (true, false, true) => self.config.case_sensitive_endswith_expression.as_ref(),
            (true, true, false) => self.config.contains_expression.as_ref(),
            (true, true, true) => self.config.case_sensitive_contains_expression.as_ref(),
            _ => None,
        };
        if let Some(t) = template {
            let quoted = quote_value(&self.config, value);
            return fill(t, &[("field", field), ("value", &quoted)]);
        }
        let decorated = decorate_with_wildcards(value, leading, trailing);
        self.render_wildcard(field, &LiteralValue::String(decorated), cased)
    }

    fn render_in_list(&self, field: &str, values: &[LiteralValue]) -> Result<String> {
        if values.is_empty() {
            return Err(BackendError::UnsupportedFeature(
                "empty value list".to_string(),
            ));
        }
        if !self.config.in_expressions_allow_wildcards
            && values.iter().any(LiteralValue::has_wildcards)
        {
            return Err(BackendError::UnsupportedFeature(
                "wildcards are not allowed in value lists".to_string(),
            ));
        }
        let list: Vec<String> = values.iter().map(|v| quote_value(&self.config, v)).collect();
        Ok(fill(
            &self.config.field_in_list_expression,
            &[
                ("field", field),
                ("op", &self.config.or_in_operator),
                ("list", &list.join(&self.config.list_separator)),
            ],
        ))
    }

    /// Value not bound to a field: full-text match against all fields,
    /// template selected by the literal's kind.
    fn convert_unbound(&self, cond: &FieldCondition) -> Result<String> {
        let value = Self::single_value(cond)?;
        if let Comparison::Regex { flags } = &cond.comparison {
            let pattern = match value {
                LiteralValue::String(s) => s.original.as_str(),
                _ => {
                    return Err(BackendError::UnsupportedFeature(
                        "regex comparison requires a string pattern".to_string(),
                    ));
                }
            };
            let prefix = regex_flag_prefix(&self.config, flags)?;
            let regex = format!(
                "{q}{prefix}{}{q}",
                escape_regex(&self.config, pattern),
                q = self.config.str_quote
            );
            return Ok(fill(
                &self.config.unbound_value_re_expression,
                &[("value", &regex)],
            ));
        }
        if !matches!(
            cond.comparison,
            Comparison::Equals | Comparison::Contains | Comparison::Wildcard
        ) {
            return Err(BackendError::UnsupportedFeature(
                "unsupported keyword comparison".to_string(),
            ));
        }
        match value {
            LiteralValue::String(s) => Ok(fill(
                &self.config.unbound_value_str_expression,
                &[("value", &quote_string(&self.config, s))],
            )),
            LiteralValue::Integer(n) => Ok(fill(
                &self.config.unbound_value_num_expression,
                &[("value", &n.to_string())],
            )),
            LiteralValue::Float(n) => Ok(fill(
                &self.config.unbound_value_num_expression,
                &[("value", &n.to_string())],
            )),
            LiteralValue::Bool(b) => {
                let token = if *b {
                    &self.config.bool_true
                } else {
                    &self.config.bool_false
                };
                Ok(fill(
                    &self.config.unbound_value_num_expression,
                    &[("value", token)],
                ))
            }
        }
    }

    // -------------------------------------------------------------------
    // OR→IN collapse
    // -------------------------------------------------------------------

    /// Collapse an OR of equals comparisons on the same field into one
    /// in-expression. Returns `None` when the children are not eligible,
    /// in which case the OR is rendered normally.
    fn try_in_collapse(&self, children: &[ConditionNode]) -> Option<String> {
        if !self.config.convert_or_as_in || children.len() < 2 {
            return None;
        }
        let mut field: Option<&str> = None;
        let mut values = Vec::with_capacity(children.len());
        for child in children {
            let cond = match child {
                ConditionNode::Leaf(cond) => cond,
                _ => return None,
            };
            if !matches!(cond.comparison, Comparison::Equals | Comparison::Wildcard)
                || cond.cased
                || cond.values.len() != 1
            {
                return None;
            }
            let name = cond.field.as_deref()?;
            match field {
                None => field = Some(name),
                Some(f) if f == name => {}
                Some(_) => return None,
            }
            let value = &cond.values[0];
            if value.has_wildcards() && !self.config.in_expressions_allow_wildcards {
                return None;
            }
            values.push(value.clone());
        }
        let field = quote_field(&self.config, field?);
        self.render_in_list(&field, &values).ok()
    }

    // -------------------------------------------------------------------
    // Finalization
    // -------------------------------------------------------------------

    /// Assemble prefix + deferred suffix into the final query.
    ///
    /// A logsource clause, if present, replaces the inline body as the
    /// query prefix; with neither, the scan-everything fallback is used.
    fn finalize(
        &self,
        rule_title: &str,
        inline: Option<String>,
        mut state: ConversionState,
    ) -> Result<String> {
        let logsource = state.take_logsource(rule_title);
        let mut query = match (logsource, inline) {
            (Some(table), _) => table,
            (None, Some(body)) if !body.is_empty() => body,
            _ => self.config.deferred_only_query.clone(),
        };

        for (i, clause) in state.into_clauses().into_iter().enumerate() {
            let (template, negated, text) = match clause {
                DeferredClause::Where { negated, text } => {
                    (&self.config.deferred_where_template, negated, text)
                }
                DeferredClause::Regex { negated, text } => {
                    (&self.config.deferred_re_template, negated, text)
                }
                DeferredClause::Cidr { negated, text } => {
                    (&self.config.deferred_cidr_template, negated, text)
                }
                // removed by take_logsource
                DeferredClause::Logsource { .. } => continue,
            };
            let op = if negated {
                format!(
                    "{}{}",
                    self.config.deferred_not_operator, self.config.token_separator
                )
            } else {
                String::new()
            };
            query.push_str(if i == 0 {
                &self.config.deferred_start
            } else {
                &self.config.deferred_separator
            });
            query.push_str(&fill(template, &[("op", &op), ("value", &text)]));
        }

        Ok(query)
    }
}

/// Wrap a literal in leading/trailing wildcards for the affix fallback path.
fn decorate_with_wildcards(value: &LiteralValue, leading: bool, trailing: bool) -> PatternString {
    let base = match value {
        LiteralValue::String(s) => s.clone(),
        other => PatternString::from_raw(&other.to_string()),
    };
    let mut parts = Vec::with_capacity(base.parts.len() + 2);
    if leading {
        parts.push(StringPart::Special(SpecialChar::WildcardMulti));
    }
    parts.extend(base.parts.iter().cloned());
    if trailing {
        parts.push(StringPart::Special(SpecialChar::WildcardMulti));
    }
    let original = format!(
        "{}{}{}",
        if leading { "*" } else { "" },
        base.original,
        if trailing { "*" } else { "" }
    );
    PatternString { parts, original }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rkql_ast::{CompareOperator, LogSource};

    fn leaf_eq(field: &str, value: &str) -> ConditionNode {
        ConditionNode::leaf(FieldCondition::field_equals(field, value))
    }

    fn rule(condition: ConditionNode) -> Rule {
        Rule::new("Test", LogSource::category("test_category"), condition)
    }

    #[test]
    fn test_single_leaf_rule() {
        let backend = KustoBackend::new();
        let query = backend.convert_rule(&rule(leaf_eq("fieldA", "valueA"))).unwrap();
        assert_eq!(query, "union *\n| where (fieldA =~ \"valueA\")");
    }

    #[test]
    fn test_idempotent_rendering() {
        let backend = KustoBackend::new();
        let r = rule(ConditionNode::and(vec![
            leaf_eq("fieldA", "valueA"),
            ConditionNode::or(vec![leaf_eq("fieldB", "b1"), leaf_eq("fieldC", "c1")]),
        ]));
        assert_eq!(
            backend.convert_rule(&r).unwrap(),
            backend.convert_rule(&r).unwrap()
        );
    }

    #[test]
    fn test_not_wraps_child() {
        let backend = KustoBackend::new();
        let query = backend
            .convert_rule(&rule(ConditionNode::and(vec![
                leaf_eq("fieldA", "valueA"),
                ConditionNode::negate(leaf_eq("fieldB", "valueB")),
            ])))
            .unwrap();
        assert_eq!(
            query,
            "union *\n| where (fieldA =~ \"valueA\" and not (fieldB =~ \"valueB\"))"
        );
    }

    #[test]
    fn test_precedence_without_parenthesize() {
        let mut config = BackendConfig::kusto();
        config.parenthesize = false;
        let backend = KustoBackend::with_config(config);

        // OR under AND: grouped
        let query = backend
            .convert_rule(&rule(ConditionNode::and(vec![
                leaf_eq("a", "1"),
                ConditionNode::or(vec![leaf_eq("b", "2"), leaf_eq("c", "3")]),
            ])))
            .unwrap();
        assert_eq!(
            query,
            "union *\n| where a =~ \"1\" and (b =~ \"2\" or c =~ \"3\")"
        );

        // AND under OR: not grouped
        let query = backend
            .convert_rule(&rule(ConditionNode::or(vec![
                leaf_eq("a", "1"),
                ConditionNode::and(vec![leaf_eq("b", "2"), leaf_eq("c", "3")]),
            ])))
            .unwrap();
        assert_eq!(
            query,
            "union *\n| where a =~ \"1\" or b =~ \"2\" and c =~ \"3\""
        );
    }

    #[test]
    fn test_wildcard_value_uses_match() {
        let backend = KustoBackend::new();
        let query = backend
            .convert_rule(&rule(leaf_eq("Image", r"*\cmd.exe")))
            .unwrap();
        assert_eq!(query, "union *\n| where (Image match \"*\\\\cmd.exe\")");
    }

    #[test]
    fn test_startswith_endswith_contains_templates() {
        let backend = KustoBackend::new();
        let cond = ConditionNode::and(vec![
            ConditionNode::leaf(FieldCondition::new(
                Some("a".to_string()),
                Comparison::Startswith,
                vec![LiteralValue::string("pre")],
            )),
            ConditionNode::leaf(FieldCondition::new(
                Some("b".to_string()),
                Comparison::Endswith,
                vec![LiteralValue::string("post")],
            )),
            ConditionNode::leaf(FieldCondition::new(
                Some("c".to_string()),
                Comparison::Contains,
                vec![LiteralValue::string("mid")],
            )),
        ]);
        assert_eq!(
            backend.convert_rule(&rule(cond)).unwrap(),
            "union *\n| where (a startswith \"pre\" and b endswith \"post\" and c contains \"mid\")"
        );
    }

    #[test]
    fn test_affix_fallback_without_template() {
        let mut config = BackendConfig::kusto();
        config.contains_expression = None;
        let backend = KustoBackend::with_config(config);
        let cond = ConditionNode::leaf(FieldCondition::new(
            Some("a".to_string()),
            Comparison::Contains,
            vec![LiteralValue::string("mid")],
        ));
        assert_eq!(
            backend.convert_rule(&rule(cond)).unwrap(),
            "union *\n| where (a match \"*mid*\")"
        );
    }

    #[test]
    fn test_cased_comparison() {
        let backend = KustoBackend::new();
        let mut cond = FieldCondition::field_equals("a", "Value");
        cond.cased = true;
        assert_eq!(
            backend.convert_rule(&rule(ConditionNode::leaf(cond))).unwrap(),
            "union *\n| where (a casematch \"Value\")"
        );
    }

    #[test]
    fn test_compare_operators() {
        let backend = KustoBackend::new();
        let cond = ConditionNode::leaf(FieldCondition::new(
            Some("count".to_string()),
            Comparison::Compare {
                op: CompareOperator::Gte,
            },
            vec![LiteralValue::Integer(100)],
        ));
        assert_eq!(
            backend.convert_rule(&rule(cond)).unwrap(),
            "union *\n| where (count >= 100)"
        );
    }

    #[test]
    fn test_exists_null_templates() {
        let backend = KustoBackend::new();
        let cond = ConditionNode::and(vec![
            ConditionNode::leaf(FieldCondition::new(
                Some("a".to_string()),
                Comparison::Exists,
                vec![],
            )),
            ConditionNode::leaf(FieldCondition::new(
                Some("b".to_string()),
                Comparison::NotExists,
                vec![],
            )),
            ConditionNode::leaf(FieldCondition::new(
                Some("c".to_string()),
                Comparison::Null,
                vec![],
            )),
        ]);
        assert_eq!(
            backend.convert_rule(&rule(cond)).unwrap(),
            "union *\n| where (exists(a) and notexists(b) and c is null)"
        );
    }

    #[test]
    fn test_unbound_values() {
        let backend = KustoBackend::new();
        let keyword = ConditionNode::leaf(FieldCondition::new(
            None,
            Comparison::Equals,
            vec![LiteralValue::string("mimikatz")],
        ));
        assert_eq!(
            backend.convert_rule(&rule(keyword)).unwrap(),
            "union *\n| where ([\"*\"] contains \"mimikatz\")"
        );

        let number = ConditionNode::leaf(FieldCondition::new(
            None,
            Comparison::Equals,
            vec![LiteralValue::Integer(4688)],
        ));
        assert_eq!(
            backend.convert_rule(&rule(number)).unwrap(),
            "union *\n| where ([\"*\"] contains \"4688\")"
        );

        let re = ConditionNode::leaf(FieldCondition::new(
            None,
            Comparison::Regex { flags: vec![] },
            vec![LiteralValue::raw_string("foo.*")],
        ));
        assert_eq!(
            backend.convert_rule(&rule(re)).unwrap(),
            "union *\n| where (_=~\"foo.*\")"
        );
    }

    #[test]
    fn test_in_list_comparison_direct() {
        let backend = KustoBackend::new();
        let cond = ConditionNode::leaf(FieldCondition::new(
            Some("EventID".to_string()),
            Comparison::InList,
            vec![
                LiteralValue::Integer(4624),
                LiteralValue::Integer(4625),
            ],
        ));
        assert_eq!(
            backend.convert_rule(&rule(cond)).unwrap(),
            "union *\n| where (EventID in (4624, 4625))"
        );
    }

    #[test]
    fn test_in_collapse_disabled() {
        let mut config = BackendConfig::kusto();
        config.convert_or_as_in = false;
        let backend = KustoBackend::with_config(config);
        let cond = ConditionNode::or(vec![leaf_eq("a", "1"), leaf_eq("a", "2")]);
        assert_eq!(
            backend.convert_rule(&rule(cond)).unwrap(),
            "union *\n| where (a =~ \"1\" or a =~ \"2\")"
        );
    }

    #[test]
    fn test_in_collapse_requires_same_field() {
        let backend = KustoBackend::new();
        let cond = ConditionNode::or(vec![leaf_eq("a", "1"), leaf_eq("b", "2")]);
        assert_eq!(
            backend.convert_rule(&rule(cond)).unwrap(),
            "union *\n| where (a =~ \"1\" or b =~ \"2\")"
        );
    }

    #[test]
    fn test_invalid_cidr_fails() {
        let backend = KustoBackend::new();
        let cond = ConditionNode::leaf(FieldCondition::new(
            Some("ip".to_string()),
            Comparison::Cidr,
            vec![LiteralValue::string("not-a-cidr")],
        ));
        assert!(matches!(
            backend.convert_rule(&rule(cond)),
            Err(BackendError::InvalidCidr(_))
        ));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let backend = KustoBackend::new();
        let r = rule(leaf_eq("a", "1"));
        assert!(matches!(
            backend.convert_rule_format(&r, "ndjson"),
            Err(BackendError::UnknownFormat(_))
        ));
        assert!(backend.convert_rule_format(&r, "default").is_ok());
    }

    #[test]
    fn test_batch_conversion_isolates_failures() {
        let backend = KustoBackend::new();
        let bad = rule(ConditionNode::leaf(FieldCondition::new(
            Some("ip".to_string()),
            Comparison::Cidr,
            vec![LiteralValue::string("bogus")],
        )));
        let good = rule(leaf_eq("a", "1"));
        let results = backend.convert_rules(&[bad, good]);
        assert!(results[0].is_err());
        assert_eq!(results[1].as_deref().unwrap(), "union *\n| where (a =~ \"1\")");
    }

    #[test]
    fn test_inline_main_expression_variant() {
        let mut config = BackendConfig::kusto();
        config.defer_main_expression = false;
        config.parenthesize = false;
        let backend = KustoBackend::with_config(config);
        let cond = ConditionNode::and(vec![leaf_eq("a", "1"), leaf_eq("b", "2")]);
        assert_eq!(
            backend.convert_rule(&rule(cond)).unwrap(),
            "a =~ \"1\" and b =~ \"2\""
        );
    }
}
