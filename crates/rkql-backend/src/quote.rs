//! Escaping and quoting of field names, literal values, and regex patterns.
//!
//! Escaping never fails: characters that cannot be represented are a
//! rule-authoring problem handled upstream. Wildcard markers pass through
//! unescaped because the target's own wildcard operators reuse them.

use rkql_ast::{LiteralValue, PatternString, RegexFlag, SpecialChar, StringPart};

use crate::config::BackendConfig;
use crate::error::{BackendError, Result};

/// Escape and quote a field name.
///
/// Names matching the safe pattern stay bare. Otherwise the name is
/// escaped, wrapped in the field quote character, and, when bracket
/// quoting is configured, additionally wrapped in `[...]`.
pub fn quote_field(config: &BackendConfig, name: &str) -> String {
    let escaped = match &config.field_escape_pattern {
        Some(pattern) => pattern
            .replace_all(name, |caps: &regex::Captures<'_>| {
                format!("{}{}", config.field_escape, &caps[0])
            })
            .into_owned(),
        None => name.to_string(),
    };

    let matched = config.field_quote_pattern.is_match(&escaped);
    let needs_quote = if config.field_quote_pattern_negation {
        !matched
    } else {
        matched
    };
    if !needs_quote {
        return escaped;
    }

    let quoted = format!("{q}{escaped}{q}", q = config.field_quote);
    if config.field_bracket_quoted {
        format!("[{quoted}]")
    } else {
        quoted
    }
}

/// Quote a string value, escaping the quote and escape characters in plain
/// parts and emitting wildcard markers raw.
pub fn quote_string(config: &BackendConfig, value: &PatternString) -> String {
    let mut out = String::with_capacity(value.original.len() + 2);
    out.push(config.str_quote);
    for part in &value.parts {
        match part {
            StringPart::Plain(text) => {
                for c in text.chars() {
                    if config.filter_chars.contains(c) {
                        continue;
                    }
                    if c == config.str_quote
                        || c == config.escape_char
                        || config.add_escaped.contains(c)
                    {
                        out.push(config.escape_char);
                    }
                    out.push(c);
                }
            }
            StringPart::Special(SpecialChar::WildcardMulti) => out.push(config.wildcard_multi),
            StringPart::Special(SpecialChar::WildcardSingle) => out.push(config.wildcard_single),
        }
    }
    out.push(config.str_quote);
    out
}

/// Quote any literal value: strings via [`quote_string`], numbers as bare
/// decimal text, booleans through the configured token table.
pub fn quote_value(config: &BackendConfig, value: &LiteralValue) -> String {
    match value {
        LiteralValue::String(s) => quote_string(config, s),
        LiteralValue::Integer(n) => n.to_string(),
        LiteralValue::Float(n) => n.to_string(),
        LiteralValue::Bool(true) => config.bool_true.clone(),
        LiteralValue::Bool(false) => config.bool_false.clone(),
    }
}

/// Escape a regex pattern according to the configured escape set.
pub fn escape_regex(config: &BackendConfig, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if config.re_escape.contains(&c)
            || (config.re_escape_escape_char && c == config.re_escape_char)
        {
            out.push(config.re_escape_char);
        }
        out.push(c);
    }
    out
}

/// Render the requested regex flags as a `(?ims)` style prefix group.
///
/// A flag with no entry in the backend's flag table fails the conversion
/// rather than being silently dropped.
pub fn regex_flag_prefix(config: &BackendConfig, flags: &[RegexFlag]) -> Result<String> {
    if flags.is_empty() {
        return Ok(String::new());
    }
    if !config.re_flag_prefix {
        return Err(BackendError::UnsupportedFeature(
            "regex flags are not supported by this backend".to_string(),
        ));
    }
    let mut tokens = String::new();
    for flag in flags {
        let token = config
            .re_flags
            .get(flag)
            .ok_or_else(|| BackendError::UnsupportedFlag(format!("{flag:?}")))?;
        tokens.push_str(token);
    }
    Ok(format!("(?{tokens})"))
}
