use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// PatternString: string values with wildcard support
// =============================================================================
//
// Detection values use `*` for multi-character wildcards and `?` for
// single-character wildcards. Backslash `\` escapes the next character.
// The structure is preserved so the backend can quote plain text while
// passing wildcard markers through unescaped.

/// Special characters that can appear in a pattern string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialChar {
    /// Multi-character wildcard (`*`)
    WildcardMulti,
    /// Single-character wildcard (`?`)
    WildcardSingle,
}

/// A part of a [`PatternString`]: either plain text or a special character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringPart {
    Plain(String),
    Special(SpecialChar),
}

/// A string value that may contain wildcards.
///
/// ## Escape semantics
///
/// Backslash (`\`) is the escape character. It only consumes itself when
/// followed by a special character (`*`, `?`, `\`); before anything else it
/// is kept as a literal backslash, which matters for patterns like
/// `\Windows\` in file paths.
///
/// Serializes as the original string; deserializing re-parses wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternString {
    pub parts: Vec<StringPart>,
    pub original: String,
}

impl PatternString {
    /// Parse a string, interpreting `*` and `?` as wildcards and `\` as escape.
    pub fn new(s: &str) -> Self {
        let mut parts: Vec<StringPart> = Vec::new();
        let mut acc = String::new();
        let mut escaped = false;

        for c in s.chars() {
            if escaped {
                if c == '*' || c == '?' || c == '\\' {
                    acc.push(c);
                } else {
                    // backslash before non-special char: keep both
                    acc.push('\\');
                    acc.push(c);
                }
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '*' {
                if !acc.is_empty() {
                    parts.push(StringPart::Plain(std::mem::take(&mut acc)));
                }
                parts.push(StringPart::Special(SpecialChar::WildcardMulti));
            } else if c == '?' {
                if !acc.is_empty() {
                    parts.push(StringPart::Plain(std::mem::take(&mut acc)));
                }
                parts.push(StringPart::Special(SpecialChar::WildcardSingle));
            } else {
                acc.push(c);
            }
        }

        if escaped {
            acc.push('\\');
        }
        if !acc.is_empty() {
            parts.push(StringPart::Plain(acc));
        }

        PatternString {
            parts,
            original: s.to_string(),
        }
    }

    /// Create from a raw string with no wildcard parsing (e.g. regex patterns).
    pub fn from_raw(s: &str) -> Self {
        PatternString {
            parts: if s.is_empty() {
                Vec::new()
            } else {
                vec![StringPart::Plain(s.to_string())]
            },
            original: s.to_string(),
        }
    }

    /// Returns `true` if the string contains no wildcards.
    pub fn is_plain(&self) -> bool {
        self.parts.iter().all(|p| matches!(p, StringPart::Plain(_)))
    }

    /// Returns `true` if the string contains any wildcard characters.
    pub fn contains_wildcards(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, StringPart::Special(_)))
    }

    /// Get the plain string content. Returns `None` if wildcards are present.
    pub fn as_plain(&self) -> Option<String> {
        if !self.is_plain() {
            return None;
        }
        Some(
            self.parts
                .iter()
                .filter_map(|p| match p {
                    StringPart::Plain(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect(),
        )
    }
}

impl fmt::Display for PatternString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl Serialize for PatternString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.original)
    }
}

impl<'de> Deserialize<'de> for PatternString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(PatternString::new(&s))
    }
}

// =============================================================================
// LiteralValue: typed comparison values
// =============================================================================

/// A typed literal from a field comparison.
///
/// Untagged in serialized form: JSON numbers, booleans, and strings map
/// directly onto the variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    /// String value (may contain wildcards)
    String(PatternString),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Bool(bool),
}

impl LiteralValue {
    /// Create a string literal, parsing wildcards.
    pub fn string(s: &str) -> Self {
        LiteralValue::String(PatternString::new(s))
    }

    /// Create a string literal with no wildcard parsing (for regex patterns).
    pub fn raw_string(s: &str) -> Self {
        LiteralValue::String(PatternString::from_raw(s))
    }

    /// Returns `true` for a string literal containing wildcards.
    pub fn has_wildcards(&self) -> bool {
        match self {
            LiteralValue::String(s) => s.contains_wildcards(),
            _ => false,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::String(s) => write!(f, "{s}"),
            LiteralValue::Integer(n) => write!(f, "{n}"),
            LiteralValue::Float(n) => write!(f, "{n}"),
            LiteralValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_string_plain() {
        let s = PatternString::new("hello world");
        assert!(s.is_plain());
        assert!(!s.contains_wildcards());
        assert_eq!(s.as_plain(), Some("hello world".to_string()));
    }

    #[test]
    fn test_pattern_string_wildcards() {
        let s = PatternString::new("*admin*");
        assert!(!s.is_plain());
        assert!(s.contains_wildcards());
        assert_eq!(s.parts.len(), 3);
        assert_eq!(s.parts[0], StringPart::Special(SpecialChar::WildcardMulti));
        assert_eq!(s.parts[1], StringPart::Plain("admin".to_string()));
        assert_eq!(s.parts[2], StringPart::Special(SpecialChar::WildcardMulti));
    }

    #[test]
    fn test_pattern_string_escaped_wildcard_is_literal() {
        let s = PatternString::new(r"C:\Windows\*");
        assert!(!s.contains_wildcards());
        // \W is non-special, so both \ and W are kept; \* is special, only * kept
        assert_eq!(s.as_plain(), Some(r"C:\Windows*".to_string()));
    }

    #[test]
    fn test_pattern_string_unescaped_wildcard_in_path() {
        let s = PatternString::new(r"C:\Windows*");
        assert!(s.contains_wildcards());
        assert_eq!(s.parts.len(), 2);
        assert_eq!(s.parts[0], StringPart::Plain(r"C:\Windows".to_string()));
        assert_eq!(s.parts[1], StringPart::Special(SpecialChar::WildcardMulti));
    }

    #[test]
    fn test_pattern_string_from_raw_keeps_wildcard_chars() {
        let s = PatternString::from_raw("foo.*bar");
        assert!(s.is_plain());
        assert_eq!(s.as_plain(), Some("foo.*bar".to_string()));
    }

    #[test]
    fn test_literal_value_untagged_json() {
        assert_eq!(
            serde_json::to_string(&LiteralValue::string("val*")).unwrap(),
            r#""val*""#
        );
        let v: LiteralValue = serde_json::from_str("4688").unwrap();
        assert_eq!(v, LiteralValue::Integer(4688));
        let v: LiteralValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, LiteralValue::Bool(true));
        let v: LiteralValue = serde_json::from_str(r#""*admin*""#).unwrap();
        assert!(v.has_wildcards());
    }

    #[test]
    fn test_literal_value_has_wildcards() {
        assert!(LiteralValue::string("value*").has_wildcards());
        assert!(!LiteralValue::string("value").has_wildcards());
        assert!(!LiteralValue::Integer(4688).has_wildcards());
    }
}
