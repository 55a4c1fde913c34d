//! # Value Typing
//!
//! Classifies a raw property token into a typed literal.
//!
//! Classification is total: every token lands in exactly one kind, checked
//! in priority order date > boolean > numeric > string.

use crate::primitives::{BOOLEAN_PROPERTY, DATE_PROPERTY, NUMERIC_PROPERTY, STRING_PROPERTY};
use serde::{Deserialize, Serialize};

/// A property value after classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    /// `YYYY-MM-DD`, emitted bare.
    Date(String),
    /// `true`/`false`, any case on input.
    Boolean(bool),
    /// A finite number, emitted exactly as written.
    Numeric(String),
    /// Anything else. Holds the unquoted text.
    Text(String),
}

impl TypedValue {
    /// Name of the property-node attribute that carries this value.
    #[must_use]
    pub const fn attribute(&self) -> &'static str {
        match self {
            Self::Date(_) => DATE_PROPERTY,
            Self::Boolean(_) => BOOLEAN_PROPERTY,
            Self::Numeric(_) => NUMERIC_PROPERTY,
            Self::Text(_) => STRING_PROPERTY,
        }
    }

    /// The value as it appears in a statement.
    #[must_use]
    pub fn literal(&self) -> String {
        match self {
            Self::Date(d) => d.clone(),
            Self::Boolean(b) => b.to_string(),
            Self::Numeric(n) => n.clone(),
            Self::Text(t) => quote(t),
        }
    }
}

/// Classifier for raw property values.
pub struct ValueTyper;

impl ValueTyper {
    /// Classify a raw token. Never fails.
    #[must_use]
    pub fn classify(raw: &str) -> TypedValue {
        if is_iso_date(raw) {
            return TypedValue::Date(raw.to_string());
        }
        if raw.eq_ignore_ascii_case("true") {
            return TypedValue::Boolean(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return TypedValue::Boolean(false);
        }
        let number = raw.trim();
        if number.parse::<f64>().is_ok_and(f64::is_finite) {
            return TypedValue::Numeric(number.to_string());
        }
        TypedValue::Text(raw.trim_matches('"').to_string())
    }
}

/// Wrap `s` in double quotes, escaping `\` and `"`.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Exactly four ASCII digits, dash, two digits, dash, two digits.
fn is_iso_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        })
}

// =============================================================================
// TESTS
// =============================================================================
