use super::Attributes;
use serde::Serialize;
use std::collections::BTreeMap;

/// A loosely typed attribute value after coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Type inference for client-defined (`X-`) attributes: hex literals stay
    /// strings, anything numeric becomes a number.
    pub fn infer(value: &str) -> Self {
        if is_hex_literal(value) {
            return Self::String(value.to_string());
        }
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::String(value.to_string()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Camel-cased keys to coerced values.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

const NUMERIC_KEYS: &[&str] = &[
    "DURATION",
    "TIME-OFFSET",
    "PART-TARGET",
    "CAN-SKIP-UNTIL",
    "PART-HOLD-BACK",
    "HOLD-BACK",
    "SKIPPED-SEGMENTS",
    "LAST-MSN",
    "LAST-PART",
    "BYTERANGE-START",
    "BYTERANGE-LENGTH",
];

const BOOLEAN_KEYS: &[&str] = &[
    "PRECISE",
    "CAN-SKIP-DATERANGES",
    "CAN-BLOCK-RELOAD",
    "INDEPENDENT",
    "GAP",
];

/// `CAN-SKIP-UNTIL` -> `canSkipUntil`.
pub fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;

    for c in key.chars() {
        if c == '-' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }

    if upper_next {
        out.push('-');
    }

    out
}

/// Coerce a raw attribute according to the well-known key tables.
///
/// Numeric keys that fail to parse, or parse to a non-finite value, keep
/// their string form.
pub fn coerce(key: &str, value: &str) -> AttributeValue {
    if NUMERIC_KEYS.contains(&key) {
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() => AttributeValue::Number(n),
            _ => AttributeValue::String(value.to_string()),
        }
    } else if BOOLEAN_KEYS.contains(&key) {
        AttributeValue::Bool(value.eq_ignore_ascii_case("YES"))
    } else {
        AttributeValue::String(value.to_string())
    }
}

pub fn camel_case_keys(attrs: &Attributes) -> AttributeMap {
    attrs
        .iter()
        .map(|(key, value)| (camel_case(key), coerce(key, value)))
        .collect()
}

fn is_hex_literal(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()))
}
