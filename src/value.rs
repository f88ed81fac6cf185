#![forbid(unsafe_code)]

//! Typed property values and their query-language literal encoding.
//!
//! The encoder decides which property keys survive into a statement: NaN
//! floats, empty strings and empty lists are dropped, while `0`, `0.0` and
//! `false` are always kept. The same retention rule feeds the property
//! clause and the filter predicate so that a created entity can be matched
//! again with the descriptor that created it.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Property map keyed by property name. Iteration order is the render order.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Scalar or homogeneous list value attached to a node or edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean literal.
    Bool(bool),
    /// Signed 64-bit integer literal.
    Int(i64),
    /// 64-bit floating point literal.
    Float(f64),
    /// UTF-8 string literal.
    String(String),
    /// List of scalars.
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Returns true when the encoder would drop this value.
    pub fn is_omitted(&self) -> bool {
        encode(self).is_none()
    }
}

/// Renders `value` as a literal, or `None` when the owning key must be dropped.
pub fn encode(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::Bool(v) => Some(v.to_string()),
        PropertyValue::Int(v) => Some(v.to_string()),
        PropertyValue::Float(v) => encode_float(*v),
        PropertyValue::String(s) if s.is_empty() => None,
        PropertyValue::String(s) => Some(quote_string(s)),
        PropertyValue::List(items) => {
            let parts: Vec<String> = items.iter().filter_map(encode).collect();
            if parts.is_empty() {
                None
            } else {
                Some(format!("[{}]", parts.join(", ")))
            }
        }
    }
}

fn encode_float(v: f64) -> Option<String> {
    if v.is_nan() {
        None
    } else if v.is_infinite() {
        Some(if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string())
    } else {
        // Debug keeps a fractional part or exponent, so the literal stays a float.
        Some(format!("{v:?}"))
    }
}

/// Quotes `s` as a double-quoted string literal.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Back-quotes `name` unless it is a plain identifier.
///
/// Labels, relationship types and property keys are trusted input; this only
/// keeps names with spaces or punctuation from splitting the statement.
pub fn quote_identifier(name: &str) -> String {
    if is_plain_identifier(name) {
        name.to_string()
    } else {
        backquote(name)
    }
}

/// Wraps `name` in back-quotes, doubling embedded back-quotes.
pub fn backquote(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Normalizes `name` to snake case: `FirstName` becomes `first_name`.
///
/// Runs of capitals followed by lower-case letters or digits form words;
/// anything else separates words. A leading digit gets a `_` prefix.
pub fn standard_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let start = i;
        while i < chars.len() && chars[i].is_ascii_uppercase() {
            i += 1;
        }
        while i < chars.len() && (chars[i].is_ascii_lowercase() || chars[i].is_ascii_digit()) {
            i += 1;
        }
        if i == start {
            i += 1;
            continue;
        }
        words.push(chars[start..i].iter().collect::<String>().to_ascii_lowercase());
    }
    let joined = words.join("_");
    if joined.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{joined}")
    } else {
        joined
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Key/value pairs the encoder retains, paired with their rendered literal.
pub fn encoded_entries(props: &PropertyMap) -> Vec<(&str, String)> {
    props
        .iter()
        .filter_map(|(k, v)| encode(v).map(|lit| (k.as_str(), lit)))
        .collect()
}

/// Subset of `props` that survives encoding, with omitted list items removed.
///
/// A parameter-binding renderer sends exactly these values.
pub fn retained(props: &PropertyMap) -> PropertyMap {
    props
        .iter()
        .filter_map(|(k, v)| prune(v).map(|v| (k.clone(), v)))
        .collect()
}

fn prune(value: &PropertyValue) -> Option<PropertyValue> {
    match value {
        PropertyValue::List(items) => {
            let kept: Vec<PropertyValue> = items.iter().filter_map(prune).collect();
            if kept.is_empty() {
                None
            } else {
                Some(PropertyValue::List(kept))
            }
        }
        other if other.is_omitted() => None,
        other => Some(other.clone()),
    }
}

/// Renders the property clause `` {`k`: v, ...} ``, or `""` when nothing is retained.
pub fn encode_props(props: &PropertyMap) -> String {
    let entries = encoded_entries(props);
    if entries.is_empty() {
        return String::new();
    }
    let body: Vec<String> = entries
        .into_iter()
        .map(|(k, lit)| format!("{}: {}", backquote(k), lit))
        .collect();
    format!("{{{}}}", body.join(", "))
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(value.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(values: Vec<T>) -> Self {
        PropertyValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<&serde_json::Value> for PropertyValue {
    type Error = String;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;
        match value {
            Value::Bool(v) => Ok(PropertyValue::Bool(*v)),
            Value::Number(num) => {
                if let Some(i) = num.as_i64() {
                    Ok(PropertyValue::Int(i))
                } else if let Some(f) = num.as_f64() {
                    Ok(PropertyValue::Float(f))
                } else {
                    Err(format!("numeric literal {num} out of range"))
                }
            }
            Value::String(s) => Ok(PropertyValue::String(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(PropertyValue::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(PropertyValue::List),
            Value::Null => Err("null is not a property value".into()),
            Value::Object(_) => Err("maps are not property values".into()),
        }
    }
}
