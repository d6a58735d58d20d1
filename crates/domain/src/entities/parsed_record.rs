//! Loosely-typed model output after recovery.
//!
//! The backend returns arbitrary JSON-like shapes. Every read goes through an
//! accessor that matches on the value variant and falls back to `None`, so no
//! caller ever assumes a field's presence or type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A field-name to loose-value mapping. Always a mapping, never a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedRecord(Map<String, Value>);

impl ParsedRecord {
    pub fn empty() -> Self {
        Self(Map::new())
    }

    /// Only JSON objects qualify; arrays and scalars are rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Parse text that must hold a JSON object.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value).ok_or_else(|| {
            <serde_json::Error as serde::de::Error>::custom("top-level value is not an object")
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|v| !v.is_null())
    }

    /// Non-empty string form of a scalar field. Numbers and booleans are
    /// stringified; mappings, lists and null yield `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn text_lower(&self, key: &str) -> Option<String> {
        self.text(key).map(|s| s.to_lowercase())
    }

    /// Numeric value of a number or a string that starts with a number
    /// (`"15 lb."` -> 15.0).
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => leading_number(s),
            _ => None,
        }
    }

    /// Case-insensitive comparison of the field's string form against "true",
    /// so both `true` and `"True"` count.
    pub fn flag_is_true(&self, key: &str) -> bool {
        self.text(key)
            .is_some_and(|s| s.eq_ignore_ascii_case("true"))
    }

    /// Strings, arrays of scalars, and mappings flattened into tokens.
    /// Mapping entries become `(key, Some(value))`, everything else `(token, None)`.
    pub fn tokens(&self, key: &str) -> Vec<(String, Option<String>)> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| scalar_text(item).map(|s| (s, None)))
                .collect(),
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(k, v)| match v {
                    Value::Bool(false) | Value::Null => None,
                    Value::Bool(true) => Some((k.clone(), None)),
                    other => scalar_text(other).map(|s| (k.clone(), Some(s))),
                })
                .collect(),
            Some(Value::String(s)) => s
                .split([',', ';'])
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| (t.to_string(), None))
                .collect(),
            Some(Value::Number(n)) => vec![(n.to_string(), None)],
            _ => Vec::new(),
        }
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), Value::String(value.into()));
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Compact JSON text of the mapping.
    pub fn to_json_string(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

impl From<Map<String, Value>> for ParsedRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|&(i, c)| {
            let sign = i == 0 && (c == '-' || c == '+');
            !(c.is_ascii_digit() || c == '.' || c == ',' || sign)
        })
        .map_or(s.len(), |(i, _)| i);
    s[..end].replace(',', "").parse().ok()
}
