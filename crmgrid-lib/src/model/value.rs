//! Value enum for dynamic field values

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;

/// A dynamic value held by a single record field.
///
/// Table records are flat JSON objects, so the interesting variants are
/// `Null`, `Number` and `String`. `Bool` and `Json` exist so that anything a
/// remote store hands back survives a round trip; the comparator and the
/// filter pipeline treat them as opaque.
///
/// # Type Mapping
///
/// | JSON | Rust Variant |
/// |------|--------------|
/// | null | `Null` |
/// | true/false | `Bool` |
/// | number | `Number` |
/// | string | `String` |
/// | array, object | `Json` |
///
/// # Example
///
/// ```
/// use crmgrid_lib::model::Value;
///
/// let name = Value::from("Contoso");
/// let score = Value::from(87);
/// let empty = Value::Null;
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null/empty value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Any JSON number.
    Number(f64),
    /// String value.
    String(String),
    /// Fallback for arrays and objects.
    Json(serde_json::Value),
}

/// A borrowed view of a field value, used by the comparator and filters.
///
/// Absent fields are reported as [`ValueRef::Null`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    /// Arrays and objects.
    Other,
}

impl Value {
    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Json(_) => "json",
        }
    }

    /// Returns the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric content, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrows this value for comparison.
    pub fn as_value_ref(&self) -> ValueRef<'_> {
        match self {
            Value::Null => ValueRef::Null,
            Value::Bool(b) => ValueRef::Bool(*b),
            Value::Number(n) => ValueRef::Number(*n),
            Value::String(s) => ValueRef::String(s),
            Value::Json(_) => ValueRef::Other,
        }
    }

    /// Converts user input into a value shaped like `template`.
    ///
    /// Input typed into a numeric cell becomes a number when it parses as
    /// one; everything else stays a string. Blank input clears the cell.
    ///
    /// ```
    /// use crmgrid_lib::model::{Value, ValueRef};
    ///
    /// assert_eq!(Value::from_input("42", ValueRef::Number(7.0)), Value::Number(42.0));
    /// assert_eq!(Value::from_input("42", ValueRef::String("x")), Value::from("42"));
    /// ```
    pub fn from_input(input: &str, template: ValueRef<'_>) -> Value {
        let trimmed = input.trim();
        if trimmed.is_empty() && !matches!(template, ValueRef::String(_)) {
            return Value::Null;
        }
        match template {
            ValueRef::Number(_) => trimmed
                .parse::<f64>()
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(input.to_string())),
            ValueRef::Bool(_) => match trimmed {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(input.to_string()),
            },
            _ => Value::String(input.to_string()),
        }
    }
}

impl ValueRef<'_> {
    /// Returns `true` for absent and null values.
    pub fn is_null(&self) -> bool {
        matches!(self, ValueRef::Null)
    }

    /// Converts the borrowed value back into an owned [`Value`].
    ///
    /// `Other` has no borrowed payload and becomes `Null`.
    pub fn to_value(self) -> Value {
        match self {
            ValueRef::Null | ValueRef::Other => Value::Null,
            ValueRef::Bool(b) => Value::Bool(b),
            ValueRef::Number(n) => Value::Number(n),
            ValueRef::String(s) => Value::String(s.to_string()),
        }
    }
}

/// Returns the integer a float represents exactly, if any.
pub(crate) fn exact_integer(n: f64) -> Option<i64> {
    // 2^53: beyond this not every integer is representable
    const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        Some(n as i64)
    } else {
        None
    }
}

// Integral numbers go out as JSON integers so a PATCH of `score` does not
// turn `87` into `87.0` on the server.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => match exact_integer(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Value::String(s) => serializer.serialize_str(s),
            Value::Json(v) => v.serialize(serializer),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => match exact_integer(*n) {
                Some(i) => write!(f, "{}", i),
                None => write!(f, "{}", n),
            },
            Value::String(s) => f.write_str(s),
            Value::Json(v) => write!(f, "{}", v),
        }
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            other => Value::Json(other),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_numbers_serialize_as_integers() {
        assert_eq!(serde_json::to_string(&Value::from(87)).unwrap(), "87");
        assert_eq!(serde_json::to_string(&Value::from(12.5)).unwrap(), "12.5");
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
    }

    #[test]
    fn test_deserialize_scalars() {
        let value: Value = serde_json::from_str("42").unwrap();
        assert_eq!(value, Value::Number(42.0));

        let value: Value = serde_json::from_str("\"Qualified\"").unwrap();
        assert_eq!(value, Value::from("Qualified"));

        let value: Value = serde_json::from_str("null").unwrap();
        assert!(value.is_null());

        let value: Value = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(value.type_name(), "json");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(100).to_string(), "100");
        assert_eq!(Value::from(0.25).to_string(), "0.25");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_from_input_follows_template() {
        assert_eq!(Value::from_input(" 55 ", ValueRef::Number(1.0)), Value::Number(55.0));
        assert_eq!(
            Value::from_input("abc", ValueRef::Number(1.0)),
            Value::from("abc")
        );
        assert_eq!(Value::from_input("", ValueRef::Number(1.0)), Value::Null);
        assert_eq!(Value::from_input("", ValueRef::String("x")), Value::from(""));
        assert_eq!(Value::from_input("Lost", ValueRef::Null), Value::from("Lost"));
    }
}
