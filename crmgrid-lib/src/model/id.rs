//! Record identity

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::Value;
use super::ValueRef;
use super::value::exact_integer;

/// The stable identity of a record within one collection.
///
/// Remote stores hand out either integer or text keys. Integer keys order
/// before text keys; within a variant the natural order applies.
///
/// # Example
///
/// ```
/// use crmgrid_lib::model::RecordId;
///
/// let id: RecordId = "42".parse().unwrap();
/// assert_eq!(id, RecordId::Number(42));
///
/// let id: RecordId = "a1b2".parse().unwrap();
/// assert_eq!(id, RecordId::Text("a1b2".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    /// Generates a key from the current time in milliseconds.
    ///
    /// This is what the browser client assigns to records it creates.
    pub fn from_timestamp() -> Self {
        RecordId::Number(Utc::now().timestamp_millis())
    }

    /// Returns `true` if both keys address the same record.
    ///
    /// A number and its decimal text are the same key: `5` matches `"5"`
    /// but not `"05"`.
    pub fn matches(&self, other: &RecordId) -> bool {
        match (self, other) {
            (RecordId::Number(n), RecordId::Text(s)) | (RecordId::Text(s), RecordId::Number(n)) => {
                *s == n.to_string()
            }
            _ => self == other,
        }
    }

    /// Borrows the identity as a field value, so `id` can be sorted and
    /// searched like any other column.
    pub fn as_value_ref(&self) -> ValueRef<'_> {
        match self {
            RecordId::Number(n) => ValueRef::Number(*n as f64),
            RecordId::Text(s) => ValueRef::String(s),
        }
    }

    /// Interprets a field value as an identity.
    ///
    /// Only integral numbers and strings qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => exact_integer(*n).map(RecordId::Number),
            Value::String(s) => Some(RecordId::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(n) => RecordId::Number(n),
            Err(_) => RecordId::Text(s.to_string()),
        })
    }
}

impl From<i64> for RecordId {
    fn from(v: i64) -> Self {
        RecordId::Number(v)
    }
}

impl From<i32> for RecordId {
    fn from(v: i32) -> Self {
        RecordId::Number(v as i64)
    }
}

impl From<&str> for RecordId {
    fn from(v: &str) -> Self {
        RecordId::Text(v.to_string())
    }
}

impl From<String> for RecordId {
    fn from(v: String) -> Self {
        RecordId::Text(v)
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        match id {
            RecordId::Number(n) => Value::Number(n as f64),
            RecordId::Text(s) => Value::String(s),
        }
    }
}
