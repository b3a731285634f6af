//! Typed field read errors

use crate::model::RecordId;

/// A record field could not be read as the type a caller needs.
///
/// Carries the identity of the record when it has one, so the message
/// points at the row the user has to fix.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("{} has no '{field}' field", describe(.record))]
    Missing {
        record: Option<RecordId>,
        field: String,
    },

    #[error("'{field}' of {} holds a {actual}, not a {expected}", describe(.record))]
    TypeMismatch {
        record: Option<RecordId>,
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl FieldError {
    pub fn missing(record: Option<&RecordId>, field: impl Into<String>) -> Self {
        Self::Missing {
            record: record.cloned(),
            field: field.into(),
        }
    }

    pub fn type_mismatch(
        record: Option<&RecordId>,
        field: impl Into<String>,
        expected: &'static str,
        actual: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            record: record.cloned(),
            field: field.into(),
            expected,
            actual,
        }
    }

    /// Returns the name of the field that could not be read.
    pub fn field(&self) -> &str {
        match self {
            Self::Missing { field, .. } | Self::TypeMismatch { field, .. } => field,
        }
    }
}

fn describe(record: &Option<RecordId>) -> String {
    match record {
        Some(id) => format!("Record {}", id),
        None => "Draft".to_string(),
    }
}
