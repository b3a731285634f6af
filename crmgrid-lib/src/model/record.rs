//! Dynamic table record

use std::collections::HashMap;

use super::RecordId;
use super::Value;
use super::ValueRef;
use crate::error::FieldError;

/// The name of the identity field on the wire.
pub const ID_FIELD: &str = "id";

/// Read access to named field values.
///
/// The filter pipeline, the comparator and the table view work on anything
/// that implements this, so plain [`Record`]s and merged rows flow through
/// the same code.
pub trait FieldSource {
    /// Returns the value of `field`, or [`ValueRef::Null`] when absent.
    fn field(&self, field: &str) -> ValueRef<'_>;
}

impl<T: FieldSource + ?Sized> FieldSource for &T {
    fn field(&self, field: &str) -> ValueRef<'_> {
        (**self).field(field)
    }
}

/// One row of a collection: an identity plus field values.
///
/// The identity is kept apart from the other fields so it cannot be
/// overwritten by a field patch. It is still visible to sorting and search
/// through [`FieldSource`] under the name `id`.
///
/// # Example
///
/// ```
/// use crmgrid_lib::model::Record;
/// use crmgrid_lib::model::Value;
///
/// let record = Record::with_id(7)
///     .set("name", "Ada Lovelace")
///     .set("score", 91);
///
/// assert_eq!(record.get_string("name").unwrap(), Some("Ada Lovelace"));
/// assert_eq!(record.get("score").and_then(Value::as_f64), Some(91.0));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// The unique identifier of the record.
    pub(crate) id: Option<RecordId>,

    /// The field values, without the identity.
    pub(crate) fields: HashMap<String, Value>,
}

impl Record {
    /// Creates a new empty record without identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new record with the given ID.
    pub fn with_id(id: impl Into<RecordId>) -> Self {
        Self {
            id: Some(id.into()),
            fields: HashMap::new(),
        }
    }

    /// Returns the record ID, if set.
    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    /// Returns `true` if this record is the one `id` addresses.
    ///
    /// See [`RecordId::matches`].
    pub fn has_id(&self, id: &RecordId) -> bool {
        self.id.as_ref().is_some_and(|own| own.matches(id))
    }

    /// Sets the record ID.
    ///
    /// Only meant for records that do not have an identity yet, such as a
    /// create payload.
    pub fn set_id(&mut self, id: impl Into<RecordId>) {
        self.id = Some(id.into());
    }

    /// Returns a copy of this record with the identity removed.
    pub fn without_id(&self) -> Record {
        Record {
            id: None,
            fields: self.fields.clone(),
        }
    }

    // =========================================================================
    // Raw field access
    // =========================================================================

    /// Returns a reference to the field value, if it exists.
    ///
    /// The identity is not a stored field; use [`Record::id`] for it.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns `true` if the record contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Sets a field value (builder pattern).
    ///
    /// Setting `id` assigns the identity instead, when the value can be one.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Inserts a field value.
    ///
    /// Inserting `id` assigns the identity instead, when the value can be one.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        if field == ID_FIELD {
            if let Some(id) = RecordId::from_value(&value) {
                self.id = Some(id);
            }
            return;
        }
        self.fields.insert(field, value);
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Copies every field of `other` into this record.
    ///
    /// The identity of `self` is left untouched, whatever `other` carries.
    pub fn merge(&mut self, other: &Record) {
        for (field, value) in &other.fields {
            self.fields.insert(field.clone(), value.clone());
        }
    }

    /// Reads a text field.
    ///
    /// `Ok(None)` only when the field is present and null; an absent field
    /// or a value of another type is an error naming this record.
    pub fn get_string(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(self.id(), field)),
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(FieldError::type_mismatch(
                self.id(),
                field,
                "string",
                other.type_name(),
            )),
        }
    }
}

impl FieldSource for Record {
    fn field(&self, field: &str) -> ValueRef<'_> {
        if field == ID_FIELD {
            return self
                .id
                .as_ref()
                .map(RecordId::as_value_ref)
                .unwrap_or(ValueRef::Null);
        }
        self.fields
            .get(field)
            .map(Value::as_value_ref)
            .unwrap_or(ValueRef::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_id_assigns_identity() {
        let record = Record::new().set("id", 12).set("name", "Grace");
        assert_eq!(record.id(), Some(&RecordId::Number(12)));
        assert!(!record.contains("id"));
        assert_eq!(record.field("id"), ValueRef::Number(12.0));
    }

    #[test]
    fn test_merge_keeps_identity() {
        let mut record = Record::with_id(1).set("email", "old@example.com");
        let echo = Record::with_id(99)
            .set("email", "new@example.com")
            .set("status", "Contacted");

        record.merge(&echo);

        assert_eq!(record.id(), Some(&RecordId::Number(1)));
        assert_eq!(record.get_string("email").unwrap(), Some("new@example.com"));
        assert_eq!(record.get_string("status").unwrap(), Some("Contacted"));
    }

    #[test]
    fn test_typed_getters() {
        let record = Record::with_id(3).set("score", 40).set("note", Value::Null);

        assert_eq!(record.get("score").and_then(Value::as_f64), Some(40.0));
        assert_eq!(record.get_string("note").unwrap(), None);
        assert_eq!(
            record.get_string("score"),
            Err(FieldError::type_mismatch(
                Some(&RecordId::Number(3)),
                "score",
                "string",
                "number"
            ))
        );
        assert_eq!(
            record.get_string("missing").unwrap_err().to_string(),
            "Record 3 has no 'missing' field"
        );
    }

    #[test]
    fn test_absent_fields_read_as_null() {
        let record = Record::new();
        assert!(record.field("company").is_null());
        assert!(record.field("id").is_null());
    }
}
