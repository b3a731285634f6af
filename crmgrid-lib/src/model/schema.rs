//! Field validation rules for records.

use super::Record;
use super::Value;
use super::ValueRef;
use crate::error::FieldValidationError;
use crate::error::ValidationError;

/// A single constraint on a field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// The value must be present and, for strings, non-empty.
    Required(String),
    /// A non-empty string must be a valid email address.
    Email(String),
    /// A present value must be a number no smaller than the bound.
    Min(f64, String),
    /// A present value must be a number no larger than the bound.
    Max(f64, String),
}

impl Rule {
    fn check(&self, value: Option<&Value>) -> Result<(), &str> {
        let value = value.map(Value::as_value_ref).unwrap_or(ValueRef::Null);
        let passed = match self {
            Rule::Required(_) => match value {
                ValueRef::Null => false,
                ValueRef::String(s) => !s.is_empty(),
                _ => true,
            },
            Rule::Email(_) => match value {
                ValueRef::String(s) => s.is_empty() || email_address::EmailAddress::is_valid(s),
                _ => true,
            },
            Rule::Min(bound, _) => match value {
                ValueRef::Null => true,
                ValueRef::Number(n) => n >= *bound,
                _ => false,
            },
            Rule::Max(bound, _) => match value {
                ValueRef::Null => true,
                ValueRef::Number(n) => n <= *bound,
                _ => false,
            },
        };
        if passed { Ok(()) } else { Err(self.message()) }
    }

    fn message(&self) -> &str {
        match self {
            Rule::Required(msg) | Rule::Email(msg) | Rule::Min(_, msg) | Rule::Max(_, msg) => msg,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FieldRules {
    field: String,
    rules: Vec<Rule>,
}

/// Validation rules for the records of one collection.
///
/// Only the first failing rule of each field is reported.
///
/// # Example
///
/// ```
/// use crmgrid_lib::model::{Record, RecordSchema};
///
/// let schema = RecordSchema::builder()
///     .field("email")
///         .required("Email is required")
///         .email("Invalid email address")
///     .field("score")
///         .min(0.0, "Score must be at least 0")
///     .build();
///
/// let record = Record::new().set("email", "nope").set("score", -1);
/// let err = schema.validate(&record).unwrap_err();
/// assert_eq!(err.errors.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSchema {
    fields: Vec<FieldRules>,
}

impl RecordSchema {
    /// Starts building a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            fields: Vec::new(),
        }
    }

    /// Returns `true` if the schema has rules for `field`.
    pub fn covers(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    /// Validates every ruled field of a record.
    pub fn validate(&self, record: &Record) -> Result<(), ValidationError> {
        let errors: Vec<FieldValidationError> = self
            .fields
            .iter()
            .filter_map(|f| first_failure(f, record.get(&f.field)))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(errors))
        }
    }

    /// Validates a single proposed field value.
    ///
    /// Fields without rules always pass.
    pub fn validate_field(&self, field: &str, value: &Value) -> Result<(), ValidationError> {
        let errors: Vec<FieldValidationError> = self
            .fields
            .iter()
            .filter(|f| f.field == field)
            .filter_map(|f| first_failure(f, Some(value)))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(errors))
        }
    }
}

fn first_failure(rules: &FieldRules, value: Option<&Value>) -> Option<FieldValidationError> {
    rules
        .rules
        .iter()
        .find_map(|rule| rule.check(value).err())
        .map(|msg| FieldValidationError::new(&rules.field, msg))
}

/// Builder for [`RecordSchema`].
pub struct SchemaBuilder {
    fields: Vec<FieldRules>,
}

impl SchemaBuilder {
    /// Starts the rules for a field.
    pub fn field(mut self, name: impl Into<String>) -> FieldRulesBuilder {
        let name = name.into();
        let rules = match self.fields.iter().position(|f| f.field == name) {
            Some(index) => self.fields.remove(index).rules,
            None => Vec::new(),
        };
        FieldRulesBuilder {
            schema: self,
            current: FieldRules { field: name, rules },
        }
    }

    /// Finishes the schema.
    pub fn build(self) -> RecordSchema {
        RecordSchema {
            fields: self.fields,
        }
    }
}

/// Collects the rules of one field; see [`RecordSchema::builder`].
pub struct FieldRulesBuilder {
    schema: SchemaBuilder,
    current: FieldRules,
}

impl FieldRulesBuilder {
    /// Add a custom rule.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.current.rules.push(rule);
        self
    }

    /// Require a present, non-empty value.
    pub fn required(self, msg: impl Into<String>) -> Self {
        self.rule(Rule::Required(msg.into()))
    }

    /// Require a valid email address when a value is given.
    pub fn email(self, msg: impl Into<String>) -> Self {
        self.rule(Rule::Email(msg.into()))
    }

    /// Require a number no smaller than `bound` when a value is given.
    pub fn min(self, bound: f64, msg: impl Into<String>) -> Self {
        self.rule(Rule::Min(bound, msg.into()))
    }

    /// Require a number no larger than `bound` when a value is given.
    pub fn max(self, bound: f64, msg: impl Into<String>) -> Self {
        self.rule(Rule::Max(bound, msg.into()))
    }

    /// Finish this field and start the next one.
    pub fn field(self, name: impl Into<String>) -> FieldRulesBuilder {
        self.finish().field(name)
    }

    /// Finish this field and the schema.
    pub fn build(self) -> RecordSchema {
        self.finish().build()
    }

    fn finish(self) -> SchemaBuilder {
        let mut schema = self.schema;
        schema.fields.push(self.current);
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> RecordSchema {
        RecordSchema::builder()
            .field("name")
            .required("Name is required")
            .field("email")
            .required("Email is required")
            .email("Invalid email address")
            .field("score")
            .min(0.0, "Score must be at least 0")
            .max(100.0, "Score must be at most 100")
            .build()
    }

    #[test]
    fn test_valid_record_passes() {
        let record = Record::new()
            .set("name", "Ada")
            .set("email", "ada@example.com")
            .set("score", 100);
        assert!(schema().validate(&record).is_ok());
    }

    #[test]
    fn test_first_failure_per_field() {
        let record = Record::new().set("email", "").set("score", 101);
        let err = schema().validate(&record).unwrap_err();

        let messages: Vec<(&str, &str)> = err
            .errors
            .iter()
            .map(|e| (e.field.as_str(), e.message.as_str()))
            .collect();
        assert_eq!(
            messages,
            vec![
                ("name", "Name is required"),
                ("email", "Email is required"),
                ("score", "Score must be at most 100"),
            ]
        );
    }

    #[test]
    fn test_validate_single_field() {
        let schema = schema();
        assert!(schema.validate_field("email", &Value::from("x@y.io")).is_ok());
        assert!(schema.validate_field("email", &Value::from("not-an-email")).is_err());
        assert!(schema.validate_field("status", &Value::from("")).is_ok());
        assert!(schema.validate_field("score", &Value::from("high")).is_err());
    }

    #[test]
    fn test_optional_numbers_accept_null() {
        let schema = RecordSchema::builder()
            .field("amount")
            .min(0.0, "Amount must be at least 0")
            .build();
        assert!(schema.validate(&Record::new()).is_ok());
        assert!(schema.validate_field("amount", &Value::Null).is_ok());
        assert!(schema.validate_field("amount", &Value::from(-5)).is_err());
    }

    #[test]
    fn test_reopening_a_field_appends_rules() {
        let schema = RecordSchema::builder()
            .field("name")
            .required("Name is required")
            .field("other")
            .required("Other is required")
            .field("name")
            .rule(Rule::Min(0.0, "never reached".to_string()))
            .build();
        assert!(schema.covers("name"));
        let err = schema.validate_field("name", &Value::Null).unwrap_err();
        assert_eq!(err.errors[0].message, "Name is required");
    }
}
