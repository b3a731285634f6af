//! The leads table.

use crate::TableConfig;
use crate::TableSession;
use crate::api::RecordStore;
use crate::error::ConfigError;
use crate::model::Columns;
use crate::model::FieldDescriptor;
use crate::model::Record;
use crate::model::RecordSchema;
use crate::query::SortDirective;

/// Collection name on the backend.
pub const COLLECTION: &str = "leads";

/// Field the status filter matches against.
pub const STATUS_FIELD: &str = "status";

/// Lead statuses, in pipeline order.
pub const STATUS_OPTIONS: [&str; 5] = ["New", "Contacted", "Qualified", "Converted", "Lost"];

/// Status of a lead that became an opportunity.
pub const CONVERTED: &str = "Converted";

/// Status of a lead that was given up.
pub const LOST: &str = "Lost";

/// Fields that can be edited in place.
pub const INLINE_FIELDS: [&str; 2] = ["email", STATUS_FIELD];

/// Column descriptors in display order.
pub fn columns() -> Result<Columns, ConfigError> {
    Columns::new([
        FieldDescriptor::new("id", "ID"),
        FieldDescriptor::new("name", "Name"),
        FieldDescriptor::new("company", "Company"),
        FieldDescriptor::new("email", "Email"),
        FieldDescriptor::new("source", "Source"),
        FieldDescriptor::new("score", "Score"),
        FieldDescriptor::new(STATUS_FIELD, "Status"),
        FieldDescriptor::new("actions", "Actions").unsortable(),
    ])
}

/// Validation rules for lead writes.
pub fn schema() -> RecordSchema {
    RecordSchema::builder()
        .field("name")
        .required("Name is required")
        .field("company")
        .required("Company is required")
        .field("email")
        .required("Email is required")
        .email("Invalid email address")
        .field("source")
        .required("Source is required")
        .field("score")
        .min(0.0, "Score must be at least 0")
        .max(100.0, "Score must be at most 100")
        .field(STATUS_FIELD)
        .required("Status is required")
        .build()
}

/// The leads table: searched by name and company, filtered by status,
/// best score first.
pub fn table_config() -> Result<TableConfig, ConfigError> {
    Ok(TableConfig::new()
        .with_columns(columns()?)
        .with_searchable(["name", "company"])
        .with_category_field(STATUS_FIELD)
        .with_sort(SortDirective::desc("score"))
        .with_page_size(super::PAGE_SIZE)
        .with_schema(schema()))
}

/// Initial values of a new lead.
pub fn draft_template() -> Record {
    Record::new()
        .set("name", "")
        .set("company", "")
        .set("email", "")
        .set("source", "")
        .set("score", 0)
        .set(STATUS_FIELD, "New")
}

/// Creates a session over the leads collection.
pub fn session<S: RecordStore>(store: S) -> Result<TableSession<S>, ConfigError> {
    Ok(TableSession::new(store, COLLECTION, table_config()?)
        .with_fetch_sort(SortDirective::desc("score"))
        .with_draft_template(draft_template()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldSource;

    #[test]
    fn test_configuration_is_valid() {
        let config = table_config().unwrap();
        assert_eq!(config.columns.len(), 8);
        assert!(!config.columns.is_sortable("actions"));
        assert_eq!(config.initial_sort, Some(SortDirective::desc("score")));
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_draft_template_fails_validation_until_filled() {
        let draft = draft_template();
        let err = schema().validate(&draft).unwrap_err();
        let fields: Vec<&str> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "company", "email", "source"]);

        let filled = draft
            .set("name", "Ada Lovelace")
            .set("company", "Analytical Engines")
            .set("email", "ada@example.com")
            .set("source", "Referral");
        assert!(schema().validate(&filled).is_ok());
        assert!(filled.field("id").is_null());
    }

    #[test]
    fn test_score_bounds() {
        let schema = schema();
        assert!(schema.validate_field("score", &101.into()).is_err());
        assert!(schema.validate_field("score", &0.into()).is_ok());
    }
}
