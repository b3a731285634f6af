//! The opportunities table, with converted leads merged in.

use std::sync::Arc;

use super::leads;
use crate::TableConfig;
use crate::TableSession;
use crate::api::RecordStore;
use crate::error::ConfigError;
use crate::model::Columns;
use crate::model::FieldDescriptor;
use crate::model::Record;
use crate::model::RecordSchema;
use crate::model::Value;
use crate::query::SortDirective;
use crate::session::DerivedDelete;
use crate::session::SecondarySource;

/// Collection name on the backend.
pub const COLLECTION: &str = "opportunities";

/// Field the stage filter matches against.
pub const STAGE_FIELD: &str = "stage";

/// Stage shown for converted leads.
pub const CONVERTED_LEAD_STAGE: &str = "Converted Lead";

/// Stages an opportunity can be created in.
pub const STAGE_OPTIONS: [&str; 6] = [
    "Prospecting",
    "Qualification",
    "Proposal",
    "Negotiation",
    "Closed Won",
    "Closed Lost",
];

/// Stages offered by the stage filter.
pub const FILTER_OPTIONS: [&str; 7] = [
    "Prospecting",
    "Qualification",
    "Proposal",
    "Negotiation",
    "Closed Won",
    "Closed Lost",
    CONVERTED_LEAD_STAGE,
];

/// Column descriptors in display order.
pub fn columns() -> Result<Columns, ConfigError> {
    Columns::new([
        FieldDescriptor::new("id", "ID"),
        FieldDescriptor::new("name", "Name"),
        FieldDescriptor::new("accountName", "Account"),
        FieldDescriptor::new(STAGE_FIELD, "Stage"),
        FieldDescriptor::new("amount", "Amount"),
        FieldDescriptor::new("actions", "Actions").unsortable(),
    ])
}

/// Validation rules for opportunity writes.
pub fn schema() -> RecordSchema {
    RecordSchema::builder()
        .field("name")
        .required("Name is required")
        .field(STAGE_FIELD)
        .required("Stage is required")
        .field("amount")
        .min(0.0, "Amount must be at least 0")
        .field("accountName")
        .required("Account name is required")
        .build()
}

/// The opportunities table: searched by name and account, filtered by
/// stage, newest first.
pub fn table_config() -> Result<TableConfig, ConfigError> {
    Ok(TableConfig::new()
        .with_columns(columns()?)
        .with_searchable(["name", "accountName"])
        .with_category_field(STAGE_FIELD)
        .with_sort(SortDirective::desc("id"))
        .with_page_size(super::PAGE_SIZE)
        .with_schema(schema()))
}

/// Shows a converted lead as an opportunity row.
///
/// The amount is left out, which sorts the row with the nulls.
pub fn converted_lead_projection(lead: &Record) -> Record {
    let mut row = Record::new().set(STAGE_FIELD, CONVERTED_LEAD_STAGE);
    row.insert("name", lead.get("name").cloned().unwrap_or_default());
    row.insert("accountName", lead.get("company").cloned().unwrap_or_default());
    row
}

/// Converted leads, merged into the opportunities table.
///
/// Deleting one of these rows marks the lead as lost.
pub fn converted_leads() -> SecondarySource {
    SecondarySource::new(leads::COLLECTION, Arc::new(converted_lead_projection))
        .criterion(leads::STATUS_FIELD, leads::CONVERTED)
        .sort(SortDirective::desc("id"))
        .on_delete(DerivedDelete::Update {
            field: leads::STATUS_FIELD.to_string(),
            value: Value::from(leads::LOST),
        })
}

/// Initial values of a new opportunity.
pub fn draft_template() -> Record {
    Record::new()
        .set("name", "")
        .set(STAGE_FIELD, STAGE_OPTIONS[0])
        .set("accountName", "")
}

/// Creates a session over the opportunities collection.
pub fn session<S: RecordStore>(store: S) -> Result<TableSession<S>, ConfigError> {
    Ok(TableSession::new(store, COLLECTION, table_config()?)
        .with_fetch_sort(SortDirective::desc("id"))
        .with_secondary(converted_leads())
        .with_draft_template(draft_template()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldSource;
    use crate::model::ValueRef;

    #[test]
    fn test_projection_shape() {
        let lead = Record::with_id(8)
            .set("name", "Grace Hopper")
            .set("company", "Navy")
            .set("status", "Converted");
        let row = converted_lead_projection(&lead);

        assert_eq!(row.field("name"), ValueRef::String("Grace Hopper"));
        assert_eq!(row.field("accountName"), ValueRef::String("Navy"));
        assert_eq!(row.field("stage"), ValueRef::String("Converted Lead"));
        assert!(row.field("amount").is_null());
        assert!(!row.contains("status"));
    }

    #[test]
    fn test_session_starts_on_large_pages() {
        let session = session(crate::api::InMemoryStore::new()).unwrap();
        assert_eq!(session.view().params().page_size(), 100);
        assert_eq!(session.view().params().page(), 1);
    }

    #[test]
    fn test_amount_is_optional() {
        let draft = draft_template()
            .set("name", "Renewal")
            .set("accountName", "Contoso");
        assert!(schema().validate(&draft).is_ok());
        assert!(schema().validate(&draft.clone().set("amount", -1)).is_err());
    }
}
