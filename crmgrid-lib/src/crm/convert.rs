//! Lead conversion.

use super::leads;
use super::opportunities;
use crate::api::RecordStore;
use crate::error::EditError;
use crate::error::Error;
use crate::error::FieldError;
use crate::error::MutationAction;
use crate::model::Record;

/// Prefills an opportunity for a lead.
///
/// The lead must carry text `name` and `company` fields; a null one reads
/// as empty.
///
/// ```
/// use crmgrid_lib::crm::opportunity_draft_for;
/// use crmgrid_lib::model::Record;
///
/// let lead = Record::with_id(3).set("name", "Ada").set("company", "Engines Ltd");
/// let draft = opportunity_draft_for(&lead).unwrap();
/// assert_eq!(draft.get_string("name").unwrap(), Some("Ada - Opportunity"));
/// assert_eq!(draft.get_string("accountName").unwrap(), Some("Engines Ltd"));
/// ```
pub fn opportunity_draft_for(lead: &Record) -> Result<Record, FieldError> {
    let name = lead.get_string("name")?.unwrap_or_default();
    let company = lead.get_string("company")?.unwrap_or_default();
    Ok(opportunities::draft_template()
        .set("name", format!("{} - Opportunity", name))
        .set("accountName", company))
}

/// Converts a lead: creates the opportunity, then marks the lead converted.
///
/// The draft is validated first; nothing is written if it fails. If the
/// lead update fails the opportunity already exists, and the error says
/// so through [`MutationAction::Update`].
pub async fn convert_lead<S: RecordStore>(
    store: &S,
    lead: &Record,
    draft: &Record,
) -> Result<Record, Error> {
    let lead_id = lead.id().ok_or(EditError::MissingIdentity)?;
    opportunities::schema().validate(draft)?;

    let created = store
        .create(opportunities::COLLECTION, &draft.without_id())
        .await
        .map_err(|e| Error::mutation(MutationAction::Create, e))?;

    let patch = Record::new().set(leads::STATUS_FIELD, leads::CONVERTED);
    store
        .update(leads::COLLECTION, lead_id, &patch)
        .await
        .map_err(|e| Error::mutation(MutationAction::Update, e))?;

    log::debug!(
        "Converted lead {} into opportunity {}",
        lead_id,
        created.id().map(ToString::to_string).unwrap_or_default()
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordId;
    use crate::model::Value;

    #[test]
    fn test_draft_from_lead_fields() {
        let lead = Record::with_id(8)
            .set("name", "Grace")
            .set("company", Value::Null);
        let draft = opportunity_draft_for(&lead).unwrap();
        assert_eq!(draft.get_string("name").unwrap(), Some("Grace - Opportunity"));
        assert_eq!(draft.get_string("accountName").unwrap(), Some(""));
        assert!(draft.id().is_none());
    }

    #[test]
    fn test_draft_rejects_malformed_lead() {
        let lead = Record::with_id(8).set("name", "Grace");
        assert_eq!(
            opportunity_draft_for(&lead),
            Err(FieldError::missing(Some(&RecordId::Number(8)), "company"))
        );

        let lead = Record::with_id(9).set("name", 42).set("company", "Navy");
        let err = opportunity_draft_for(&lead).unwrap_err();
        assert_eq!(err.field(), "name");
        assert_eq!(err.to_string(), "'name' of Record 9 holds a number, not a string");
    }
}
