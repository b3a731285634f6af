//! Query sessions against a remote store.

use std::sync::Arc;

use crate::TableConfig;
use crate::api::CollectionQuery;
use crate::api::RecordStore;
use crate::edit::EditCoordinator;
use crate::edit::EditIntent;
use crate::edit::PendingCommit;
use crate::edit::Reconciliation;
use crate::edit::SubmitTrigger;
use crate::error::ApiError;
use crate::error::EditError;
use crate::error::Error;
use crate::error::MutationAction;
use crate::model::Record;
use crate::model::RecordId;
use crate::model::Value;
use crate::query::Page;
use crate::query::SortDirective;
use crate::view::MergedRecord;
use crate::view::ProjectionRule;
use crate::view::RowKey;
use crate::view::TableView;

/// What deleting a derived row does.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedDelete {
    /// Derived rows cannot be deleted.
    Reject,
    /// Set a field of the source record instead, which usually drops it
    /// out of the secondary criteria.
    Update { field: String, value: Value },
}

/// A secondary collection merged into the table.
#[derive(Clone)]
pub struct SecondarySource {
    /// Collection name.
    pub collection: String,
    /// Exact-match criteria selecting the records to merge.
    pub criteria: Vec<(String, Value)>,
    /// Server-side ordering hint.
    pub sort: Option<SortDirective>,
    /// Maps a secondary record into the primary shape.
    pub rule: Arc<dyn ProjectionRule>,
    /// What deleting a derived row does.
    pub on_delete: DerivedDelete,
}

impl SecondarySource {
    /// Creates a secondary source whose rows cannot be deleted.
    pub fn new(collection: impl Into<String>, rule: Arc<dyn ProjectionRule>) -> Self {
        Self {
            collection: collection.into(),
            criteria: Vec::new(),
            sort: None,
            rule,
            on_delete: DerivedDelete::Reject,
        }
    }

    /// Adds an exact-match criterion.
    pub fn criterion(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.criteria.push((field.into(), value.into()));
        self
    }

    /// Sets the ordering hint.
    pub fn sort(mut self, sort: SortDirective) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets what deleting a derived row does.
    pub fn on_delete(mut self, policy: DerivedDelete) -> Self {
        self.on_delete = policy;
        self
    }

    fn query(&self, search: &str) -> CollectionQuery {
        let mut query = CollectionQuery::new(&self.collection).search(search);
        query.criteria = self.criteria.clone();
        query.sort = self.sort.clone();
        query
    }
}

impl std::fmt::Debug for SecondarySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondarySource")
            .field("collection", &self.collection)
            .field("criteria", &self.criteria)
            .field("sort", &self.sort)
            .field("on_delete", &self.on_delete)
            .finish_non_exhaustive()
    }
}

/// One table bound to a remote store.
///
/// Owns the fetched rows, the view parameters, the inline edit state and
/// the create draft. Every method leaves the session usable, whatever the
/// store does.
///
/// # Example
///
/// ```ignore
/// use crmgrid_lib::{TableConfig, TableSession};
/// use crmgrid_lib::api::InMemoryStore;
/// use crmgrid_lib::model::Record;
///
/// let store = InMemoryStore::new()
///     .with_collection("leads", vec![Record::with_id(1).set("name", "Ada")]);
/// let mut session = TableSession::new(store, "leads", TableConfig::default());
/// session.refresh().await?;
/// assert_eq!(session.page().meta.total_items, 1);
/// ```
pub struct TableSession<S> {
    store: S,
    collection: String,
    fetch_sort: Option<SortDirective>,
    secondary: Option<SecondarySource>,
    draft_template: Record,
    draft: Option<Record>,
    view: TableView,
    edits: EditCoordinator,
}

impl<S: RecordStore> TableSession<S> {
    /// Creates a session for one collection. Nothing is fetched yet.
    pub fn new(store: S, collection: impl Into<String>, config: TableConfig) -> Self {
        Self {
            store,
            collection: collection.into(),
            fetch_sort: None,
            secondary: None,
            draft_template: Record::new(),
            draft: None,
            view: TableView::new(config),
            edits: EditCoordinator::new(),
        }
    }

    /// Sets the server-side ordering hint of the primary fetch.
    pub fn with_fetch_sort(mut self, sort: SortDirective) -> Self {
        self.fetch_sort = Some(sort);
        self
    }

    /// Merges a secondary collection into the table.
    pub fn with_secondary(mut self, source: SecondarySource) -> Self {
        self.view = self.view.with_projection(Arc::clone(&source.rule));
        self.secondary = Some(source);
        self
    }

    /// Sets the initial values of create drafts.
    pub fn with_draft_template(mut self, template: Record) -> Self {
        self.draft_template = template;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the primary collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the table view.
    pub fn view(&self) -> &TableView {
        &self.view
    }

    /// Returns the table view for parameter changes.
    pub fn view_mut(&mut self) -> &mut TableView {
        &mut self.view
    }

    /// Returns the inline edit state.
    pub fn edits(&self) -> &EditCoordinator {
        &self.edits
    }

    /// Returns the visible page.
    pub fn page(&mut self) -> &Page<MergedRecord> {
        self.view.page()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches the collection (and the secondary one) again, replacing every
    /// row. On failure the rows are left as they were.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        let search = self.view.params().search().to_string();
        let mut query = CollectionQuery::new(&self.collection).search(&search);
        query.sort = self.fetch_sort.clone();

        match &self.secondary {
            Some(secondary) => {
                let secondary_query = secondary.query(&search);
                let (primary, derived) = futures::try_join!(
                    self.store.fetch(&query),
                    self.store.fetch(&secondary_query)
                )
                .map_err(Error::Fetch)?;
                log::debug!(
                    "Fetched {} {} and {} {}",
                    primary.len(),
                    self.collection,
                    derived.len(),
                    secondary.collection
                );
                self.view.replace_all(primary, derived);
            }
            None => {
                let primary = self.store.fetch(&query).await.map_err(Error::Fetch)?;
                log::debug!("Fetched {} {}", primary.len(), self.collection);
                self.view.replace_records(primary);
            }
        }
        Ok(())
    }

    /// Sets the search text and fetches again.
    pub async fn search(&mut self, text: impl Into<String>) -> Result<(), Error> {
        self.view.set_search(text);
        self.refresh().await
    }

    async fn refresh_after_failure(&mut self) {
        if let Err(e) = self.refresh().await {
            log::warn!("Refetch after failed write also failed: {}", e);
        }
    }

    // =========================================================================
    // Inline edits
    // =========================================================================

    /// Starts editing a cell.
    pub fn begin_edit(&mut self, row: &RowKey, field: &str) -> Result<&EditIntent, Error> {
        Ok(self.edits.begin(&self.view, row, field)?)
    }

    /// Replaces the value of the cell being edited.
    pub fn set_edit_value(&mut self, value: impl Into<Value>) -> Result<(), Error> {
        Ok(self.edits.set_value(value)?)
    }

    /// Replaces the value of the cell being edited with typed input.
    pub fn set_edit_input(&mut self, input: &str) -> Result<(), Error> {
        Ok(self.edits.set_input(input)?)
    }

    /// Leaves editing without touching the store.
    pub fn cancel_edit(&mut self) -> Option<EditIntent> {
        self.edits.cancel()
    }

    /// Submits the cell being edited and sends exactly one update.
    ///
    /// The value shows in the view before the store answers. On failure it
    /// is discarded, the rows are fetched again and the failure returned.
    pub async fn commit_edit(&mut self, trigger: SubmitTrigger) -> Result<Reconciliation, Error> {
        let pending = self.submit_edit(trigger)?;
        let result = self
            .store
            .update(&self.collection, pending.id(), pending.patch())
            .await;
        self.complete_edit(pending, result).await
    }

    /// Submits the cell being edited without sending it.
    ///
    /// Send the patch of the returned commit to the store yourself and pass
    /// the outcome to [`TableSession::complete_edit`]. Commits on different
    /// cells may be in flight together and completed in any order.
    pub fn submit_edit(&mut self, trigger: SubmitTrigger) -> Result<PendingCommit, Error> {
        self.edits.submit(&mut self.view, trigger)
    }

    /// Reconciles a commit from [`TableSession::submit_edit`] with the
    /// store's answer. A failed update refetches and is returned.
    pub async fn complete_edit(
        &mut self,
        pending: PendingCommit,
        result: Result<Option<Record>, ApiError>,
    ) -> Result<Reconciliation, Error> {
        match self.edits.complete(&mut self.view, pending, result) {
            Reconciliation::RolledBack(error) => {
                self.refresh_after_failure().await;
                Err(Error::mutation(MutationAction::Update, error))
            }
            outcome => Ok(outcome),
        }
    }

    // =========================================================================
    // Whole-record writes
    // =========================================================================

    /// Opens a create draft pre-filled from the draft template.
    ///
    /// An open draft is replaced.
    pub fn begin_create(&mut self) -> &mut Record {
        self.draft.insert(self.draft_template.clone())
    }

    /// Returns the open draft.
    pub fn draft(&self) -> Option<&Record> {
        self.draft.as_ref()
    }

    /// Returns the open draft for changes.
    pub fn draft_mut(&mut self) -> Option<&mut Record> {
        self.draft.as_mut()
    }

    /// Closes the draft without creating anything.
    pub fn discard_draft(&mut self) -> Option<Record> {
        self.draft.take()
    }

    /// Validates the draft and creates it.
    ///
    /// On success the draft is closed and the rows are fetched again. On
    /// failure the draft stays open for correction.
    pub async fn submit_create(&mut self) -> Result<Record, Error> {
        let draft = self.draft.as_ref().ok_or(EditError::NoDraft)?;
        self.view.config().schema.validate(draft)?;

        let created = self
            .store
            .create(&self.collection, &draft.without_id())
            .await
            .map_err(|e| Error::mutation(MutationAction::Create, e))?;
        log::debug!(
            "Created {} in {}",
            created.id().map(ToString::to_string).unwrap_or_default(),
            self.collection
        );

        self.draft = None;
        self.refresh().await?;
        Ok(created)
    }

    /// Validates and sends a whole-record update, then fetches again.
    ///
    /// Unlike inline edits nothing is applied before the store answers.
    pub async fn update_record(&mut self, id: &RecordId, patch: &Record) -> Result<(), Error> {
        let mut merged = self
            .view
            .record(id)
            .cloned()
            .ok_or_else(|| EditError::UnknownRecord(id.clone()))?;
        merged.merge(patch);
        self.view.config().schema.validate(&merged)?;

        self.store
            .update(&self.collection, id, &patch.without_id())
            .await
            .map_err(|e| Error::mutation(MutationAction::Update, e))?;
        self.refresh().await
    }

    /// Deletes a row, then fetches again.
    ///
    /// Primary rows are deleted. Derived rows follow the secondary source's
    /// [`DerivedDelete`] policy. On failure the row stays.
    pub async fn delete(&mut self, row: &RowKey) -> Result<(), Error> {
        match row {
            RowKey::Primary(id) => {
                self.store
                    .delete(&self.collection, id)
                    .await
                    .map_err(|e| Error::mutation(MutationAction::Delete, e))?;
                log::debug!("Deleted {} from {}", id, self.collection);
            }
            RowKey::Derived(id) => {
                let Some(secondary) = &self.secondary else {
                    return Err(EditError::DerivedRow(id.clone()).into());
                };
                let DerivedDelete::Update { field, value } = &secondary.on_delete else {
                    return Err(EditError::DerivedRow(id.clone()).into());
                };
                let patch = Record::new().set(field.clone(), value.clone());
                self.store
                    .update(&secondary.collection, id, &patch)
                    .await
                    .map_err(|e| Error::mutation(MutationAction::Delete, e))?;
                log::debug!("Set {} of {} {} to {}", field, secondary.collection, id, value);
            }
        }
        self.refresh().await
    }
}

impl<S> std::fmt::Debug for TableSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSession")
            .field("collection", &self.collection)
            .field("secondary", &self.secondary)
            .field("view", &self.view)
            .field("draft", &self.draft)
            .finish_non_exhaustive()
    }
}
