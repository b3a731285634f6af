//! Collaborator traits and the collection query.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::model::Record;
use crate::model::RecordId;
use crate::model::Value;
use crate::query::SortDirective;

/// What to read from a collection.
///
/// Stores narrow the result server-side where they can; the table engine
/// filters and sorts the returned rows again, so a store that ignores
/// `search` or `sort` still produces correct views.
///
/// # Example
///
/// ```
/// use crmgrid_lib::api::CollectionQuery;
/// use crmgrid_lib::query::SortDirective;
///
/// let query = CollectionQuery::new("leads")
///     .search("acme")
///     .criterion("status", "Converted")
///     .sort(SortDirective::desc("id"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    /// Collection name, e.g. `leads`.
    pub collection: String,
    /// Full-text search term; `None` when blank.
    pub search: Option<String>,
    /// Exact-match field criteria, all of which must hold.
    pub criteria: Vec<(String, Value)>,
    /// Server-side ordering hint.
    pub sort: Option<SortDirective>,
}

impl CollectionQuery {
    /// Creates a query for every record of a collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            search: None,
            criteria: Vec::new(),
            sort: None,
        }
    }

    /// Sets the search term. Blank terms are dropped.
    pub fn search(mut self, term: impl AsRef<str>) -> Self {
        let term = term.as_ref().trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self
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
}

/// Reads collections from a remote store.
#[async_trait]
pub trait RecordReader: Send + Sync {
    /// Fetches the records matching a query.
    async fn fetch(&self, query: &CollectionQuery) -> Result<Vec<Record>, ApiError>;
}

/// Writes records to a remote store.
///
/// None of these are retried; `create` in particular is not idempotent.
#[async_trait]
pub trait RecordWriter: Send + Sync {
    /// Creates a record and returns it with its identity.
    ///
    /// Stores assign an identity when `record` has none.
    async fn create(&self, collection: &str, record: &Record) -> Result<Record, ApiError>;

    /// Applies a partial record and returns the updated record, or `None`
    /// when the store does not echo it.
    async fn update(
        &self,
        collection: &str,
        id: &RecordId,
        patch: &Record,
    ) -> Result<Option<Record>, ApiError>;

    /// Deletes a record.
    async fn delete(&self, collection: &str, id: &RecordId) -> Result<(), ApiError>;
}

/// A store that can both read and write.
pub trait RecordStore: RecordReader + RecordWriter {}

impl<T: RecordReader + RecordWriter> RecordStore for T {}
