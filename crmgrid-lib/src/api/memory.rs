//! In-memory record store using DashMap

use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;

use super::CollectionQuery;
use super::RecordReader;
use super::RecordWriter;
use crate::error::ApiError;
use crate::model::FieldSource;
use crate::model::Record;
use crate::model::RecordId;
use crate::model::Value;
use crate::query::CategoryFilter;
use crate::query::sort_records;

/// A store operation, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Fetch,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct Inner {
    collections: DashMap<String, Vec<Record>>,
    failures: DashMap<StoreOp, String>,
    calls: DashMap<StoreOp, usize>,
    last_id: AtomicI64,
}

/// A record store kept in process memory.
///
/// Behaves like a json-server backend: `search` matches any string or
/// number field case-insensitively, criteria match exactly, creates assign
/// the next integer id when none is given. Clones share the same data.
///
/// # Example
///
/// ```
/// use crmgrid_lib::api::InMemoryStore;
/// use crmgrid_lib::model::Record;
///
/// let store = InMemoryStore::new()
///     .with_collection("leads", vec![Record::with_id(1).set("name", "Ada")]);
/// assert_eq!(store.records("leads").len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds records to a collection (builder pattern).
    pub fn with_collection(self, collection: impl Into<String>, records: Vec<Record>) -> Self {
        self.insert(collection, records);
        self
    }

    /// Appends records to a collection.
    pub fn insert(&self, collection: impl Into<String>, records: Vec<Record>) {
        for id in records.iter().filter_map(Record::id) {
            if let RecordId::Number(n) = id {
                self.inner.last_id.fetch_max(*n, Ordering::SeqCst);
            }
        }
        self.inner
            .collections
            .entry(collection.into())
            .or_default()
            .extend(records);
    }

    /// Returns a snapshot of a collection.
    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.inner
            .collections
            .get(collection)
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Returns a snapshot of one record.
    pub fn record(&self, collection: &str, id: &RecordId) -> Option<Record> {
        let records = self.inner.collections.get(collection)?;
        records.iter().find(|r| r.has_id(id)).cloned()
    }

    /// Makes the next call of `op` fail with `message`.
    pub fn fail_next(&self, op: StoreOp, message: impl Into<String>) {
        self.inner.failures.insert(op, message.into());
    }

    /// Returns how many times `op` was called, failed calls included.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.inner.calls.get(&op).map(|n| *n).unwrap_or(0)
    }

    fn enter(&self, op: StoreOp) -> Result<(), ApiError> {
        *self.inner.calls.entry(op).or_insert(0) += 1;
        match self.inner.failures.remove(&op) {
            Some((_, message)) => Err(ApiError::Rejected(message)),
            None => Ok(()),
        }
    }
}

fn matches_criteria(record: &Record, criteria: &[(String, Value)]) -> bool {
    criteria.iter().all(|(field, value)| {
        CategoryFilter::is(value.to_string()).matches(record.field(field))
    })
}

fn matches_term(record: &Record, term: &str) -> bool {
    let needle = term.to_lowercase();
    let id_matches = record
        .id()
        .is_some_and(|id| id.to_string().to_lowercase().contains(&needle));
    id_matches
        || record.fields().values().any(|value| match value {
            Value::String(_) | Value::Number(_) => {
                value.to_string().to_lowercase().contains(&needle)
            }
            _ => false,
        })
}

#[async_trait]
impl RecordReader for InMemoryStore {
    async fn fetch(&self, query: &CollectionQuery) -> Result<Vec<Record>, ApiError> {
        self.enter(StoreOp::Fetch)?;
        let records: Vec<Record> = self
            .records(&query.collection)
            .into_iter()
            .filter(|r| matches_criteria(r, &query.criteria))
            .filter(|r| query.search.as_deref().is_none_or(|term| matches_term(r, term)))
            .collect();
        Ok(sort_records(records, query.sort.as_ref()))
    }
}

#[async_trait]
impl RecordWriter for InMemoryStore {
    async fn create(&self, collection: &str, record: &Record) -> Result<Record, ApiError> {
        self.enter(StoreOp::Create)?;
        let mut created = record.clone();
        match created.id() {
            Some(RecordId::Number(n)) => {
                self.inner.last_id.fetch_max(*n, Ordering::SeqCst);
            }
            Some(RecordId::Text(_)) => {}
            None => {
                let id = self.inner.last_id.fetch_add(1, Ordering::SeqCst) + 1;
                created.set_id(id);
            }
        }
        self.inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        collection: &str,
        id: &RecordId,
        patch: &Record,
    ) -> Result<Option<Record>, ApiError> {
        self.enter(StoreOp::Update)?;
        let mut records = self
            .inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| ApiError::not_found(collection, id.clone()))?;
        let record = records
            .iter_mut()
            .find(|r| r.has_id(id))
            .ok_or_else(|| ApiError::not_found(collection, id.clone()))?;
        record.merge(patch);
        Ok(Some(record.clone()))
    }

    async fn delete(&self, collection: &str, id: &RecordId) -> Result<(), ApiError> {
        self.enter(StoreOp::Delete)?;
        let mut records = self
            .inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| ApiError::not_found(collection, id.clone()))?;
        let before = records.len();
        records.retain(|r| !r.has_id(id));
        if records.len() == before {
            return Err(ApiError::not_found(collection, id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortDirective;

    fn store() -> InMemoryStore {
        InMemoryStore::new().with_collection(
            "leads",
            vec![
                Record::with_id(1).set("name", "Ada").set("status", "New").set("score", 40),
                Record::with_id(2).set("name", "Grace").set("status", "Converted").set("score", 90),
                Record::with_id(3).set("name", "Alan").set("status", "Converted").set("score", 70),
            ],
        )
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .filter_map(|r| r.id().map(ToString::to_string))
            .collect()
    }

    #[tokio::test]
    async fn test_fetch_with_criteria_search_and_sort() {
        let store = store();
        let query = CollectionQuery::new("leads")
            .criterion("status", "Converted")
            .sort(SortDirective::desc("score"));
        assert_eq!(ids(&store.fetch(&query).await.unwrap()), vec!["2", "3"]);

        let query = CollectionQuery::new("leads").search("A");
        assert_eq!(ids(&store.fetch(&query).await.unwrap()), vec!["1", "2", "3"]);

        let query = CollectionQuery::new("leads").search("gra");
        assert_eq!(ids(&store.fetch(&query).await.unwrap()), vec!["2"]);
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let store = store();
        let created = store
            .create("leads", &Record::new().set("name", "Edsger"))
            .await
            .unwrap();
        assert_eq!(created.id(), Some(&RecordId::Number(4)));
        assert_eq!(store.records("leads").len(), 4);
    }

    #[tokio::test]
    async fn test_update_echoes_full_record() {
        let store = store();
        let echo = store
            .update("leads", &RecordId::Number(1), &Record::new().set("status", "Lost"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(echo.get_string("name").unwrap(), Some("Ada"));
        assert_eq!(echo.get_string("status").unwrap(), Some("Lost"));
    }

    #[tokio::test]
    async fn test_missing_records() {
        let store = store();
        let err = store.delete("leads", &RecordId::Number(9)).await.unwrap_err();
        assert!(err.is_not_found());
        let err = store
            .update("opportunities", &RecordId::Number(1), &Record::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failure_injection_is_one_shot() {
        let store = store();
        store.fail_next(StoreOp::Delete, "offline");

        let err = store.delete("leads", &RecordId::Number(1)).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "offline"));
        assert!(store.delete("leads", &RecordId::Number(1)).await.is_ok());
        assert_eq!(store.calls(StoreOp::Delete), 2);
        assert_eq!(store.calls(StoreOp::Update), 0);
    }
}
