//! Merging a secondary collection into the primary one.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::model::FieldSource;
use crate::model::Record;
use crate::model::RecordId;
use crate::model::ValueRef;

/// Maps a record of a secondary collection into the primary shape.
///
/// Implementations must be pure. The identity of the result is always
/// overwritten with the identity of the source record.
pub trait ProjectionRule: Send + Sync {
    /// Projects one secondary record.
    fn project(&self, source: &Record) -> Record;
}

impl<F> ProjectionRule for F
where
    F: Fn(&Record) -> Record + Send + Sync,
{
    fn project(&self, source: &Record) -> Record {
        self(source)
    }
}

/// Identifies a row of a merged table.
///
/// Primary and derived rows live in different collections, so their keys
/// are kept apart even when the raw ids coincide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    /// A record of the primary collection.
    Primary(RecordId),
    /// A projection of a secondary record with this id.
    Derived(RecordId),
}

impl RowKey {
    /// Returns the raw record id.
    pub fn id(&self) -> &RecordId {
        match self {
            RowKey::Primary(id) | RowKey::Derived(id) => id,
        }
    }

    /// Returns `true` for derived rows.
    pub fn is_derived(&self) -> bool {
        matches!(self, RowKey::Derived(_))
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Primary(id) => write!(f, "{}", id),
            RowKey::Derived(id) => write!(f, "derived:{}", id),
        }
    }
}

/// A row of a merged table: a record plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    record: Record,
    origin: Option<Arc<Record>>,
}

impl MergedRecord {
    /// Wraps a record of the primary collection.
    pub fn primary(record: Record) -> Self {
        Self {
            record,
            origin: None,
        }
    }

    /// Wraps a projected record and its source.
    pub fn derived(record: Record, origin: Arc<Record>) -> Self {
        Self {
            record,
            origin: Some(origin),
        }
    }

    /// Returns the record as displayed.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Consumes the row and returns the displayed record.
    pub fn into_record(self) -> Record {
        self.record
    }

    /// Returns `true` if the row is a projection of a secondary record.
    pub fn is_derived(&self) -> bool {
        self.origin.is_some()
    }

    /// Returns the secondary record this row was projected from.
    pub fn origin(&self) -> Option<&Record> {
        self.origin.as_deref()
    }

    /// Returns the id of the record this row stands for.
    pub fn origin_id(&self) -> Option<&RecordId> {
        self.record.id()
    }

    /// Returns the row key, if the record has an identity.
    pub fn key(&self) -> Option<RowKey> {
        let id = self.record.id()?.clone();
        Some(if self.is_derived() {
            RowKey::Derived(id)
        } else {
            RowKey::Primary(id)
        })
    }
}

impl FieldSource for MergedRecord {
    fn field(&self, field: &str) -> ValueRef<'_> {
        self.record.field(field)
    }
}

/// Projects a single secondary record, forcing the source identity.
pub fn project_one(source: &Arc<Record>, rule: &dyn ProjectionRule) -> MergedRecord {
    let mut record = rule.project(source);
    record.id = source.id.clone();
    MergedRecord::derived(record, Arc::clone(source))
}

/// Unions the primary records with the projected secondary records.
///
/// Primary rows come first, both in input order. A secondary id that also
/// exists in the primary collection is logged; both rows are kept and stay
/// distinguishable through [`RowKey`].
pub fn project(
    primary: &[Record],
    secondary: &[Arc<Record>],
    rule: &dyn ProjectionRule,
) -> Vec<MergedRecord> {
    let primary_ids: HashSet<&RecordId> = primary.iter().filter_map(Record::id).collect();

    let mut rows: Vec<MergedRecord> = Vec::with_capacity(primary.len() + secondary.len());
    rows.extend(primary.iter().cloned().map(MergedRecord::primary));
    for source in secondary {
        if let Some(id) = source.id()
            && primary_ids.contains(id)
        {
            log::warn!("Derived row {} collides with a primary record id", id);
        }
        rows.push(project_one(source, rule));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(source: &Record) -> Record {
        Record::new()
            .set("name", source.get("name").cloned().unwrap_or_default())
            .set("stage", "Converted Lead")
            .set("id", 999)
    }

    #[test]
    fn test_projection_keeps_source_identity() {
        let secondary = vec![Arc::new(Record::with_id(7).set("name", "Ada"))];
        let rows = project(&[], &secondary, &rule);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].origin_id(), Some(&RecordId::Number(7)));
        assert_eq!(rows[0].key(), Some(RowKey::Derived(RecordId::Number(7))));
        assert_eq!(rows[0].origin(), Some(&*secondary[0]));
        assert_eq!(rows[0].field("stage"), ValueRef::String("Converted Lead"));
    }

    #[test]
    fn test_primary_rows_come_first() {
        let primary = vec![Record::with_id(1), Record::with_id(2)];
        let secondary = vec![Arc::new(Record::with_id(3))];
        let rows = project(&primary, &secondary, &rule);

        let keys: Vec<RowKey> = rows.iter().filter_map(MergedRecord::key).collect();
        assert_eq!(
            keys,
            vec![
                RowKey::Primary(RecordId::Number(1)),
                RowKey::Primary(RecordId::Number(2)),
                RowKey::Derived(RecordId::Number(3)),
            ]
        );
    }

    #[test]
    fn test_colliding_ids_stay_distinct() {
        let primary = vec![Record::with_id(5)];
        let secondary = vec![Arc::new(Record::with_id(5))];
        let rows = project(&primary, &secondary, &rule);

        assert_eq!(rows.len(), 2);
        assert_ne!(rows[0].key(), rows[1].key());
        assert_eq!(rows[1].key().map(|k| k.to_string()), Some("derived:5".to_string()));
    }
}
