//! Ordering types and the field value comparator.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;

use crate::model::FieldSource;
use crate::model::ValueRef;

/// Sort direction for ordering rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending order (A-Z, 0-9), nulls first.
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0), nulls last.
    Desc,
}

impl Direction {
    /// Returns the opposite direction.
    pub fn reverse(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }

    /// Orients an ascending ordering to this direction.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }

    /// Returns the wire name (`asc` or `desc`).
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Specifies the ordering of table rows.
///
/// At most one column is sorted at a time.
///
/// # Example
///
/// ```
/// use crmgrid_lib::query::{Direction, SortDirective};
///
/// let sort = SortDirective::desc("score");
///
/// // Clicking the same header flips the direction
/// assert_eq!(sort.toggled("score").direction(), Direction::Asc);
///
/// // Clicking another header sorts it ascending
/// assert_eq!(sort.toggled("name"), SortDirective::asc("name"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortDirective {
    pub(crate) property: String,
    pub(crate) direction: Direction,
}

impl SortDirective {
    /// Creates a sort directive.
    pub fn new(property: impl Into<String>, direction: Direction) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }

    /// Creates an ascending sort on a field.
    pub fn asc(property: impl Into<String>) -> Self {
        Self::new(property, Direction::Asc)
    }

    /// Creates a descending sort on a field.
    pub fn desc(property: impl Into<String>) -> Self {
        Self::new(property, Direction::Desc)
    }

    /// Returns the sorted field.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Returns the sort direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the directive after a header activation on `property`.
    pub fn toggled(&self, property: &str) -> SortDirective {
        if self.property == property {
            SortDirective::new(property, self.direction.reverse())
        } else {
            SortDirective::asc(property)
        }
    }
}

/// Compares two field values under a sort direction.
///
/// Rules, in order:
///
/// 1. two nulls are equal
/// 2. a null sorts before anything under [`Direction::Asc`], after under
///    [`Direction::Desc`]
/// 3. strings use a case-insensitive collation, lowercase first on ties
/// 4. numbers compare numerically
/// 5. anything else is equal, so the stable sort leaves it in place
pub fn compare_values(a: ValueRef<'_>, b: ValueRef<'_>, direction: Direction) -> Ordering {
    direction.apply(compare_ascending(a, b))
}

fn compare_ascending(a: ValueRef<'_>, b: ValueRef<'_>) -> Ordering {
    match (a, b) {
        (ValueRef::Null, ValueRef::Null) => Ordering::Equal,
        (ValueRef::Null, _) => Ordering::Less,
        (_, ValueRef::Null) => Ordering::Greater,
        (ValueRef::String(a), ValueRef::String(b)) => collate(a, b),
        (ValueRef::Number(a), ValueRef::Number(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

fn collate(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.chars().map(swap_case).cmp(b.chars().map(swap_case)))
}

// Lowercase letters have higher code points than uppercase ones, so
// swapping case puts `a` before `A` in a code point comparison.
fn swap_case(c: char) -> char {
    if c.is_lowercase() {
        c.to_uppercase().next().unwrap_or(c)
    } else if c.is_uppercase() {
        c.to_lowercase().next().unwrap_or(c)
    } else {
        c
    }
}

/// Sorts rows by one field. `None` keeps the input order.
///
/// The sort is stable in both directions.
pub fn sort_records<T: FieldSource>(records: Vec<T>, sort: Option<&SortDirective>) -> Vec<T> {
    let Some(sort) = sort else {
        return records;
    };
    let mut compare = |a: &T, b: &T| {
        compare_values(
            a.field(&sort.property),
            b.field(&sort.property),
            sort.direction,
        )
    };
    merge_sort_by(records, &mut compare)
}

// `slice::sort_by` may panic when the comparison is not a total order,
// which rule 5 allows; a merge sort only ever asks "is right < left".
fn merge_sort_by<T, F>(mut items: Vec<T>, compare: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort_by(items, compare);
    let right = merge_sort_by(right, compare);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(l, r) != Ordering::Greater,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        merged.extend(next);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;

    fn values() -> Vec<ValueRef<'static>> {
        vec![
            ValueRef::Null,
            ValueRef::Number(-3.5),
            ValueRef::Number(0.0),
            ValueRef::Number(12.0),
            ValueRef::String("apple"),
            ValueRef::String("Apple"),
            ValueRef::String("banana"),
            ValueRef::Bool(true),
            ValueRef::Other,
        ]
    }

    #[test]
    fn test_direction_symmetry() {
        for a in values() {
            for b in values() {
                let asc = compare_values(a, b, Direction::Asc);
                let desc = compare_values(a, b, Direction::Desc);
                assert_eq!(asc, desc.reverse(), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_null_placement() {
        assert_eq!(
            compare_values(ValueRef::Null, ValueRef::Number(1.0), Direction::Asc),
            Ordering::Less
        );
        assert_eq!(
            compare_values(ValueRef::Null, ValueRef::String("a"), Direction::Desc),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(ValueRef::Null, ValueRef::Null, Direction::Desc),
            Ordering::Equal
        );
    }

    #[test]
    fn test_string_collation() {
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
        assert_eq!(collate("Zed", "alpha"), Ordering::Greater);
        assert_eq!(collate("apple", "Apple"), Ordering::Less);
        assert_eq!(collate("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_mixed_types_are_equal() {
        assert_eq!(
            compare_values(ValueRef::String("10"), ValueRef::Number(10.0), Direction::Asc),
            Ordering::Equal
        );
        assert_eq!(
            compare_values(ValueRef::Bool(true), ValueRef::Number(1.0), Direction::Desc),
            Ordering::Equal
        );
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.id().map(|id| id.to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_sort_is_stable_in_both_directions() {
        let records = vec![
            Record::with_id(1).set("stage", "Proposal"),
            Record::with_id(2).set("stage", "Closed Won"),
            Record::with_id(3).set("stage", "Proposal"),
            Record::with_id(4).set("stage", "Closed Won"),
        ];

        let asc = sort_records(records.clone(), Some(&SortDirective::asc("stage")));
        assert_eq!(ids(&asc), vec!["2", "4", "1", "3"]);

        let desc = sort_records(records, Some(&SortDirective::desc("stage")));
        assert_eq!(ids(&desc), vec!["1", "3", "2", "4"]);
    }

    #[test]
    fn test_nulls_first_regardless_of_count() {
        let records = vec![
            Record::with_id(1).set("amount", 500),
            Record::with_id(2),
            Record::with_id(3).set("amount", 100),
            Record::with_id(4).set("amount", crate::model::Value::Null),
            Record::with_id(5),
        ];

        let asc = sort_records(records.clone(), Some(&SortDirective::asc("amount")));
        assert_eq!(ids(&asc), vec!["2", "4", "5", "3", "1"]);

        let desc = sort_records(records, Some(&SortDirective::desc("amount")));
        assert_eq!(ids(&desc), vec!["1", "3", "2", "4", "5"]);
    }

    #[test]
    fn test_sort_by_identity() {
        let records = vec![Record::with_id(2), Record::with_id(10), Record::with_id(1)];
        let sorted = sort_records(records, Some(&SortDirective::desc("id")));
        assert_eq!(ids(&sorted), vec!["10", "2", "1"]);
    }

    #[test]
    fn test_mixed_column_does_not_panic() {
        let records: Vec<Record> = (0..40)
            .map(|i| {
                let record = Record::with_id(i);
                match i % 3 {
                    0 => record.set("x", i),
                    1 => record.set("x", format!("v{}", i)),
                    _ => record.set("x", true),
                }
            })
            .collect();
        let sorted = sort_records(records, Some(&SortDirective::asc("x")));
        assert_eq!(sorted.len(), 40);
    }

    #[test]
    fn test_no_directive_keeps_order() {
        let records = vec![Record::with_id(3), Record::with_id(1)];
        assert_eq!(ids(&sort_records(records, None)), vec!["3", "1"]);
    }
}
