//! Free-text and categorical row filtering.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::model::FieldSource;
use crate::model::Value;
use crate::model::ValueRef;

/// The categorical filter of a table.
///
/// The pager's select box offers `"all"` next to the concrete options; it
/// converts to [`CategoryFilter::All`].
///
/// # Example
///
/// ```
/// use crmgrid_lib::query::CategoryFilter;
///
/// assert_eq!(CategoryFilter::from("all"), CategoryFilter::All);
/// assert_eq!(CategoryFilter::from("Qualified"), CategoryFilter::is("Qualified"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    /// No categorical restriction.
    #[default]
    All,
    /// Only rows whose categorical field equals the value.
    Is(String),
}

impl CategoryFilter {
    /// The sentinel that means "no restriction".
    pub const ALL: &'static str = "all";

    /// Creates a filter on one category.
    pub fn is(value: impl Into<String>) -> Self {
        CategoryFilter::Is(value.into())
    }

    /// Returns `true` if the filter lets every row through.
    pub fn is_all(&self) -> bool {
        matches!(self, CategoryFilter::All)
    }

    /// Tests a categorical field value.
    pub fn matches(&self, value: ValueRef<'_>) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Is(wanted) => match value {
                ValueRef::String(s) => s == wanted,
                ValueRef::Number(_) | ValueRef::Bool(_) => value.to_value().to_string() == *wanted,
                ValueRef::Null | ValueRef::Other => false,
            },
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        if value == Self::ALL {
            CategoryFilter::All
        } else {
            CategoryFilter::Is(value.to_string())
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        if value == Self::ALL {
            CategoryFilter::All
        } else {
            CategoryFilter::Is(value)
        }
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        match filter {
            CategoryFilter::All => CategoryFilter::ALL.to_string(),
            CategoryFilter::Is(value) => value,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(Self::ALL),
            CategoryFilter::Is(value) => f.write_str(value),
        }
    }
}

/// Tests a row against already normalized search text.
///
/// `needle` must be trimmed and lower-cased; an empty needle matches
/// everything. Strings and numbers are searched by their display text.
pub fn matches_search<T: FieldSource>(record: &T, needle: &str, searchable: &[String]) -> bool {
    if needle.is_empty() {
        return true;
    }
    searchable.iter().any(|field| match record.field(field) {
        ValueRef::String(s) => s.to_lowercase().contains(needle),
        ValueRef::Number(n) => Value::Number(n).to_string().contains(needle),
        _ => false,
    })
}

/// Reduces rows to those matching the search text and the category.
///
/// The search text is trimmed and compared case-insensitively against
/// every `searchable` field; the category is matched exactly against
/// `category_field`. Both must pass. Input order is preserved.
///
/// # Example
///
/// ```
/// use crmgrid_lib::model::Record;
/// use crmgrid_lib::query::{CategoryFilter, filter_records};
///
/// let leads = vec![
///     Record::with_id(1).set("name", "Ada").set("status", "New"),
///     Record::with_id(2).set("name", "Adam").set("status", "Lost"),
/// ];
/// let searchable = vec!["name".to_string()];
///
/// let hits = filter_records(&leads, " ADA ", &CategoryFilter::is("New"), &searchable, "status");
/// assert_eq!(hits.len(), 1);
/// ```
pub fn filter_records<'a, T: FieldSource>(
    records: &'a [T],
    search: &str,
    category: &CategoryFilter,
    searchable: &[String],
    category_field: &str,
) -> Vec<&'a T> {
    let needle = search.trim().to_lowercase();
    records
        .iter()
        .filter(|record| matches_search(*record, &needle, searchable))
        .filter(|record| category.matches(record.field(category_field)))
        .collect()
}
