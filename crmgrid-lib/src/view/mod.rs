//! Table view derivation.
//!
//! A view is a pure function of the raw rows and a [`ViewParameters`]
//! value: merge → filter → sort → paginate. [`TableView`] owns the raw rows
//! of one query session and memoizes the last derivation.

mod merge;
mod table;

use std::sync::Arc;

use serde::Serialize;

pub use merge::*;
pub use table::*;

use crate::TableConfig;
use crate::model::FieldSource;
use crate::model::Record;
use crate::query::CategoryFilter;
use crate::query::Page;
use crate::query::SortDirective;
use crate::query::filter_records;
use crate::query::paginate;
use crate::query::sort_records;

/// The user-controlled inputs of a view.
///
/// Changing the search text, the category or the page size moves back to
/// page 1. Changing the sort keeps the page.
///
/// # Example
///
/// ```
/// use crmgrid_lib::view::ViewParameters;
///
/// let mut params = ViewParameters::new(5);
/// params.set_page(3);
/// params.set_search("acme");
/// assert_eq!(params.page(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewParameters {
    search: String,
    category: CategoryFilter,
    page: usize,
    page_size: usize,
    sort: Option<SortDirective>,
}

impl Default for ViewParameters {
    fn default() -> Self {
        Self::new(20)
    }
}

impl ViewParameters {
    /// Creates parameters showing the first page of everything, unsorted.
    pub fn new(page_size: usize) -> Self {
        Self {
            search: String::new(),
            category: CategoryFilter::All,
            page: 1,
            page_size: page_size.max(1),
            sort: None,
        }
    }

    /// Creates the initial parameters of a configured table.
    pub fn from_config(config: &TableConfig) -> Self {
        Self {
            sort: config.initial_sort.clone(),
            ..Self::new(config.page_size)
        }
    }

    /// Sets the sort (builder pattern).
    pub fn with_sort(mut self, sort: SortDirective) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Returns the raw search text.
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Returns the categorical filter.
    pub fn category(&self) -> &CategoryFilter {
        &self.category
    }

    /// Returns the 1-based page.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Returns the page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the active sort.
    pub fn sort(&self) -> Option<&SortDirective> {
        self.sort.as_ref()
    }

    /// Moves to a page. Zero is raised to one.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Sets the search text, moving to page 1 if it changed.
    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if search != self.search {
            self.search = search;
            self.page = 1;
        }
    }

    /// Sets the categorical filter, moving to page 1 if it changed.
    pub fn set_category(&mut self, category: impl Into<CategoryFilter>) {
        let category = category.into();
        if category != self.category {
            self.category = category;
            self.page = 1;
        }
    }

    /// Sets the page size, moving to page 1 if it changed.
    pub fn set_page_size(&mut self, page_size: usize) {
        let page_size = page_size.max(1);
        if page_size != self.page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    /// Sets or clears the sort. The page is kept.
    pub fn set_sort(&mut self, sort: Option<SortDirective>) {
        self.sort = sort;
    }
}

/// The secondary collection and the rule that projects it.
#[derive(Clone, Copy)]
pub struct MergeInputs<'a> {
    /// Records of the secondary collection.
    pub secondary: &'a [Arc<Record>],
    /// Maps a secondary record into the primary shape.
    pub rule: &'a dyn ProjectionRule,
}

/// Derives the visible page of a row set: filter → sort → paginate.
///
/// Sorting covers the whole filtered set, never a single page.
pub fn derive_view<'a, T: FieldSource>(
    rows: &'a [T],
    params: &ViewParameters,
    config: &TableConfig,
) -> Page<&'a T> {
    let filtered = filter_records(
        rows,
        &params.search,
        &params.category,
        &config.searchable,
        &config.category_field,
    );
    let sorted = sort_records(filtered, params.sort.as_ref());
    paginate(sorted, params.page, params.page_size)
}

/// Derives the visible page of a table, merging in a secondary collection
/// first when one is given.
pub fn derive_table(
    primary: &[Record],
    merge: Option<MergeInputs<'_>>,
    params: &ViewParameters,
    config: &TableConfig,
) -> Page<MergedRecord> {
    let rows: Vec<MergedRecord> = match merge {
        Some(inputs) => project(primary, inputs.secondary, inputs.rule),
        None => primary.iter().cloned().map(MergedRecord::primary).collect(),
    };
    derive_view(&rows, params, config).cloned()
}
