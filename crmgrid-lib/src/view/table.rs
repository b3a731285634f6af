//! Stateful table view with a memoized derivation.

use std::sync::Arc;

use super::MergeInputs;
use super::MergedRecord;
use super::ProjectionRule;
use super::RowKey;
use super::ViewParameters;
use super::derive_table;
use super::project_one;
use crate::TableConfig;
use crate::model::Columns;
use crate::model::Record;
use crate::model::RecordId;
use crate::model::Value;
use crate::query::CategoryFilter;
use crate::query::Page;
use crate::query::SortDirective;

struct Memo {
    generation: u64,
    params: ViewParameters,
    page: Page<MergedRecord>,
}

/// The raw rows of one query session and the parameters they are viewed
/// through.
///
/// Two counters track changes to the rows:
///
/// - the *generation* moves on every change, local patches included, and
///   keys the memo of the last derivation
/// - the *epoch* moves only when a fetch replaces the rows; a commit that
///   was sent in an older epoch must not touch the newer rows
pub struct TableView {
    config: TableConfig,
    columns: Columns,
    params: ViewParameters,
    primary: Vec<Record>,
    secondary: Vec<Arc<Record>>,
    rule: Option<Arc<dyn ProjectionRule>>,
    generation: u64,
    epoch: u64,
    memo: Option<Memo>,
}

impl TableView {
    /// Creates an empty view of a configured table.
    pub fn new(config: TableConfig) -> Self {
        Self {
            columns: config.columns.clone(),
            params: ViewParameters::from_config(&config),
            config,
            primary: Vec::new(),
            secondary: Vec::new(),
            rule: None,
            generation: 0,
            epoch: 0,
            memo: None,
        }
    }

    /// Sets the rule that projects secondary records (builder pattern).
    pub fn with_projection(mut self, rule: Arc<dyn ProjectionRule>) -> Self {
        self.rule = Some(rule);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the table configuration.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Returns the current column descriptors.
    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Returns the current view parameters.
    pub fn params(&self) -> &ViewParameters {
        &self.params
    }

    /// Returns the primary records in fetch order.
    pub fn records(&self) -> &[Record] {
        &self.primary
    }

    /// Returns the secondary records in fetch order.
    pub fn secondary(&self) -> &[Arc<Record>] {
        &self.secondary
    }

    /// Returns the change counter of the rows.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the fetch counter of the rows.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns the primary record with this id.
    pub fn record(&self, id: &RecordId) -> Option<&Record> {
        self.primary.iter().find(|r| r.has_id(id))
    }

    /// Looks up a row by key, projecting derived rows on the fly.
    pub fn find(&self, key: &RowKey) -> Option<MergedRecord> {
        match key {
            RowKey::Primary(id) => self.record(id).cloned().map(MergedRecord::primary),
            RowKey::Derived(id) => {
                let rule = self.rule.as_deref()?;
                self.secondary
                    .iter()
                    .find(|r| r.has_id(id))
                    .map(|source| project_one(source, rule))
            }
        }
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Sets the search text. Moves to page 1 if it changed.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.params.set_search(search);
    }

    /// Sets the categorical filter. Moves to page 1 if it changed.
    pub fn set_category(&mut self, category: impl Into<CategoryFilter>) {
        self.params.set_category(category);
    }

    /// Moves to a page.
    pub fn set_page(&mut self, page: usize) {
        self.params.set_page(page);
    }

    /// Sets the page size. Moves to page 1 if it changed.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.params.set_page_size(page_size);
    }

    /// Sets or clears the sort.
    pub fn set_sort(&mut self, sort: Option<SortDirective>) {
        self.params.set_sort(sort);
    }

    /// Handles a header activation.
    ///
    /// The active column flips direction, another column sorts ascending.
    /// Returns `false` and changes nothing for columns that are unknown or
    /// not sortable.
    pub fn toggle_sort(&mut self, column: &str) -> bool {
        if !self.columns.is_sortable(column) {
            return false;
        }
        let sort = match self.params.sort() {
            Some(current) => current.toggled(column),
            None => SortDirective::asc(column),
        };
        self.params.set_sort(Some(sort));
        true
    }

    /// Shows or hides a column and returns the updated descriptors.
    pub fn toggle_column(&mut self, id: &str, visible: bool) -> &Columns {
        self.columns = self.columns.toggled(id, visible);
        &self.columns
    }

    // =========================================================================
    // Rows
    // =========================================================================

    /// Replaces the primary records with a fresh fetch.
    pub fn replace_records(&mut self, primary: Vec<Record>) {
        self.primary = primary;
        self.bump_epoch();
    }

    /// Replaces both collections with a fresh fetch.
    pub fn replace_all(&mut self, primary: Vec<Record>, secondary: Vec<Record>) {
        self.primary = primary;
        self.secondary = secondary.into_iter().map(Arc::new).collect();
        self.bump_epoch();
    }

    /// Sets one field of a primary record and returns the previous value.
    ///
    /// Returns `None` when no record has this id. An absent field reads as
    /// [`Value::Null`].
    pub fn set_field(&mut self, id: &RecordId, field: &str, value: Value) -> Option<Value> {
        let record = self.primary.iter_mut().find(|r| r.has_id(id))?;
        let previous = record.remove(field).unwrap_or_default();
        record.insert(field, value);
        self.generation += 1;
        Some(previous)
    }

    /// Merges an authoritative record into the primary record with this id.
    ///
    /// The identity is never changed. Returns `false` when no record has
    /// this id.
    pub fn patch(&mut self, id: &RecordId, patch: &Record) -> bool {
        match self.primary.iter_mut().find(|r| r.has_id(id)) {
            Some(record) => {
                record.merge(patch);
                self.generation += 1;
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Derivation
    // =========================================================================

    /// Returns the visible page, recomputing only if the rows or the
    /// parameters changed since the last call.
    pub fn page(&mut self) -> &Page<MergedRecord> {
        let memo = match self.memo.take() {
            Some(memo) if memo.generation == self.generation && memo.params == self.params => memo,
            _ => {
                let merge = self.rule.as_deref().map(|rule| MergeInputs {
                    secondary: &self.secondary,
                    rule,
                });
                Memo {
                    generation: self.generation,
                    params: self.params.clone(),
                    page: derive_table(&self.primary, merge, &self.params, &self.config),
                }
            }
        };
        &self.memo.insert(memo).page
    }

    fn bump_epoch(&mut self) {
        self.epoch += 1;
        self.generation += 1;
    }
}

impl std::fmt::Debug for TableView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableView")
            .field("params", &self.params)
            .field("primary", &self.primary.len())
            .field("secondary", &self.secondary.len())
            .field("generation", &self.generation)
            .field("epoch", &self.epoch)
            .finish()
    }
}
