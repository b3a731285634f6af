//! Table configuration

use crate::model::Columns;
use crate::model::RecordSchema;
use crate::query::SortDirective;

/// Static configuration of one table.
///
/// Describes which fields the free-text search looks at, which field the
/// categorical filter matches, how rows are sorted at first and how edits
/// are validated.
///
/// # Example
///
/// ```
/// use crmgrid_lib::TableConfig;
/// use crmgrid_lib::query::SortDirective;
///
/// let config = TableConfig::default()
///     .with_searchable(["name", "company"])
///     .with_category_field("status")
///     .with_sort(SortDirective::desc("score"))
///     .with_page_size(50);
/// ```
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Column descriptors in display order.
    ///
    /// Default: none
    pub columns: Columns,

    /// Fields the free-text search matches against.
    ///
    /// Default: none
    pub searchable: Vec<String>,

    /// Field the categorical filter matches against.
    ///
    /// Default: `status`
    pub category_field: String,

    /// Sort applied before the user picks one.
    ///
    /// Default: none
    pub initial_sort: Option<SortDirective>,

    /// Rows per page before the user picks a size.
    ///
    /// Default: 20
    pub page_size: usize,

    /// Page sizes offered by the pager.
    ///
    /// Default: 10, 20, 50, 100
    pub page_size_options: Vec<usize>,

    /// Rules checked before any write.
    ///
    /// Default: no rules
    pub schema: RecordSchema,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            columns: Columns::default(),
            searchable: Vec::new(),
            category_field: "status".to_string(),
            initial_sort: None,
            page_size: 20,
            page_size_options: vec![10, 20, 50, 100],
            schema: RecordSchema::default(),
        }
    }
}

impl TableConfig {
    /// Creates a new table config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the column descriptors.
    pub fn with_columns(mut self, columns: Columns) -> Self {
        self.columns = columns;
        self
    }

    /// Sets the searchable fields.
    pub fn with_searchable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the categorical field.
    pub fn with_category_field(mut self, field: impl Into<String>) -> Self {
        self.category_field = field.into();
        self
    }

    /// Sets the initial sort.
    pub fn with_sort(mut self, sort: SortDirective) -> Self {
        self.initial_sort = Some(sort);
        self
    }

    /// Sets the initial page size. Zero is raised to one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the page sizes offered by the pager.
    pub fn with_page_size_options(mut self, options: impl Into<Vec<usize>>) -> Self {
        self.page_size_options = options.into();
        self
    }

    /// Sets the validation schema.
    pub fn with_schema(mut self, schema: RecordSchema) -> Self {
        self.schema = schema;
        self
    }
}
