//! Column descriptors

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// Display metadata for one column of a table.
///
/// Descriptors gate UI affordances only. The filter pipeline and the
/// comparator never look at them, except that a header click on a column
/// that is not `sortable` is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// The record field this column shows.
    pub id: String,
    /// Header text.
    pub label: String,
    /// Whether the column is currently shown.
    pub visible: bool,
    /// Whether the header offers sorting.
    pub sortable: bool,
}

impl FieldDescriptor {
    /// Creates a visible, sortable column.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            visible: true,
            sortable: true,
        }
    }

    /// Marks the column as hidden.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Marks the column as not sortable.
    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }
}

/// An ordered set of column descriptors with unique ids.
///
/// Order is display order.
///
/// # Example
///
/// ```
/// use crmgrid_lib::model::{Columns, FieldDescriptor};
///
/// let columns = Columns::new([
///     FieldDescriptor::new("name", "Name"),
///     FieldDescriptor::new("actions", "Actions").unsortable(),
/// ]).unwrap();
///
/// let columns = columns.toggled("name", false);
/// assert_eq!(columns.visible().count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Columns {
    descriptors: Vec<FieldDescriptor>,
}

impl Columns {
    /// Creates a column set, rejecting duplicate ids.
    pub fn new(descriptors: impl IntoIterator<Item = FieldDescriptor>) -> Result<Self, ConfigError> {
        let descriptors: Vec<FieldDescriptor> = descriptors.into_iter().collect();
        for (index, descriptor) in descriptors.iter().enumerate() {
            if descriptors[..index].iter().any(|d| d.id == descriptor.id) {
                return Err(ConfigError::DuplicateColumn(descriptor.id.clone()));
            }
        }
        Ok(Self { descriptors })
    }

    /// Returns the descriptor for a column id.
    pub fn get(&self, id: &str) -> Option<&FieldDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    /// Returns all descriptors in display order.
    pub fn as_slice(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    /// Iterates over all descriptors in display order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.descriptors.iter()
    }

    /// Iterates over the visible descriptors in display order.
    pub fn visible(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.descriptors.iter().filter(|d| d.visible)
    }

    /// Returns `true` if the column exists and offers sorting.
    pub fn is_sortable(&self, id: &str) -> bool {
        self.get(id).is_some_and(|d| d.sortable)
    }

    /// Returns the updated sequence after a visibility toggle.
    ///
    /// Unknown ids leave the sequence unchanged.
    pub fn toggled(&self, id: &str, visible: bool) -> Columns {
        let descriptors = self
            .descriptors
            .iter()
            .map(|d| {
                if d.id == id {
                    FieldDescriptor {
                        visible,
                        ..d.clone()
                    }
                } else {
                    d.clone()
                }
            })
            .collect();
        Columns { descriptors }
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let result = Columns::new([
            FieldDescriptor::new("name", "Name"),
            FieldDescriptor::new("name", "Other"),
        ]);
        assert!(matches!(result, Err(ConfigError::DuplicateColumn(id)) if id == "name"));
    }

    #[test]
    fn test_toggle_preserves_order() {
        let columns = Columns::new([
            FieldDescriptor::new("id", "ID"),
            FieldDescriptor::new("email", "Email"),
            FieldDescriptor::new("status", "Status"),
        ])
        .unwrap();

        let toggled = columns.toggled("email", false);
        let ids: Vec<&str> = toggled.visible().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["id", "status"]);
        assert_eq!(toggled.len(), 3);

        let restored = toggled.toggled("email", true);
        assert_eq!(restored, columns);
    }

    #[test]
    fn test_sortable_flag() {
        let columns = Columns::new([
            FieldDescriptor::new("score", "Score"),
            FieldDescriptor::new("actions", "Actions").unsortable(),
        ])
        .unwrap();
        assert!(columns.is_sortable("score"));
        assert!(!columns.is_sortable("actions"));
        assert!(!columns.is_sortable("missing"));
    }
}
