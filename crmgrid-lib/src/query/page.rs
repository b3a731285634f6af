//! Page type for paginated table rows.

use std::ops::RangeInclusive;

use serde::Serialize;

/// Pagination metadata for one derived page.
///
/// Computed from the full filtered and sorted row set, never from the page
/// itself.
///
/// # Example
///
/// ```
/// use crmgrid_lib::query::PageMetadata;
///
/// let meta = PageMetadata::new(12, 5, 3);
/// assert_eq!(meta.total_pages, 3);
/// assert_eq!(meta.range(), Some((11, 12)));
/// assert!(!meta.has_next());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// Rows in the filtered set.
    pub total_items: usize,
    /// Rows per page.
    pub items_per_page: usize,
    /// `ceil(total_items / items_per_page)`; 0 when there are no rows.
    pub total_pages: usize,
    /// The requested page, 1-based.
    pub current_page: usize,
}

impl PageMetadata {
    /// Computes metadata. Page and page size are raised to at least 1.
    pub fn new(total_items: usize, items_per_page: usize, current_page: usize) -> Self {
        let items_per_page = items_per_page.max(1);
        Self {
            total_items,
            items_per_page,
            total_pages: total_items.div_ceil(items_per_page),
            current_page: current_page.max(1),
        }
    }

    /// Returns the 1-based positions of the first and last row on the
    /// current page, as in "Showing 6 to 10 of 12".
    ///
    /// `None` when the page is empty.
    pub fn range(&self) -> Option<(usize, usize)> {
        let start = (self.current_page - 1)
            .checked_mul(self.items_per_page)?
            .checked_add(1)?;
        if start > self.total_items {
            return None;
        }
        let end = self
            .current_page
            .saturating_mul(self.items_per_page)
            .min(self.total_items);
        Some((start, end))
    }

    /// Returns the page numbers the pager shows around the current page:
    /// one before it and two after, clipped to existing pages.
    pub fn visible_pages(&self) -> RangeInclusive<usize> {
        let first = self.current_page.saturating_sub(1).max(1);
        let last = self.current_page.saturating_add(2).min(self.total_pages);
        first..=last
    }

    /// Returns `true` if pages exist beyond the visible window.
    pub fn has_hidden_pages_after(&self) -> bool {
        self.current_page.saturating_add(2) < self.total_pages
    }

    /// Returns `true` if there is a next page.
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Returns `true` if there is a previous page.
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

/// One page of rows with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Rows on this page, in display order.
    pub items: Vec<T>,
    /// Metadata of the full row set.
    pub meta: PageMetadata,
}

impl<T> Page<T> {
    /// Returns the rows on this page.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Returns `true` if the page has no rows.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maps every row, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

impl<T: Clone> Page<&T> {
    /// Clones borrowed rows into an owned page.
    pub fn cloned(self) -> Page<T> {
        self.map(T::clone)
    }
}

/// Slices an ordered sequence into one page.
///
/// An out-of-range page yields no rows rather than an error.
pub fn paginate<T>(ordered: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let meta = PageMetadata::new(ordered.len(), page_size, page);
    let start = (meta.current_page - 1).saturating_mul(meta.items_per_page);
    let items = ordered
        .into_iter()
        .skip(start)
        .take(meta.items_per_page)
        .collect();
    Page { items, meta }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_for_empty_set() {
        let meta = PageMetadata::new(0, 20, 1);
        assert_eq!(meta.total_pages, 0);
        assert_eq!(meta.range(), None);
        assert!(!meta.has_next());
        assert!(meta.visible_pages().is_empty());
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let page = paginate((1..=12).collect::<Vec<_>>(), 4, 5);
        assert!(page.is_empty());
        assert_eq!(page.meta.total_pages, 3);
        assert_eq!(page.meta.current_page, 4);
        assert_eq!(page.meta.range(), None);
    }

    #[test]
    fn test_extreme_pages_do_not_overflow() {
        let page = paginate((1..=12).collect::<Vec<_>>(), usize::MAX, 5);
        assert!(page.is_empty());
        assert_eq!(page.meta.range(), None);

        let meta = PageMetadata::new(12, 5, usize::MAX);
        assert_eq!(meta.visible_pages().count(), 0);
        assert!(!meta.has_hidden_pages_after());
        assert!(!meta.has_next());
        assert!(meta.has_previous());

        let page = paginate((1..=12).collect::<Vec<_>>(), 2, usize::MAX);
        assert!(page.is_empty());
        assert_eq!(page.meta.total_pages, 1);
        assert_eq!(page.meta.range(), None);

        let page = paginate((1..=12).collect::<Vec<_>>(), 1, usize::MAX);
        assert_eq!(page.meta.range(), Some((1, 12)));
    }

    #[test]
    fn test_pages_cover_sequence() {
        let items: Vec<u32> = (1..=23).collect();
        for size in 1..=10 {
            let total_pages = paginate(items.clone(), 1, size).meta.total_pages;
            let mut joined = Vec::new();
            for page in 1..=total_pages {
                joined.extend(paginate(items.clone(), page, size).items);
            }
            assert_eq!(joined, items, "page size {}", size);
        }
    }

    #[test]
    fn test_visible_window() {
        let meta = PageMetadata::new(100, 10, 1);
        assert_eq!(meta.visible_pages(), 1..=3);
        assert!(meta.has_hidden_pages_after());

        let meta = PageMetadata::new(100, 10, 5);
        assert_eq!(meta.visible_pages(), 4..=7);

        let meta = PageMetadata::new(100, 10, 10);
        assert_eq!(meta.visible_pages(), 9..=10);
        assert!(!meta.has_hidden_pages_after());
    }

    #[test]
    fn test_range_on_last_page() {
        let meta = PageMetadata::new(12, 5, 2);
        assert_eq!(meta.range(), Some((6, 10)));
        assert!(meta.has_previous());
        assert!(meta.has_next());
    }

    #[test]
    fn test_zero_page_is_clamped() {
        let page = paginate(vec!['a', 'b'], 0, 0);
        assert_eq!(page.meta.current_page, 1);
        assert_eq!(page.meta.items_per_page, 1);
        assert_eq!(page.items, vec!['a']);
    }
}
