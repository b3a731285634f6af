//! Client-side query pipeline.
//!
//! Everything here is synchronous and pure. The stages compose in a fixed
//! order: [`filter_records`] → [`sort_records`] → [`paginate`].
//!
//! - [`CategoryFilter`] - The categorical filter with its `"all"` sentinel
//! - [`SortDirective`] - Single-column sort specification
//! - [`PageMetadata`] - Pagination metadata for one derived page

mod filter;
mod order;
mod page;

pub use filter::CategoryFilter;
pub use filter::filter_records;
pub use filter::matches_search;
pub use order::Direction;
pub use order::SortDirective;
pub use order::compare_values;
pub use order::sort_records;
pub use page::Page;
pub use page::PageMetadata;
pub use page::paginate;
