//! Leads and opportunities
//!
//! The two tables of the CRM: leads, and opportunities with converted
//! leads merged in. Each submodule provides the column set, validation
//! schema, table configuration and a ready-made [`TableSession`].
//!
//! [`TableSession`]: crate::TableSession

pub mod leads;
pub mod opportunities;

mod convert;

pub use convert::*;

/// Rows per page both CRM tables start with.
pub const PAGE_SIZE: usize = 100;
