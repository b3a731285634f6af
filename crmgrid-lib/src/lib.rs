//! CRM table engine
//!
//! Browse, filter, sort, paginate and edit collections of records kept by a
//! remote store. The derivation from raw rows to a visible page is pure and
//! synchronous ([`view`]); inline edits are applied optimistically and
//! reconciled with the store ([`edit`]); [`TableSession`] ties both to a
//! [`RecordStore`](api::RecordStore).

pub mod api;
pub mod crm;
pub mod edit;
pub mod error;
pub mod model;
pub mod query;
pub mod view;

mod client;
mod config;
mod session;

pub use client::*;
pub use config::*;
pub use error::Error;
pub use session::*;
