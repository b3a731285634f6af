//! Remote record stores
//!
//! The table engine talks to its remote collaborator through
//! [`RecordReader`] and [`RecordWriter`]. Two stores ship with the crate:
//!
//! - [`RestClient`](crate::RestClient) - json-server style REST over HTTP
//! - [`InMemoryStore`] - a concurrent in-process store for tests and demos

mod memory;
mod source;

pub use memory::*;
pub use source::*;
