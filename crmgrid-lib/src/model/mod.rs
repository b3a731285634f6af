//! Typed models

mod column;
mod id;
mod record;
mod record_serde;
mod schema;
mod value;

pub use column::*;
pub use id::*;
pub use record::*;
pub use schema::*;
pub use value::*;
