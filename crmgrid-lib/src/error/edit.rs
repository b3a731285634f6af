//! Edit coordination error types

use crate::model::RecordId;

/// Misuse of the optimistic edit state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// A submit or value change arrived while no cell was being edited.
    #[error("No edit in progress")]
    NoActiveEdit,

    /// The cell still has a commit in flight.
    #[error("Field '{field}' of record {id} is already being committed")]
    CellBusy { id: RecordId, field: String },

    /// The target record is not in the local record set.
    #[error("Record {0} is not loaded")]
    UnknownRecord(RecordId),

    /// The target row is a projection of another collection.
    #[error("Record {0} is derived from another collection and cannot be changed here")]
    DerivedRow(RecordId),

    /// The identity field is never edited.
    #[error("The identity field cannot be edited")]
    IdentityField,

    /// A record without identity cannot be addressed remotely.
    #[error("Record has no identity")]
    MissingIdentity,

    /// No create draft is open.
    #[error("No draft is open")]
    NoDraft,
}
