//! Optimistic cell editing.
//!
//! One cell at a time is *Editing*; any number of cells may be
//! *Committing*. The flow for one cell:
//!
//! ```text
//! Idle ──begin──▶ Editing ──submit──▶ Committing ──complete(Ok)──▶ Idle (committed)
//!                    │                     └──────complete(Err)──▶ Idle (rolled back, refetch)
//!                    └──cancel──▶ Idle
//! ```
//!
//! [`EditCoordinator::submit`] writes the proposed value into the
//! [`TableView`] right away and hands out a [`PendingCommit`] describing the
//! single remote update to send. [`EditCoordinator::complete`] reconciles
//! the outcome.

use std::collections::HashMap;
use std::fmt;

use crate::error::ApiError;
use crate::error::EditError;
use crate::error::Error;
use crate::model::ID_FIELD;
use crate::model::Record;
use crate::model::RecordId;
use crate::model::Value;
use crate::view::RowKey;
use crate::view::TableView;

/// Addresses one cell: a record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub id: RecordId,
    pub field: String,
}

impl CellKey {
    pub fn new(id: RecordId, field: impl Into<String>) -> Self {
        Self {
            id,
            field: field.into(),
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.id, self.field)
    }
}

/// The cell being edited and the value typed so far.
#[derive(Debug, Clone, PartialEq)]
pub struct EditIntent {
    pub key: CellKey,
    pub proposed: Value,
    original: Value,
}

impl EditIntent {
    /// Returns the value the cell held when editing began.
    pub fn original(&self) -> &Value {
        &self.original
    }

    /// Returns `true` if the proposed value differs from the original.
    pub fn is_changed(&self) -> bool {
        self.proposed != self.original
    }
}

/// What ended the editing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// An explicit save action.
    Submit,
    /// Focus left the cell.
    Blur,
    /// The accept key was pressed.
    AcceptKey,
}

/// The editing phase of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditState<'a> {
    Idle,
    Editing(&'a EditIntent),
}

/// A submitted edit waiting for the remote outcome.
///
/// Send [`PendingCommit::patch`] as the single update for
/// [`PendingCommit::id`], then hand the result to
/// [`EditCoordinator::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommit {
    key: CellKey,
    patch: Record,
    previous: Value,
    epoch: u64,
    trigger: SubmitTrigger,
}

impl PendingCommit {
    /// Returns the edited cell.
    pub fn key(&self) -> &CellKey {
        &self.key
    }

    /// Returns the id of the record to update.
    pub fn id(&self) -> &RecordId {
        &self.key.id
    }

    /// Returns the partial record to send.
    pub fn patch(&self) -> &Record {
        &self.patch
    }

    /// Returns what ended the editing phase.
    pub fn trigger(&self) -> SubmitTrigger {
        self.trigger
    }
}

/// The outcome of a completed commit.
#[derive(Debug)]
pub enum Reconciliation {
    /// The authoritative value was applied to the record.
    Committed,
    /// The rows were refetched while the commit was in flight; the fetched
    /// rows win and nothing was applied.
    Superseded,
    /// The update failed. The optimistic value was discarded; the caller
    /// must refetch and report the error.
    RolledBack(ApiError),
}

impl Reconciliation {
    /// Returns `true` if the caller must refetch the rows.
    pub fn needs_refetch(&self) -> bool {
        matches!(self, Reconciliation::RolledBack(_))
    }
}

/// Tracks inline edits against a [`TableView`].
///
/// # Example
///
/// ```
/// use crmgrid_lib::TableConfig;
/// use crmgrid_lib::edit::{EditCoordinator, Reconciliation, SubmitTrigger};
/// use crmgrid_lib::model::{Record, RecordId};
/// use crmgrid_lib::view::{RowKey, TableView};
///
/// let mut view = TableView::new(TableConfig::default());
/// view.replace_records(vec![Record::with_id(5).set("email", "old@example.com")]);
///
/// let mut edits = EditCoordinator::new();
/// edits.begin(&view, &RowKey::Primary(RecordId::Number(5)), "email").unwrap();
/// edits.set_value("new@example.com").unwrap();
///
/// let pending = edits.submit(&mut view, SubmitTrigger::AcceptKey).unwrap();
/// // ... send pending.patch() to the remote store ...
/// let outcome = edits.complete(&mut view, pending, Ok(None));
/// assert!(matches!(outcome, Reconciliation::Committed));
/// ```
#[derive(Debug, Default)]
pub struct EditCoordinator {
    editing: Option<EditIntent>,
    committing: HashMap<CellKey, u64>,
}

impl EditCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the editing phase.
    pub fn state(&self) -> EditState<'_> {
        match &self.editing {
            Some(intent) => EditState::Editing(intent),
            None => EditState::Idle,
        }
    }

    /// Returns the cell being edited, if any.
    pub fn editing(&self) -> Option<&EditIntent> {
        self.editing.as_ref()
    }

    /// Returns `true` if the cell has a commit in flight.
    pub fn is_committing(&self, key: &CellKey) -> bool {
        self.committing.contains_key(key)
    }

    /// Returns the number of commits in flight.
    pub fn committing_count(&self) -> usize {
        self.committing.len()
    }

    /// Starts editing a cell, pre-filled with its current value.
    ///
    /// An edit already in progress on another cell is cancelled.
    pub fn begin(
        &mut self,
        view: &TableView,
        row: &RowKey,
        field: &str,
    ) -> Result<&EditIntent, EditError> {
        let id = match row {
            RowKey::Primary(id) => id,
            RowKey::Derived(id) => return Err(EditError::DerivedRow(id.clone())),
        };
        if field == ID_FIELD {
            return Err(EditError::IdentityField);
        }
        let record = view
            .record(id)
            .ok_or_else(|| EditError::UnknownRecord(id.clone()))?;

        // key by the stored identity so busy checks see one form of it
        let key = CellKey::new(record.id().unwrap_or(id).clone(), field);
        if self.committing.contains_key(&key) {
            return Err(EditError::CellBusy {
                id: key.id,
                field: key.field,
            });
        }
        if let Some(previous) = self.editing.take() {
            log::debug!("Edit of {} replaced by {}", previous.key, key);
        }

        let original = record.get(field).cloned().unwrap_or_default();
        Ok(self.editing.insert(EditIntent {
            key,
            proposed: original.clone(),
            original,
        }))
    }

    /// Replaces the proposed value.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<(), EditError> {
        let intent = self.editing.as_mut().ok_or(EditError::NoActiveEdit)?;
        intent.proposed = value.into();
        Ok(())
    }

    /// Replaces the proposed value with typed input, shaped like the
    /// original value.
    pub fn set_input(&mut self, input: &str) -> Result<(), EditError> {
        let intent = self.editing.as_mut().ok_or(EditError::NoActiveEdit)?;
        intent.proposed = Value::from_input(input, intent.original.as_value_ref());
        Ok(())
    }

    /// Leaves editing without any remote call.
    pub fn cancel(&mut self) -> Option<EditIntent> {
        self.editing.take()
    }

    /// Validates the proposed value and applies it to the view.
    ///
    /// A validation failure keeps the cell in editing. On success the cell
    /// is committing and the returned [`PendingCommit`] describes the one
    /// update to send.
    pub fn submit(
        &mut self,
        view: &mut TableView,
        trigger: SubmitTrigger,
    ) -> Result<PendingCommit, Error> {
        let intent = self.editing.as_ref().ok_or(EditError::NoActiveEdit)?;
        view.config()
            .schema
            .validate_field(&intent.key.field, &intent.proposed)?;

        let Some(intent) = self.editing.take() else {
            return Err(EditError::NoActiveEdit.into());
        };
        let EditIntent { key, proposed, .. } = intent;
        let previous = view
            .set_field(&key.id, &key.field, proposed.clone())
            .ok_or_else(|| EditError::UnknownRecord(key.id.clone()))?;

        let epoch = view.epoch();
        self.committing.insert(key.clone(), epoch);
        log::debug!("Committing {} ({:?})", key, trigger);

        Ok(PendingCommit {
            patch: Record::new().set(key.field.clone(), proposed),
            key,
            previous,
            epoch,
            trigger,
        })
    }

    /// Reconciles a commit with the remote outcome.
    ///
    /// `Ok(Some(record))` is the authoritative record echoed by the store;
    /// `Ok(None)` means the store accepted the patch without echoing.
    pub fn complete(
        &mut self,
        view: &mut TableView,
        pending: PendingCommit,
        result: Result<Option<Record>, ApiError>,
    ) -> Reconciliation {
        self.committing.remove(&pending.key);
        let current = view.epoch() == pending.epoch;

        match result {
            Ok(_) if !current => {
                log::debug!("Commit of {} superseded by a refetch", pending.key);
                Reconciliation::Superseded
            }
            Ok(echo) => {
                let authoritative = echo.as_ref().unwrap_or(&pending.patch);
                view.patch(&pending.key.id, authoritative);
                log::debug!("Committed {}", pending.key);
                Reconciliation::Committed
            }
            Err(error) => {
                if current {
                    view.set_field(&pending.key.id, &pending.key.field, pending.previous);
                }
                log::warn!("Commit of {} failed: {}", pending.key, error);
                Reconciliation::RolledBack(error)
            }
        }
    }
}
