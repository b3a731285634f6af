//! Error types

mod api;
mod config;
mod edit;
mod field;
mod validation;

pub use api::*;
pub use config::*;
pub use edit::*;
pub use field::*;
pub use validation::*;

/// The remote write that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationAction {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for MutationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => f.write_str("Create"),
            Self::Update => f.write_str("Update"),
            Self::Delete => f.write_str("Delete"),
        }
    }
}

/// Failures reported to callers of the table engine.
///
/// None of these leave the engine unusable; every variant is meant to be
/// shown to the user and the session carries on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading a collection failed. Nothing local was changed.
    #[error("Fetch failed: {0}")]
    Fetch(#[source] ApiError),

    /// A create, update or delete was rejected or never arrived.
    #[error("{action} failed: {source}")]
    Mutation {
        action: MutationAction,
        #[source]
        source: ApiError,
    },

    /// A value failed its schema rules; no remote call was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A record field could not be read as the type an operation needs.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// The edit state machine refused a transition.
    #[error(transparent)]
    Edit(#[from] EditError),

    /// The table configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Creates a mutation failure.
    pub fn mutation(action: MutationAction, source: ApiError) -> Self {
        Self::Mutation { action, source }
    }

    /// Returns `true` for fetch failures.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }

    /// Returns `true` for mutation failures.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Mutation { .. })
    }

    /// Returns `true` for validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns the underlying remote error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Fetch(e) | Self::Mutation { source: e, .. } => Some(e),
            _ => None,
        }
    }
}
