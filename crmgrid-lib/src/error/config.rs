//! Configuration error types

/// Invalid table configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Two column descriptors share an id.
    #[error("Duplicate column id '{0}'")]
    DuplicateColumn(String),
}
