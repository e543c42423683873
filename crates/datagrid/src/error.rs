//! Error types for the datagrid crate.

use thiserror::Error;

/// Errors raised while validating engine configuration.
///
/// These are detected before any statement reaches the backend, so a
/// malformed field spec never turns into a broken clause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The field spec string was empty.
    #[error("field spec is empty")]
    EmptySpec,

    /// `relation::field` with one side missing.
    #[error("related field spec '{spec}' needs both a relation and a field")]
    IncompleteRelated { spec: String },

    /// `field:type[:length]` with the field or type missing.
    #[error("cast field spec '{spec}' needs both a field and a cast type")]
    IncompleteCast { spec: String },

    /// The cast length segment is not a positive integer.
    #[error("cast length '{length}' in '{spec}' is not a positive integer")]
    InvalidCastLength { spec: String, length: String },

    /// More segments than `field:type:length`.
    #[error("field spec '{spec}' has too many ':' segments")]
    TooManySegments { spec: String },

    /// An identifier contains characters that cannot be emitted safely.
    #[error("'{identifier}' is not a valid identifier")]
    InvalidIdentifier { identifier: String },

    /// A single-column search refers to a field index with no field spec.
    #[error("column search index {index} has no field spec ({available} configured)")]
    UnknownSearchIndex { index: usize, available: usize },
}

/// Errors returned by [`QueryEngine`](crate::QueryEngine) operations.
///
/// Backend failures are carried unchanged in the `Backend` variant.
#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + 'static,
{
    /// Invalid search or ordering configuration.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Error raised by the query backend.
    #[error(transparent)]
    Backend(E),
}

impl<E> EngineError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns `true` for configuration errors.
    pub fn is_configuration(&self) -> bool {
        matches!(self, EngineError::Configuration(_))
    }

    /// Returns the backend error, if this is one.
    pub fn as_backend(&self) -> Option<&E> {
        match self {
            EngineError::Backend(err) => Some(err),
            EngineError::Configuration(_) => None,
        }
    }
}

/// Result type for configuration-only operations.
pub type Result<T> = std::result::Result<T, ConfigurationError>;
