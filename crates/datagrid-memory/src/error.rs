//! Error types for the in-memory backend.

use thiserror::Error;

/// Errors raised while building or executing an in-memory query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// No table with this name.
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    /// No relation with this name on the table.
    #[error("table '{table}' has no relation '{relation}'")]
    UnknownRelation { table: String, relation: String },

    /// A column that the table does not declare.
    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    /// A cast type the evaluator does not know.
    #[error("cannot cast to '{0}'")]
    UnsupportedCast(String),

    /// A pattern too large to compile.
    #[error("cannot compile pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A row that is not a JSON object.
    #[error("rows of table '{table}' must be JSON objects")]
    InvalidRow { table: String },

    /// A table name registered twice.
    #[error("table '{0}' already exists")]
    DuplicateTable(String),
}

/// Result type for in-memory backend operations.
pub type Result<T> = std::result::Result<T, MemoryError>;
