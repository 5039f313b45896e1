//! Persistence failures as seen by the domain.

use amarra_shared::AppError;
use thiserror::Error;

/// Errors surfaced by a repository implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// A referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// A uniqueness or foreign-key constraint was violated.
    #[error("Constraint violated: {0}")]
    Constraint(String),

    /// A stored value could not be decoded into the domain type.
    #[error("Invalid stored value: {0}")]
    Decode(String),
}

impl StoreError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "STORE_UNAVAILABLE",
            Self::Query(_) => "STORE_QUERY_FAILED",
            Self::NotFound { .. } => "STORE_NOT_FOUND",
            Self::Constraint(_) => "STORE_CONSTRAINT",
            Self::Decode(_) => "STORE_DECODE",
        }
    }

    /// Returns true if the store itself could not be reached.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Result type for repository calls.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            _ => Self::Database(err.to_string()),
        }
    }
}
