//! PostgreSQL implementations of the core repository traits.
//!
//! [`PgStore`] wraps one pooled connection and implements every trait of
//! `amarra_core::store`, so it satisfies `ReconciliationStore` directly.
//! One file per trait; statuses and methods are stored as text and parsed
//! back into the domain enums on read.

mod allocation;
mod credit;
mod invoice;
mod member;
mod movement;
mod payment;

use amarra_core::store::StoreError;
use sea_orm::{DatabaseConnection, DbErr};

/// Repository over the reconciliation tables.
#[derive(Debug)]
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    /// Creates a new store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Maps a driver error onto the store boundary.
pub(crate) fn store_err(err: DbErr) -> StoreError {
    if let Some(sql) = err.sql_err() {
        return StoreError::Constraint(sql.to_string());
    }
    match &err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => StoreError::Unavailable(err.to_string()),
        DbErr::Type(_) | DbErr::TryIntoErr { .. } | DbErr::Json(_) => {
            StoreError::Decode(err.to_string())
        }
        _ => StoreError::Query(err.to_string()),
    }
}

/// Decode failure for a text column that holds an unknown value.
pub(crate) fn decode_err(column: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Decode(format!("{column}: {detail}"))
}

/// `NotFound` when an update touched no row.
pub(crate) fn ensure_updated(
    rows_affected: u64,
    entity: &'static str,
    id: impl ToString,
) -> Result<(), StoreError> {
    if rows_affected == 0 {
        return Err(StoreError::NotFound {
            entity,
            id: id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn test_connection_errors_are_unavailable() {
        let err = store_err(DbErr::Conn(RuntimeErr::Internal("connection refused".into())));
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_type_errors_are_decode_failures() {
        let err = store_err(DbErr::Type("numeric overflow".into()));
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn test_other_errors_are_query_failures() {
        let err = store_err(DbErr::Custom("boom".into()));
        assert_eq!(err.error_code(), "STORE_QUERY_FAILED");
    }

    #[test]
    fn test_ensure_updated() {
        assert!(ensure_updated(1, "invoice", "x").is_ok());
        assert_eq!(
            ensure_updated(0, "invoice", "x"),
            Err(StoreError::NotFound {
                entity: "invoice",
                id: "x".into()
            })
        );
    }
}
