//! Database layer with `SeaORM` entities, migrations and the PostgreSQL store.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the reconciliation tables
//! - [`PgStore`], implementing every repository trait of `amarra_core::store`
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::PgStore;

use std::time::Duration;

use amarra_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    tracing::debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to database"
    );
    Database::connect(options).await
}
