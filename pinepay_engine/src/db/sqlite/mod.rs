//! # SQLite backend
//!
//! Low-level queries live in [`orders`] and [`transactions`] as free functions that take a `&mut SqliteConnection`.
//! Callers can pass a pooled connection or an open transaction without any other changes. [`SqliteDatabase`] wires
//! them up to the store traits.
//!
//! Nested transaction fields (customer, addresses, payment methods, settlement details) are stored as JSON text.
mod sqlite_impl;

pub mod orders;
pub mod transactions;

pub use sqlite_impl::SqliteDatabase;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

/// Returns true if `e` was raised by a UNIQUE constraint.
pub(crate) fn is_unique_violation(e: &SqlxError) -> bool {
    matches!(e, SqlxError::Database(db) if db.is_unique_violation())
}
