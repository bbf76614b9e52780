//! # Collaborator interfaces
//!
//! The order flow never talks to a database, cache or HTTP client directly. It consumes the traits in this module,
//! and concrete backends implement them.
//!
//! * [`OrderManagement`] stores merchant [`crate::db_types::Order`] records.
//! * [`TransactionManagement`] stores [`crate::db_types::Transaction`] records, the local mirror of the provider's
//!   orders.
//! * [`PaymentStore`] is shorthand for a backend that does both. [`crate::SqliteDatabase`] and
//!   [`crate::MemoryStore`] are the two shipped implementations.
//! * [`KeyValueCache`] is an ephemeral string store with per-entry expiry, used to cache access tokens.
//! * [`PaymentProvider`] is the set of calls made to the payment provider. [`pine_labs_tools::PineLabsApi`] is the
//!   production implementation.
//!
//! All traits use `async_trait` so that their futures are `Send` and the order flow can hand them to detached tasks.
mod key_value_cache;
mod order_management;
mod payment_provider;
mod transaction_management;

pub use key_value_cache::{CacheError, KeyValueCache};
pub use order_management::OrderManagement;
pub use payment_provider::PaymentProvider;
pub use transaction_management::TransactionManagement;
use thiserror::Error;

/// A backend that stores both orders and transactions.
pub trait PaymentStore: OrderManagement + TransactionManagement {}

impl<T> PaymentStore for T where T: OrderManagement + TransactionManagement {}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No order exists with transaction reference {0}")]
    OrderNotFound(String),
    #[error("No transaction exists for provider order {0}")]
    TransactionNotFound(String),
    #[error("An order with transaction reference {0} already exists")]
    OrderAlreadyExists(String),
    #[error("A transaction for provider order {0} already exists")]
    TransactionAlreadyExists(String),
    #[error("Cannot change the status of order {reference} from {from} to {to}")]
    IllegalStatusChange { reference: String, from: String, to: String },
    #[error("Could not (de)serialize a stored value. {0}")]
    SerializationError(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::OrderNotFound(_) | StoreError::TransactionNotFound(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::SerializationError(e.to_string())
    }
}
