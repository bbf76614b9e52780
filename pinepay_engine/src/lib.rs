//! Pine Labs Payment Engine
//!
//! The provider-agnostic core of the payment gateway. It places payment orders with Pine Labs, caches the provider
//! access token, persists orders and transactions, reconciles stored transactions with the provider's record and
//! issues refunds.
//!
//! The library is divided into three sections:
//! 1. Collaborator interfaces ([`mod@traits`]). The engine reaches stores, caches and the provider only through these.
//! 2. Backends ([`SqliteDatabase`], [`MemoryStore`] and [`MemoryCache`]) that implement those interfaces.
//! 3. The public API ([`OrderFlowApi`]), which composes them.
mod db;

pub mod db_types;
mod ppe_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use db::memory::{MemoryCache, MemoryStore};
#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use ppe_api::{
    errors::{OrderFlowError, StatusValidationError, TokenCacheError},
    order_flow_api::OrderFlowApi,
    order_objects,
    status::validate_status_update,
    token_cache::{cache_ttl, TokenCache, ACCESS_TOKEN_CACHE_KEY, TOKEN_SAFETY_MARGIN},
};
pub use traits::{
    CacheError,
    KeyValueCache,
    OrderManagement,
    PaymentProvider,
    PaymentStore,
    StoreError,
    TransactionManagement,
};
