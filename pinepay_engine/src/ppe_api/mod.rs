//! # Pine Labs payment engine public API
//!
//! * [`order_flow_api`] places orders, updates their status, issues refunds and triggers reconciliations.
//! * [`token_cache`] keeps the provider access token in a [`crate::traits::KeyValueCache`].
//! * [`status`] validates requested order statuses.
//! * [`order_objects`] holds the request types accepted by the API.
//!
//! An API instance is created from a store, a cache and a provider client:
//!
//! ```rust,ignore
//! use pine_labs_tools::{PineLabsApi, PineLabsConfig};
//! use pinepay_engine::{MemoryCache, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let provider = PineLabsApi::new(PineLabsConfig::new_from_env_or_default())?;
//! let api = OrderFlowApi::new(db, MemoryCache::new(), provider);
//! let placement = api.place_order(request).await?;
//! ```
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
mod reconciliation;
pub mod status;
pub mod token_cache;
