use async_trait::async_trait;

use crate::{
    db_types::{NewOrder, Order, OrderUpdate},
    traits::StoreError,
};

/// Storage for merchant orders. Orders are keyed by their transaction reference, i.e. the provider order id of the
/// transaction that backs them.
#[async_trait]
pub trait OrderManagement: Send + Sync {
    /// Stores a new order in the `Pending` state and returns the stored record.
    ///
    /// Fails with [`StoreError::OrderAlreadyExists`] if an order with the same transaction reference exists.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Applies `update` to the order with the given transaction reference and returns the resulting record.
    ///
    /// A status change is only applied if the order is currently `Pending`, or if the requested status equals the
    /// current one (in which case nothing changes). Any other change fails with [`StoreError::IllegalStatusChange`].
    /// The check and the write happen atomically. If no order matches, [`StoreError::OrderNotFound`] is returned.
    async fn update_order_by_reference(&self, reference_id: &str, update: OrderUpdate) -> Result<Order, StoreError>;

    async fn fetch_order_by_reference(&self, reference_id: &str) -> Result<Option<Order>, StoreError>;
}
