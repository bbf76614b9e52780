use async_trait::async_trait;

use crate::{
    db_types::{NewTransaction, Transaction, TransactionUpdate},
    traits::StoreError,
};

/// Storage for transactions, keyed by the provider order id.
#[async_trait]
pub trait TransactionManagement: Send + Sync {
    /// Stores a new transaction and returns the stored record.
    ///
    /// Fails with [`StoreError::TransactionAlreadyExists`] if a transaction for the same provider order id exists.
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, StoreError>;

    /// Applies the partial `update` to the transaction for `order_id`. Never creates a transaction: if none matches,
    /// [`StoreError::TransactionNotFound`] is returned.
    async fn update_transaction_by_order_id(
        &self,
        order_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction, StoreError>;

    async fn fetch_transaction_by_order_id(&self, order_id: &str) -> Result<Option<Transaction>, StoreError>;

    /// Returns the transactions that have no order referencing them, oldest first.
    ///
    /// These are left behind when an order placement stores its transaction but then fails to store the order.
    async fn fetch_orphaned_transactions(&self) -> Result<Vec<Transaction>, StoreError>;
}
