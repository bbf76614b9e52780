use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use log::*;
use tokio::sync::RwLock;

use crate::{
    db_types::{NewOrder, NewTransaction, Order, OrderStatusType, OrderUpdate, Transaction, TransactionUpdate},
    traits::{OrderManagement, StoreError, TransactionManagement},
};

#[derive(Debug, Default)]
struct Tables {
    orders: HashMap<String, Order>,
    transactions: HashMap<String, Transaction>,
    next_order_id: i64,
    next_transaction_id: i64,
}

/// An in-process [`crate::traits::PaymentStore`]. Nothing survives a restart.
///
/// Both tables sit behind a single lock, so every operation is atomic with respect to every other.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    pub async fn transaction_count(&self) -> usize {
        self.tables.read().await.transactions.len()
    }
}

#[async_trait]
impl OrderManagement for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.orders.contains_key(&order.transaction_reference_id) {
            return Err(StoreError::OrderAlreadyExists(order.transaction_reference_id));
        }
        tables.next_order_id += 1;
        let now = Utc::now();
        let order = Order {
            id: tables.next_order_id,
            user_id: order.user_id,
            transaction_reference_id: order.transaction_reference_id,
            amount: order.amount,
            currency: order.currency,
            status: OrderStatusType::Pending,
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(order.transaction_reference_id.clone(), order.clone());
        trace!("🧠️ Order {} stored with id {}", order.transaction_reference_id, order.id);
        Ok(order)
    }

    async fn update_order_by_reference(&self, reference_id: &str, update: OrderUpdate) -> Result<Order, StoreError> {
        let mut tables = self.tables.write().await;
        let order =
            tables.orders.get_mut(reference_id).ok_or_else(|| StoreError::OrderNotFound(reference_id.to_string()))?;
        if let Some(status) = update.status {
            if !order.status.can_transition_to(status) {
                return Err(StoreError::IllegalStatusChange {
                    reference: reference_id.to_string(),
                    from: order.status.to_string(),
                    to: status.to_string(),
                });
            }
            if order.status != status {
                order.status = status;
                order.updated_at = Utc::now();
            }
        }
        Ok(order.clone())
    }

    async fn fetch_order_by_reference(&self, reference_id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.tables.read().await.orders.get(reference_id).cloned())
    }
}

#[async_trait]
impl TransactionManagement for MemoryStore {
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.transactions.contains_key(&transaction.provider_order_id) {
            return Err(StoreError::TransactionAlreadyExists(transaction.provider_order_id));
        }
        tables.next_transaction_id += 1;
        let now = Utc::now();
        let tx = Transaction {
            id: tables.next_transaction_id,
            merchant_order_reference: transaction.merchant_order_reference,
            amount: transaction.amount,
            currency: transaction.currency,
            pre_auth: transaction.pre_auth,
            allowed_payment_methods: transaction.allowed_payment_methods,
            notes: transaction.notes,
            callback_url: transaction.callback_url,
            failure_callback_url: transaction.failure_callback_url,
            purchase_details: transaction.purchase_details,
            provider_order_id: transaction.provider_order_id,
            token: transaction.token,
            redirect_url: transaction.redirect_url,
            status: None,
            payments: vec![],
            provider_created_at: None,
            provider_updated_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.transactions.insert(tx.provider_order_id.clone(), tx.clone());
        trace!("🧠️ Transaction for provider order {} stored with id {}", tx.provider_order_id, tx.id);
        Ok(tx)
    }

    async fn update_transaction_by_order_id(
        &self,
        order_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction, StoreError> {
        let mut tables = self.tables.write().await;
        let tx = tables
            .transactions
            .get_mut(order_id)
            .ok_or_else(|| StoreError::TransactionNotFound(order_id.to_string()))?;
        if !update.is_empty() {
            update.apply_to(tx);
            tx.updated_at = Utc::now();
        }
        Ok(tx.clone())
    }

    async fn fetch_transaction_by_order_id(&self, order_id: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(self.tables.read().await.transactions.get(order_id).cloned())
    }

    async fn fetch_orphaned_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        let tables = self.tables.read().await;
        let mut orphans = tables
            .transactions
            .values()
            .filter(|tx| !tables.orders.contains_key(&tx.provider_order_id))
            .cloned()
            .collect::<Vec<_>>();
        orphans.sort_by_key(|tx| tx.id);
        Ok(orphans)
    }
}
