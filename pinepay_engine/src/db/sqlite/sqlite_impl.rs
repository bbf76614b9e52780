//! `SqliteDatabase` is the persistent [`crate::traits::PaymentStore`].
use std::fmt::Debug;

use async_trait::async_trait;
use log::*;
use sqlx::{migrate, SqlitePool};

use super::{new_pool, orders, transactions};
use crate::{
    db_types::{NewOrder, NewTransaction, Order, OrderUpdate, Transaction, TransactionUpdate},
    traits::{OrderManagement, StoreError, TransactionManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

#[async_trait]
impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn update_order_by_reference(&self, reference_id: &str, update: OrderUpdate) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        match update.status {
            Some(status) => orders::update_order_status(reference_id, status, &mut conn).await,
            None => orders::fetch_order_by_reference(reference_id, &mut conn)
                .await?
                .ok_or_else(|| StoreError::OrderNotFound(reference_id.to_string())),
        }
    }

    async fn fetch_order_by_reference(&self, reference_id: &str) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_reference(reference_id, &mut conn).await?)
    }
}

#[async_trait]
impl TransactionManagement for SqliteDatabase {
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, StoreError> {
        let mut conn = self.pool.acquire().await?;
        transactions::insert_transaction(transaction, &mut conn).await
    }

    async fn update_transaction_by_order_id(
        &self,
        order_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction, StoreError> {
        let mut conn = self.pool.acquire().await?;
        transactions::update_transaction(order_id, update, &mut conn)
            .await?
            .ok_or_else(|| StoreError::TransactionNotFound(order_id.to_string()))
    }

    async fn fetch_transaction_by_order_id(&self, order_id: &str) -> Result<Option<Transaction>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fetch_transaction_by_order_id(order_id, &mut conn).await?)
    }

    async fn fetch_orphaned_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fetch_orphaned_transactions(&mut conn).await?)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete for {}", self.url);
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
