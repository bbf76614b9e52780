use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, types::Json, FromRow, QueryBuilder, Sqlite, SqliteConnection};

use super::is_unique_violation;
use crate::{
    db_types::{NewTransaction, Transaction, TransactionUpdate},
    traits::StoreError,
};

pub async fn insert_transaction(tx: NewTransaction, conn: &mut SqliteConnection) -> Result<Transaction, StoreError> {
    let provider_order_id = tx.provider_order_id.clone();
    let result: Result<Transaction, sqlx::Error> = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                merchant_order_reference,
                amount,
                currency,
                pre_auth,
                allowed_payment_methods,
                notes,
                callback_url,
                failure_callback_url,
                purchase_details,
                provider_order_id,
                token,
                redirect_url
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *;
        "#,
    )
    .bind(tx.merchant_order_reference)
    .bind(tx.amount)
    .bind(tx.currency)
    .bind(tx.pre_auth)
    .bind(Json(tx.allowed_payment_methods))
    .bind(tx.notes)
    .bind(tx.callback_url)
    .bind(tx.failure_callback_url)
    .bind(Json(tx.purchase_details))
    .bind(tx.provider_order_id)
    .bind(tx.token)
    .bind(tx.redirect_url)
    .fetch_one(conn)
    .await;
    match result {
        Ok(tx) => {
            debug!("📝️ Transaction for provider order [{}] inserted with id {}", tx.provider_order_id, tx.id);
            Ok(tx)
        },
        Err(e) if is_unique_violation(&e) => Err(StoreError::TransactionAlreadyExists(provider_order_id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_transaction_by_order_id(
    order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let tx = sqlx::query_as("SELECT * FROM transactions WHERE provider_order_id = $1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(tx)
}

/// Applies the non-empty fields of `update` to the transaction for `order_id`. Returns `None` if there is no such
/// transaction. An empty update only reads the current record.
pub async fn update_transaction(
    order_id: &str,
    update: TransactionUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, StoreError> {
    if update.is_empty() {
        debug!("📝️ No fields to update for transaction {order_id}. Update request skipped.");
        return Ok(fetch_transaction_by_order_id(order_id, conn).await?);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE transactions SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(status) = update.status {
        set_clause.push("status = ");
        set_clause.push_bind_unseparated(status);
    }
    if let Some(amount) = update.amount {
        set_clause.push("amount = ");
        set_clause.push_bind_unseparated(amount);
    }
    if let Some(currency) = update.currency {
        set_clause.push("currency = ");
        set_clause.push_bind_unseparated(currency);
    }
    if let Some(pre_auth) = update.pre_auth {
        set_clause.push("pre_auth = ");
        set_clause.push_bind_unseparated(pre_auth);
    }
    if let Some(methods) = update.allowed_payment_methods {
        set_clause.push("allowed_payment_methods = ");
        set_clause.push_bind_unseparated(Json(methods));
    }
    if let Some(notes) = update.notes {
        set_clause.push("notes = ");
        set_clause.push_bind_unseparated(notes);
    }
    if let Some(url) = update.callback_url {
        set_clause.push("callback_url = ");
        set_clause.push_bind_unseparated(url);
    }
    if let Some(url) = update.failure_callback_url {
        set_clause.push("failure_callback_url = ");
        set_clause.push_bind_unseparated(url);
    }
    if let Some(details) = update.purchase_details {
        set_clause.push("purchase_details = ");
        set_clause.push_bind_unseparated(Json(details));
    }
    if let Some(payments) = update.payments {
        set_clause.push("payments = ");
        set_clause.push_bind_unseparated(Json(payments));
    }
    if let Some(at) = update.provider_created_at {
        set_clause.push("provider_created_at = ");
        set_clause.push_bind_unseparated(at);
    }
    if let Some(at) = update.provider_updated_at {
        set_clause.push("provider_updated_at = ");
        set_clause.push_bind_unseparated(at);
    }
    builder.push(" WHERE provider_order_id = ");
    builder.push_bind(order_id);
    builder.push(" RETURNING *");
    trace!("📝️ Executing query: {}", builder.sql());
    let res = builder
        .build()
        .fetch_optional(conn)
        .await?
        .map(|row: SqliteRow| Transaction::from_row(&row))
        .transpose()?;
    Ok(res)
}

/// Transactions with no order whose transaction reference matches their provider order id, oldest first.
pub async fn fetch_orphaned_transactions(conn: &mut SqliteConnection) -> Result<Vec<Transaction>, sqlx::Error> {
    let orphans = sqlx::query_as(
        r#"
            SELECT transactions.* FROM transactions
            LEFT JOIN orders ON orders.transaction_reference_id = transactions.provider_order_id
            WHERE orders.id IS NULL
            ORDER BY transactions.id ASC;
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(orphans)
}
