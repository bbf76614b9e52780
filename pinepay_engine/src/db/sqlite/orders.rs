use log::{debug, trace};
use sqlx::SqliteConnection;

use super::is_unique_violation;
use crate::{
    db_types::{NewOrder, Order, OrderStatusType},
    traits::StoreError,
};

/// Inserts a new order in the `Pending` state.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let reference = order.transaction_reference_id.clone();
    let result: Result<Order, sqlx::Error> = sqlx::query_as(
        r#"
            INSERT INTO orders (user_id, transaction_reference_id, amount, currency)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order.user_id)
    .bind(order.transaction_reference_id)
    .bind(order.amount)
    .bind(order.currency)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => {
            debug!("📝️ Order [{}] inserted with id {}", order.transaction_reference_id, order.id);
            Ok(order)
        },
        Err(e) if is_unique_violation(&e) => Err(StoreError::OrderAlreadyExists(reference)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_reference(
    reference_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE transaction_reference_id = $1")
        .bind(reference_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Moves the order to `status`, provided it is currently `Pending` or already has that status.
///
/// The guard is part of the `UPDATE` statement itself, so a concurrent change cannot slip in between the check and
/// the write. When no row is updated, the order is re-read to tell a missing order from an illegal change.
pub async fn update_order_status(
    reference_id: &str,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, StoreError> {
    let updated: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                updated_at = CASE WHEN status = $1 THEN updated_at ELSE CURRENT_TIMESTAMP END,
                status = $1
            WHERE transaction_reference_id = $2 AND (status = 'Pending' OR status = $1)
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(reference_id)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(order) = updated {
        trace!("📝️ Order [{reference_id}] status is now {}", order.status);
        return Ok(order);
    }
    match fetch_order_by_reference(reference_id, conn).await? {
        Some(order) => Err(StoreError::IllegalStatusChange {
            reference: reference_id.to_string(),
            from: order.status.to_string(),
            to: status.to_string(),
        }),
        None => Err(StoreError::OrderNotFound(reference_id.to_string())),
    }
}
