use crate::{db_types::OrderStatusType, ppe_api::errors::StatusValidationError};

/// Checks a requested order status.
///
/// Only `""`, `"pending"`, `"success"` and `"failed"` are accepted, in lower case. The empty string means that no
/// status change was requested and yields `None`. Whether the order may actually move to the new status depends on
/// its current status, and that is decided by the store when the change is applied.
pub fn validate_status_update(requested: &str) -> Result<Option<OrderStatusType>, StatusValidationError> {
    match requested {
        "" => Ok(None),
        "pending" => Ok(Some(OrderStatusType::Pending)),
        "success" => Ok(Some(OrderStatusType::Success)),
        "failed" => Ok(Some(OrderStatusType::Failed)),
        other => Err(StatusValidationError::InvalidStatus(other.to_string())),
    }
}
