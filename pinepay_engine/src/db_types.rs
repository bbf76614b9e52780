use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use pine_labs_tools::{ProviderOrder, ProviderPayment, PurchaseDetails};
use pinepay_common::Amount;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been placed with the provider and is awaiting payment.
    Pending,
    /// The payment for the order succeeded.
    Success,
    /// The payment for the order failed.
    Failed,
}

impl OrderStatusType {
    /// Whether an order currently in this status may be moved to `next`.
    ///
    /// Orders only ever leave `Pending`. Re-applying the current status is allowed and results in a no-op.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        *self == next || *self == OrderStatusType::Pending
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Success => write!(f, "Success"),
            OrderStatusType::Failed => write!(f, "Failed"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" | "pending" => Ok(Self::Pending),
            "Success" | "success" => Ok(Self::Success),
            "Failed" | "failed" => Ok(Self::Failed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
/// The merchant's local record of a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: String,
    /// The provider order id of the backing [`Transaction`]
    pub transaction_reference_id: String,
    pub amount: Amount,
    pub currency: String,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
/// A new order. Orders are always created in the `Pending` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: String,
    pub transaction_reference_id: String,
    pub amount: Amount,
    pub currency: String,
}

impl NewOrder {
    pub fn new(user_id: String, transaction_reference_id: String, amount: Amount, currency: String) -> Self {
        Self { user_id, transaction_reference_id, amount, currency }
    }
}

//--------------------------------------     OrderUpdate       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub status: Option<OrderStatusType>,
}

impl OrderUpdate {
    pub fn with_status(status: OrderStatusType) -> Self {
        Self { status: Some(status) }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
    }
}

//--------------------------------------     Transaction       ---------------------------------------------------------
/// The merchant's mirror of the provider's order object.
///
/// `provider_order_id` is assigned when the provider creates the order and never changes afterwards. Fields from
/// `status` onwards are only known once the transaction has been reconciled with the provider.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub merchant_order_reference: String,
    pub amount: Amount,
    pub currency: String,
    pub pre_auth: bool,
    #[sqlx(json)]
    pub allowed_payment_methods: Vec<String>,
    pub notes: Option<String>,
    pub callback_url: Option<String>,
    pub failure_callback_url: Option<String>,
    #[sqlx(json)]
    pub purchase_details: PurchaseDetails,
    pub provider_order_id: String,
    /// The checkout token for the hosted payment page
    pub token: String,
    pub redirect_url: String,
    /// The provider's status for the order, verbatim
    pub status: Option<String>,
    #[sqlx(json)]
    pub payments: Vec<ProviderPayment>,
    pub provider_created_at: Option<DateTime<Utc>>,
    pub provider_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    NewTransaction     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub merchant_order_reference: String,
    pub amount: Amount,
    pub currency: String,
    pub pre_auth: bool,
    pub allowed_payment_methods: Vec<String>,
    pub notes: Option<String>,
    pub callback_url: Option<String>,
    pub failure_callback_url: Option<String>,
    pub purchase_details: PurchaseDetails,
    pub provider_order_id: String,
    pub token: String,
    pub redirect_url: String,
}

//--------------------------------------   TransactionUpdate   ---------------------------------------------------------
/// A partial update to a stored transaction. `None` fields are left untouched.
///
/// The provider order id and the merchant order reference cannot be changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    pub status: Option<String>,
    pub amount: Option<Amount>,
    pub currency: Option<String>,
    pub pre_auth: Option<bool>,
    pub allowed_payment_methods: Option<Vec<String>>,
    pub notes: Option<String>,
    pub callback_url: Option<String>,
    pub failure_callback_url: Option<String>,
    pub purchase_details: Option<PurchaseDetails>,
    pub payments: Option<Vec<ProviderPayment>>,
    pub provider_created_at: Option<DateTime<Utc>>,
    pub provider_updated_at: Option<DateTime<Utc>>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the update to an in-memory copy of a transaction.
    pub fn apply_to(self, tx: &mut Transaction) {
        if let Some(status) = self.status {
            tx.status = Some(status);
        }
        if let Some(amount) = self.amount {
            tx.amount = amount;
        }
        if let Some(currency) = self.currency {
            tx.currency = currency;
        }
        if let Some(pre_auth) = self.pre_auth {
            tx.pre_auth = pre_auth;
        }
        if let Some(methods) = self.allowed_payment_methods {
            tx.allowed_payment_methods = methods;
        }
        if self.notes.is_some() {
            tx.notes = self.notes;
        }
        if self.callback_url.is_some() {
            tx.callback_url = self.callback_url;
        }
        if self.failure_callback_url.is_some() {
            tx.failure_callback_url = self.failure_callback_url;
        }
        if let Some(details) = self.purchase_details {
            tx.purchase_details = details;
        }
        if let Some(payments) = self.payments {
            tx.payments = payments;
        }
        if self.provider_created_at.is_some() {
            tx.provider_created_at = self.provider_created_at;
        }
        if self.provider_updated_at.is_some() {
            tx.provider_updated_at = self.provider_updated_at;
        }
    }
}

impl From<ProviderOrder> for TransactionUpdate {
    fn from(order: ProviderOrder) -> Self {
        let (amount, currency) = match order.order_amount {
            Some(a) => (Some(a.value), Some(a.currency)),
            None => (None, None),
        };
        let status = Some(order.status).filter(|s| !s.is_empty());
        Self {
            status,
            amount,
            currency,
            pre_auth: order.pre_auth,
            allowed_payment_methods: order.allowed_payment_methods,
            notes: order.notes,
            callback_url: order.callback_url,
            failure_callback_url: order.failure_callback_url,
            purchase_details: order.purchase_details,
            payments: Some(order.payments),
            provider_created_at: order.created_at,
            provider_updated_at: order.updated_at,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_transitions() {
        use OrderStatusType::*;
        assert!(Pending.can_transition_to(Success));
        assert!(Pending.can_transition_to(Failed));
        assert!(Pending.can_transition_to(Pending));
        assert!(Success.can_transition_to(Success));
        assert!(Failed.can_transition_to(Failed));
        assert!(!Success.can_transition_to(Pending));
        assert!(!Success.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Success));
    }

    #[test]
    fn status_strings() {
        assert_eq!("pending".parse::<OrderStatusType>().unwrap(), OrderStatusType::Pending);
        assert_eq!("Success".parse::<OrderStatusType>().unwrap(), OrderStatusType::Success);
        assert!("cancelled".parse::<OrderStatusType>().is_err());
        assert_eq!(OrderStatusType::from("garbage".to_string()), OrderStatusType::Pending);
        assert_eq!(OrderStatusType::Failed.to_string(), "Failed");
    }

    #[test]
    fn provider_order_to_update() {
        let json = r#"{"order_id":"ord_1","status":"PROCESSED","order_amount":{"value":10000,"currency":"INR"},
            "payments":[{"id":"pay_1","status":"PROCESSED"}]}"#;
        let order: ProviderOrder = serde_json::from_str(json).unwrap();
        let update = TransactionUpdate::from(order);
        assert_eq!(update.status.as_deref(), Some("PROCESSED"));
        assert_eq!(update.amount, Some(Amount::from(10_000)));
        assert_eq!(update.payments.as_ref().unwrap().len(), 1);
        assert!(update.notes.is_none());
        assert!(!update.is_empty());
    }
}
