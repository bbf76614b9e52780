use std::fmt::Display;

use pine_labs_tools::{CreateOrderRequest, OrderAmount, OrderResponse, PurchaseDetails};
use pinepay_common::Amount;
use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::db_types::{NewOrder, NewTransaction};

/// The amount of a placement request. `value` is given in major units (e.g. `100.00` rupees), as a JSON number or
/// string, and converted to minor units on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaceOrderAmount {
    #[serde(deserialize_with = "major_units")]
    pub value: Amount,
    pub currency: String,
}

/// A merchant's request to place a new payment order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaceOrderRequest {
    /// The merchant's idempotency key for this placement
    pub merchant_order_reference: String,
    pub order_amount: PlaceOrderAmount,
    #[serde(default)]
    pub pre_auth: bool,
    #[serde(default)]
    pub allowed_payment_methods: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub failure_callback_url: Option<String>,
    #[serde(default)]
    pub purchase_details: PurchaseDetails,
}

impl PlaceOrderRequest {
    /// The provider payload. All fields pass through unchanged.
    pub fn to_provider_request(&self) -> CreateOrderRequest {
        CreateOrderRequest {
            merchant_order_reference: self.merchant_order_reference.clone(),
            order_amount: OrderAmount {
                value: self.order_amount.value,
                currency: self.order_amount.currency.clone(),
            },
            pre_auth: self.pre_auth,
            allowed_payment_methods: self.allowed_payment_methods.clone(),
            notes: self.notes.clone(),
            callback_url: self.callback_url.clone(),
            failure_callback_url: self.failure_callback_url.clone(),
            purchase_details: self.purchase_details.clone(),
        }
    }

    /// The transaction to store once the provider has accepted the order.
    pub fn to_new_transaction(&self, response: &OrderResponse) -> NewTransaction {
        NewTransaction {
            merchant_order_reference: self.merchant_order_reference.clone(),
            amount: self.order_amount.value,
            currency: self.order_amount.currency.clone(),
            pre_auth: self.pre_auth,
            allowed_payment_methods: self.allowed_payment_methods.clone(),
            notes: self.notes.clone(),
            callback_url: self.callback_url.clone(),
            failure_callback_url: self.failure_callback_url.clone(),
            purchase_details: self.purchase_details.clone(),
            provider_order_id: response.order_id.clone(),
            token: response.token.clone(),
            redirect_url: response.redirect_url.clone(),
        }
    }

    /// The order to store once its transaction has been stored. The customer id becomes the order's user id.
    pub fn to_new_order(&self, response: &OrderResponse) -> NewOrder {
        NewOrder::new(
            self.purchase_details.customer.customer_id.clone(),
            response.order_id.clone(),
            self.order_amount.value,
            self.order_amount.currency.clone(),
        )
    }
}

fn major_units<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let repr = match &value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        v => return Err(D::Error::custom(format!("Expected an amount, got {v}"))),
    };
    repr.parse::<Amount>().map_err(D::Error::custom)
}

/// A request to change the status of an order. `status` must be one of `""`, `"pending"`, `"success"` or
/// `"failed"`. An empty or missing status leaves the order unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderPayload {
    #[serde(default)]
    pub status: Option<String>,
}

impl UpdateOrderPayload {
    pub fn with_status<S: Display>(status: S) -> Self {
        Self { status: Some(status.to_string()) }
    }
}
