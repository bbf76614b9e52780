use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use pinepay_common::{Amount, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;

//--------------------------------------     AccessToken     ---------------------------------------------------------
/// Declared token lifetimes are capped at this value.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::days(30);

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: Secret<String>,
    /// Absolute expiry, when the token endpoint supplies one
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Relative expiry in seconds, when the token endpoint supplies one
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl AccessToken {
    /// The remaining lifetime of the token as declared by the provider, measured from `now`. `expires_at` takes
    /// precedence over `expires_in`. Returns `None` if the provider did not declare an expiry.
    ///
    /// The result lies between zero and [`MAX_TOKEN_LIFETIME`], whatever the provider sent.
    pub fn declared_lifetime(&self, now: DateTime<Utc>) -> Option<Duration> {
        let lifetime = match (self.expires_at, self.expires_in) {
            (Some(at), _) => at.signed_duration_since(now),
            (None, Some(secs)) => Duration::seconds(secs.clamp(0, MAX_TOKEN_LIFETIME.num_seconds())),
            (None, None) => return None,
        };
        Some(lifetime.clamp(Duration::zero(), MAX_TOKEN_LIFETIME))
    }
}

//--------------------------------------      Orders         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAmount {
    /// The amount in the minor currency unit
    pub value: Amount,
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseDetails {
    #[serde(default)]
    pub customer: Customer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_metadata: Option<BTreeMap<String, String>>,
}

/// The body of a create-order call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub merchant_order_reference: String,
    pub order_amount: OrderAmount,
    #[serde(default)]
    pub pre_auth: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_payment_methods: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_callback_url: Option<String>,
    pub purchase_details: PurchaseDetails,
}

/// The response to a successful create-order call. `token` is the checkout token for the hosted payment page, not
/// an API credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub token: String,
    pub order_id: String,
    pub redirect_url: String,
}

//--------------------------------------   Order details     ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
    pub data: ProviderOrder,
}

/// Pine Labs' own record of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub order_id: String,
    #[serde(default)]
    pub merchant_order_reference: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub order_amount: Option<OrderAmount>,
    #[serde(default)]
    pub pre_auth: Option<bool>,
    #[serde(default)]
    pub allowed_payment_methods: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub failure_callback_url: Option<String>,
    #[serde(default)]
    pub purchase_details: Option<PurchaseDetails>,
    #[serde(default)]
    pub payments: Vec<ProviderPayment>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A payment attempt against an order, including its settlement details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPayment {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_payment_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<OrderAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquirer_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

//--------------------------------------      Refunds        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub merchant_order_reference: String,
    pub order_amount: OrderAmount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_metadata: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundResponse {
    #[serde(default)]
    pub data: Option<ProviderOrder>,
    #[serde(default)]
    pub message: Option<String>,
}
