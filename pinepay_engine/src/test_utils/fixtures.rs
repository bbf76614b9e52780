use pine_labs_tools::{Address, Customer, OrderResponse, PurchaseDetails};
use pinepay_common::Amount;

use crate::{
    db_types::{NewOrder, NewTransaction},
    order_objects::{PlaceOrderAmount, PlaceOrderRequest},
};

pub fn customer() -> Customer {
    let address = Address {
        address1: Some("10 Downing Street".to_string()),
        pincode: Some("110001".to_string()),
        city: Some("New Delhi".to_string()),
        state: Some("Delhi".to_string()),
        country: Some("India".to_string()),
        ..Address::default()
    };
    Customer {
        email_id: Some("kiran@example.com".to_string()),
        first_name: Some("Kiran".to_string()),
        last_name: Some("Kumar".to_string()),
        customer_id: "cust-123".to_string(),
        mobile_number: Some("9876543210".to_string()),
        billing_address: Some(address.clone()),
        shipping_address: Some(address),
    }
}

/// A request for 100.00 INR
pub fn place_order_request(reference: &str) -> PlaceOrderRequest {
    PlaceOrderRequest {
        merchant_order_reference: reference.to_string(),
        order_amount: PlaceOrderAmount { value: Amount::from(10_000), currency: "INR".to_string() },
        pre_auth: false,
        allowed_payment_methods: vec!["CARD".to_string(), "UPI".to_string()],
        notes: Some("Gift wrap please".to_string()),
        callback_url: Some("https://merchant.example/success".to_string()),
        failure_callback_url: Some("https://merchant.example/failure".to_string()),
        purchase_details: PurchaseDetails { customer: customer(), merchant_metadata: None },
    }
}

pub fn order_response(order_id: &str) -> OrderResponse {
    OrderResponse {
        token: format!("tok_{order_id}"),
        order_id: order_id.to_string(),
        redirect_url: format!("https://pay/{order_id}"),
    }
}

pub fn new_order(reference: &str) -> NewOrder {
    NewOrder::new("cust-123".to_string(), reference.to_string(), Amount::from(10_000), "INR".to_string())
}

pub fn new_transaction(order_id: &str) -> NewTransaction {
    NewTransaction {
        merchant_order_reference: format!("merchant-{order_id}"),
        amount: Amount::from(10_000),
        currency: "INR".to_string(),
        pre_auth: false,
        allowed_payment_methods: vec!["CARD".to_string()],
        notes: None,
        callback_url: Some("https://merchant.example/success".to_string()),
        failure_callback_url: None,
        purchase_details: PurchaseDetails { customer: customer(), merchant_metadata: None },
        provider_order_id: order_id.to_string(),
        token: format!("tok_{order_id}"),
        redirect_url: format!("https://pay/{order_id}"),
    }
}
