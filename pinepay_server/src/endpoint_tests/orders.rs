use actix_web::{http::StatusCode, test::TestRequest};
use pine_labs_tools::{OrderResponse, PineLabsApiError};
use pinepay_common::Amount;
use pinepay_engine::{
    db_types::OrderStatusType,
    test_utils::{
        fixtures::{new_order, new_transaction},
        mocks::{MockProvider, MockStore},
    },
    MemoryCache,
    MemoryStore,
    OrderFlowApi,
    OrderManagement,
    StoreError,
    TransactionManagement,
};
use serde_json::json;

use super::helpers::{json_body, provider_with_token, send, BEARER};
use crate::config::ServerConfig;

fn place_order_body() -> serde_json::Value {
    json!({
        "merchant_order_reference": "m-1",
        "order_amount": {"value": "100.00", "currency": "INR"},
        "allowed_payment_methods": ["CARD", "UPI"],
        "callback_url": "https://merchant.example/success",
        "purchase_details": {
            "customer": {
                "customer_id": "cust-123",
                "email_id": "kiran@example.com",
                "first_name": "Kiran"
            }
        }
    })
}

async fn store_with_order(reference: &str) -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_transaction(new_transaction(reference)).await.unwrap();
    store.insert_order(new_order(reference)).await.unwrap();
    store
}

#[actix_web::test]
async fn place_order() {
    let _ = env_logger::try_init().ok();
    let mut provider = provider_with_token();
    provider
        .expect_create_order()
        .times(1)
        .withf(|token, order| token.reveal() == BEARER && order.order_amount.value == Amount::from(10_000))
        .returning(|_, _| {
            Ok(OrderResponse {
                token: "tok_1".to_string(),
                order_id: "ord_1".to_string(),
                redirect_url: "https://pay/ord_1".to_string(),
            })
        });
    let store = MemoryStore::new();
    let api = OrderFlowApi::new(store.clone(), MemoryCache::new(), provider);
    let req = TestRequest::post().uri("/api/orders").set_json(place_order_body());
    let (status, body) = send(api, ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({"token": "tok_1", "order_id": "ord_1", "redirect_url": "https://pay/ord_1"}));
    let order = store.fetch_order_by_reference("ord_1").await.unwrap().expect("Order was not stored");
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.user_id, "cust-123");
    assert_eq!(order.amount, Amount::from(10_000));
}

#[actix_web::test]
async fn place_order_with_a_malformed_body() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider.expect_create_order().never();
    let api = OrderFlowApi::new(MemoryStore::new(), MemoryCache::new(), provider);
    let req = TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({"merchant_order_reference": "m-1", "order_amount": {"value": "a lot", "currency": "INR"}}));
    let (status, body) = send(api, ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json_body(&body)["error"].as_str().unwrap().starts_with("Could not read request body"));
}

#[actix_web::test]
async fn provider_rejection_is_a_bad_gateway() {
    let _ = env_logger::try_init().ok();
    let mut provider = provider_with_token();
    provider.expect_create_order().returning(|_, _| {
        Err(PineLabsApiError::ProviderError {
            status: 400,
            payload: Some(json!({"code": "INVALID_REQUEST", "message": "Invalid amount"})),
        })
    });
    let store = MemoryStore::new();
    let api = OrderFlowApi::new(store.clone(), MemoryCache::new(), provider);
    let req = TestRequest::post().uri("/api/orders").set_json(place_order_body());
    let (status, body) = send(api, ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let error = json_body(&body)["error"].as_str().unwrap().to_string();
    assert!(error.contains("INVALID_REQUEST: Invalid amount"));
    assert!(!error.contains(BEARER));
    assert_eq!(store.transaction_count().await, 0);
}

#[actix_web::test]
async fn token_failure_is_service_unavailable() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider
        .expect_fetch_access_token()
        .returning(|| Err(PineLabsApiError::TokenFetchError("Token endpoint returned status 401".to_string())));
    provider.expect_create_order().never();
    let api = OrderFlowApi::new(MemoryStore::new(), MemoryCache::new(), provider);
    let req = TestRequest::post().uri("/api/orders").set_json(place_order_body());
    let (status, _) = send(api, ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn failed_order_write_is_an_internal_error() {
    let _ = env_logger::try_init().ok();
    let mut provider = provider_with_token();
    provider.expect_create_order().returning(|_, order| {
        Ok(OrderResponse {
            token: "tok_1".to_string(),
            order_id: format!("ord_{}", order.merchant_order_reference),
            redirect_url: "https://pay/ord_1".to_string(),
        })
    });
    let mut store = MockStore::new();
    store.expect_insert_transaction().times(1).returning(|_| Err(StoreError::DatabaseError("database is locked".into())));
    store.expect_insert_order().never();
    let api = OrderFlowApi::new(store, MemoryCache::new(), provider);
    let req = TestRequest::post().uri("/api/orders").set_json(place_order_body());
    let (status, body) = send(api, ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json_body(&body)["error"].as_str().unwrap().contains("ord_m-1"));
}

#[actix_web::test]
async fn fetch_order() {
    let _ = env_logger::try_init().ok();
    let store = store_with_order("ord_1").await;
    let api = OrderFlowApi::new(store, MemoryCache::new(), MockProvider::new());
    let (status, body) = send(api.clone(), ServerConfig::default(), TestRequest::get().uri("/api/orders/ord_1")).await;
    assert_eq!(status, StatusCode::OK);
    let order = json_body(&body);
    assert_eq!(order["transaction_reference_id"], "ord_1");
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["amount"], 10_000);

    let (status, body) = send(api, ServerConfig::default(), TestRequest::get().uri("/api/orders/ord_2")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json_body(&body)["error"].as_str().unwrap().contains("ord_2"));
}

#[actix_web::test]
async fn update_order_status() {
    let _ = env_logger::try_init().ok();
    let store = store_with_order("ord_1").await;
    let api = OrderFlowApi::new(store.clone(), MemoryCache::new(), MockProvider::new());
    let req = TestRequest::patch().uri("/api/orders/ord_1").set_json(json!({"status": "success"}));
    let (status, body) = send(api.clone(), ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["status"], "Success");

    // Orders cannot leave a terminal state
    let req = TestRequest::patch().uri("/api/orders/ord_1").set_json(json!({"status": "failed"}));
    let (status, body) = send(api.clone(), ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json_body(&body)["error"].as_str().unwrap().contains("from Success to Failed"));

    // Repeating the current status is fine
    let req = TestRequest::patch().uri("/api/orders/ord_1").set_json(json!({"status": "success"}));
    let (status, _) = send(api, ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::OK);
    let order = store.fetch_order_by_reference("ord_1").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Success);
}

#[actix_web::test]
async fn update_order_with_an_invalid_status() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_update_order_by_reference().never();
    let api = OrderFlowApi::new(store, MemoryCache::new(), MockProvider::new());
    let req = TestRequest::patch().uri("/api/orders/ord_1").set_json(json!({"status": "cancelled"}));
    let (status, body) = send(api, ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "Validation error: invalid status value: cancelled");
}

#[actix_web::test]
async fn update_missing_order() {
    let _ = env_logger::try_init().ok();
    let api = OrderFlowApi::new(MemoryStore::new(), MemoryCache::new(), MockProvider::new());
    let req = TestRequest::patch().uri("/api/orders/ord_404").set_json(json!({"status": "failed"}));
    let (status, _) = send(api, ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
