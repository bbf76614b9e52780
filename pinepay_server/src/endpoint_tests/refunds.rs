use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use actix_web::{http::StatusCode, test::TestRequest};
use async_trait::async_trait;
use chrono::Duration;
use pine_labs_tools::{
    AccessToken,
    CreateOrderRequest,
    OrderDetails,
    OrderResponse,
    PineLabsApiError,
    RefundRequest,
    RefundResponse,
};
use pinepay_common::Secret;
use pinepay_engine::{
    test_utils::{fixtures::new_transaction, mocks::MockStore},
    MemoryCache,
    MemoryStore,
    OrderFlowApi,
    PaymentProvider,
    TransactionManagement,
};
use serde_json::json;
use tokio::sync::Notify;

use super::helpers::{eventually, json_body, provider_with_token, send, BEARER};
use crate::config::ServerConfig;

fn refund_body() -> serde_json::Value {
    json!({
        "merchant_order_reference": "refund-1",
        "order_amount": {"value": 5000, "currency": "INR"}
    })
}

fn order_details(order_id: &str) -> OrderDetails {
    serde_json::from_value(json!({"data": {
        "order_id": order_id,
        "status": "PARTIALLY_REFUNDED",
        "order_amount": {"value": 10000, "currency": "INR"},
        "payments": [{"id": "pay_1", "status": "PROCESSED", "payment_method": "CARD"}],
        "updated_at": "2024-06-01T12:05:00Z"
    }}))
    .unwrap()
}

/// Refunds succeed straight away. Order detail lookups wait for `gate`.
#[derive(Default)]
struct HeldLookups {
    gate: Arc<Notify>,
    detail_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PaymentProvider for HeldLookups {
    fn default_token_lifetime(&self) -> Duration {
        Duration::minutes(60)
    }

    async fn fetch_access_token(&self) -> Result<AccessToken, PineLabsApiError> {
        Ok(AccessToken { access_token: Secret::new(BEARER.to_string()), expires_at: None, expires_in: Some(3600) })
    }

    async fn create_order(
        &self,
        _token: &Secret<String>,
        _order: &CreateOrderRequest,
    ) -> Result<OrderResponse, PineLabsApiError> {
        Err(PineLabsApiError::NetworkError("not available".to_string()))
    }

    async fn get_order_details(
        &self,
        _token: &Secret<String>,
        order_id: &str,
    ) -> Result<OrderDetails, PineLabsApiError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(order_details(order_id))
    }

    async fn refund(
        &self,
        _token: &Secret<String>,
        _order_id: &str,
        _refund: &RefundRequest,
    ) -> Result<RefundResponse, PineLabsApiError> {
        Ok(RefundResponse { data: None, message: Some("Refund initiated".to_string()) })
    }
}

fn no_reconciliation() -> ServerConfig {
    ServerConfig { reconcile_after_refund: false, ..ServerConfig::default() }
}

#[actix_web::test]
async fn refund_is_passed_through() {
    let _ = env_logger::try_init().ok();
    let mut provider = provider_with_token();
    provider
        .expect_refund()
        .times(1)
        .withf(|token, id, refund| token.reveal() == BEARER && id == "ord_1" && refund.order_amount.value.value() == 5000)
        .returning(|_, _, _| Ok(RefundResponse { data: None, message: Some("Refund initiated".to_string()) }));
    provider.expect_get_order_details().never();
    // No store calls are expected
    let api = OrderFlowApi::new(MockStore::new(), MemoryCache::new(), provider);
    let req = TestRequest::post().uri("/api/orders/ord_1/refund").set_json(refund_body());
    let (status, body) = send(api, no_reconciliation(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["message"], "Refund initiated");
}

#[actix_web::test]
async fn refund_triggers_a_reconciliation() {
    let _ = env_logger::try_init().ok();
    let mut provider = provider_with_token();
    provider.expect_refund().times(1).returning(|_, _, _| Ok(RefundResponse { data: None, message: None }));
    provider.expect_get_order_details().times(1).returning(|_, id| Ok(order_details(id)));
    let store = MemoryStore::new();
    store.insert_transaction(new_transaction("ord_1")).await.unwrap();
    let api = OrderFlowApi::new(store.clone(), MemoryCache::new(), provider);
    let req = TestRequest::post().uri("/api/orders/ord_1/refund").set_json(refund_body());
    let (status, _) = send(api, ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::OK);
    let reconciled = eventually(|| async {
        let tx = store.fetch_transaction_by_order_id("ord_1").await.unwrap().unwrap();
        tx.status.as_deref() == Some("PARTIALLY_REFUNDED")
    })
    .await;
    assert!(reconciled, "The transaction was not reconciled after the refund");
}

#[actix_web::test]
async fn refund_during_a_running_reconciliation_does_not_start_another() {
    let _ = env_logger::try_init().ok();
    let provider = HeldLookups::default();
    let gate = Arc::clone(&provider.gate);
    let calls = Arc::clone(&provider.detail_calls);
    let store = MemoryStore::new();
    store.insert_transaction(new_transaction("ord_1")).await.unwrap();
    let api = OrderFlowApi::new(store.clone(), MemoryCache::new(), provider);
    let running = api.reconcile("ord_1").expect("The first reconciliation was not started");
    assert!(eventually(|| async { calls.load(Ordering::SeqCst) == 1 }).await);

    let req = TestRequest::post().uri("/api/orders/ord_1/refund").set_json(refund_body());
    let (status, body) = send(api, ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["message"], "Refund initiated");

    gate.notify_one();
    running.await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let tx = store.fetch_transaction_by_order_id("ord_1").await.unwrap().unwrap();
    assert_eq!(tx.status.as_deref(), Some("PARTIALLY_REFUNDED"));
}

#[actix_web::test]
async fn rejected_refund() {
    let _ = env_logger::try_init().ok();
    let mut provider = provider_with_token();
    provider.expect_refund().returning(|_, _, _| {
        Err(PineLabsApiError::ProviderError { status: 422, payload: Some(json!({"message": "Amount exceeds balance"})) })
    });
    provider.expect_get_order_details().never();
    let api = OrderFlowApi::new(MockStore::new(), MemoryCache::new(), provider);
    let req = TestRequest::post().uri("/api/orders/ord_1/refund").set_json(refund_body());
    let (status, body) = send(api, ServerConfig::default(), req).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json_body(&body)["error"].as_str().unwrap().contains("Amount exceeds balance"));
}

#[actix_web::test]
async fn sync_is_accepted_and_runs_in_the_background() {
    let _ = env_logger::try_init().ok();
    let mut provider = provider_with_token();
    provider.expect_get_order_details().times(1).returning(|_, id| Ok(order_details(id)));
    let store = MemoryStore::new();
    store.insert_transaction(new_transaction("ord_1")).await.unwrap();
    let api = OrderFlowApi::new(store.clone(), MemoryCache::new(), provider);
    let (status, body) = send(api, ServerConfig::default(), TestRequest::post().uri("/api/orders/ord_1/sync")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let body = json_body(&body);
    assert_eq!(body["order_id"], "ord_1");
    assert_eq!(body["started"], true);
    let reconciled = eventually(|| async {
        let tx = store.fetch_transaction_by_order_id("ord_1").await.unwrap().unwrap();
        tx.payments.len() == 1 && tx.status.as_deref() == Some("PARTIALLY_REFUNDED")
    })
    .await;
    assert!(reconciled, "The transaction was not reconciled");
}

#[actix_web::test]
async fn sync_of_an_unknown_order_is_still_accepted() {
    let _ = env_logger::try_init().ok();
    let mut provider = provider_with_token();
    provider.expect_get_order_details().returning(|_, id| Ok(order_details(id)));
    let store = MemoryStore::new();
    let api = OrderFlowApi::new(store.clone(), MemoryCache::new(), provider);
    let (status, _) = send(api, ServerConfig::default(), TestRequest::post().uri("/api/orders/ord_9/sync")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(store.transaction_count().await, 0);
}
