use std::time::Duration as StdDuration;

use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use chrono::Duration;
use log::debug;
use pine_labs_tools::AccessToken;
use pinepay_common::Secret;
use pinepay_engine::{test_utils::mocks::MockProvider, KeyValueCache, OrderFlowApi, PaymentProvider, PaymentStore};
use serde_json::Value;

use crate::{config::ServerConfig, routes::health, server::api_scope};

pub const BEARER: &str = "bearer_abc123";

/// A provider double that hands out tokens. Callers add the expectations for the calls under test.
pub fn provider_with_token() -> MockProvider {
    let mut provider = MockProvider::new();
    provider.expect_fetch_access_token().returning(|| {
        Ok(AccessToken { access_token: Secret::new(BEARER.to_string()), expires_at: None, expires_in: Some(3600) })
    });
    provider.expect_default_token_lifetime().return_const(Duration::minutes(60));
    provider
}

/// Sends `req` through the full `/api` routing and returns the status and the body.
pub async fn send<B, C, P>(api: OrderFlowApi<B, C, P>, config: ServerConfig, req: TestRequest) -> (StatusCode, String)
where
    B: PaymentStore + 'static,
    C: KeyValueCache + 'static,
    P: PaymentProvider + 'static,
{
    let app = App::new()
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(config))
        .service(health)
        .service(api_scope::<B, C, P>());
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn json_body(body: &str) -> Value {
    serde_json::from_str(body).expect("Response body was not JSON")
}

/// Polls `check` until it returns true, for up to two seconds.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        actix_web::rt::time::sleep(StdDuration::from_millis(20)).await;
    }
    false
}
