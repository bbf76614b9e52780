use std::sync::Arc;

use log::*;
use pinepay_common::Secret;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::PineLabsConfig,
    data_objects::{AccessToken, CreateOrderRequest, OrderDetails, OrderResponse, RefundRequest, RefundResponse},
    PineLabsApiError,
};

/// A stateless client for the Pine Labs order, order-detail, refund and token endpoints.
///
/// Every call except [`PineLabsApi::fetch_access_token`] takes the bearer token to use. Obtaining and caching that
/// token is the caller's business.
#[derive(Clone)]
pub struct PineLabsApi {
    config: PineLabsConfig,
    client: Arc<Client>,
}

impl PineLabsApi {
    pub fn new(config: PineLabsConfig) -> Result<Self, PineLabsApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PineLabsApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PineLabsConfig {
        &self.config
    }

    /// Sends an authenticated JSON request and decodes the response.
    ///
    /// * A transport failure yields `NetworkError`.
    /// * A non-200 response yields `ProviderError`, carrying the decoded body if it was valid JSON.
    /// * A 200 response whose body cannot be decoded into `T` yields `DecodeError`.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: &str,
        token: &Secret<String>,
        body: Option<&B>,
    ) -> Result<T, PineLabsApiError> {
        trace!("🌲️ Sending {method} request to {url}");
        let mut req = self.client.request(method, url).bearer_auth(token.reveal());
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await.map_err(|e| PineLabsApiError::NetworkError(e.to_string()))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| PineLabsApiError::NetworkError(e.to_string()))?;
        if status == StatusCode::OK {
            trace!("🌲️ Request to {url} successful");
            serde_json::from_slice::<T>(&bytes).map_err(|e| PineLabsApiError::DecodeError(e.to_string()))
        } else {
            let payload = serde_json::from_slice::<Value>(&bytes).ok();
            debug!("🌲️ Request to {url} failed with status {status}. Response: {payload:?}");
            Err(PineLabsApiError::ProviderError { status: status.as_u16(), payload })
        }
    }

    /// Exchanges the configured client credentials for a fresh access token.
    ///
    /// Every failure, including a malformed response, is reported as a `TokenFetchError`.
    pub async fn fetch_access_token(&self) -> Result<AccessToken, PineLabsApiError> {
        let body = serde_json::json!({
            "client_id": self.config.client_id,
            "client_secret": self.config.client_secret.reveal(),
            "grant_type": self.config.grant_type,
        });
        debug!("🌲️ Requesting a new access token for client {}", self.config.client_id);
        let response = self
            .client
            .post(&self.config.token_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PineLabsApiError::TokenFetchError(e.to_string()))?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!("🌲️ The token endpoint rejected the request with status {status}");
            return Err(PineLabsApiError::TokenFetchError(format!("Token endpoint returned status {status}")));
        }
        let token = response
            .json::<AccessToken>()
            .await
            .map_err(|e| PineLabsApiError::TokenFetchError(format!("Malformed token response. {e}")))?;
        info!("🌲️ Obtained a new access token");
        Ok(token)
    }

    pub async fn create_order(
        &self,
        token: &Secret<String>,
        order: &CreateOrderRequest,
    ) -> Result<OrderResponse, PineLabsApiError> {
        debug!("🌲️ Creating order for merchant reference {}", order.merchant_order_reference);
        let result = self.rest_query(Method::POST, &self.config.order_url, token, Some(order)).await?;
        info!("🌲️ Created order for merchant reference {}", order.merchant_order_reference);
        Ok(result)
    }

    pub async fn get_order_details(
        &self,
        token: &Secret<String>,
        order_id: &str,
    ) -> Result<OrderDetails, PineLabsApiError> {
        let url = url_for(&self.config.order_details_url, order_id);
        debug!("🌲️ Fetching order details for {order_id}");
        let result = self.rest_query::<OrderDetails, ()>(Method::GET, &url, token, None).await?;
        info!("🌲️ Fetched order details for {order_id}. Status: {}", result.data.status);
        Ok(result)
    }

    pub async fn refund(
        &self,
        token: &Secret<String>,
        order_id: &str,
        refund: &RefundRequest,
    ) -> Result<RefundResponse, PineLabsApiError> {
        let url = url_for(&self.config.refund_url, order_id);
        debug!(
            "🌲️ Requesting refund of {} {} for order {order_id}",
            refund.order_amount.value, refund.order_amount.currency
        );
        let result = self.rest_query(Method::POST, &url, token, Some(refund)).await?;
        info!("🌲️ Refund requested for order {order_id}");
        Ok(result)
    }
}

fn url_for(base: &str, id: &str) -> String {
    format!("{}/{id}", base.trim_end_matches('/'))
}
