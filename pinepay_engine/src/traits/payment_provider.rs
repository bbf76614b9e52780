use async_trait::async_trait;
use chrono::Duration;
use pine_labs_tools::{
    AccessToken,
    CreateOrderRequest,
    OrderDetails,
    OrderResponse,
    PineLabsApi,
    PineLabsApiError,
    RefundRequest,
    RefundResponse,
};
use pinepay_common::Secret;

/// The calls the order flow makes to the payment provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// The token lifetime to assume when the token endpoint does not declare one.
    fn default_token_lifetime(&self) -> Duration;

    async fn fetch_access_token(&self) -> Result<AccessToken, PineLabsApiError>;

    async fn create_order(
        &self,
        token: &Secret<String>,
        order: &CreateOrderRequest,
    ) -> Result<OrderResponse, PineLabsApiError>;

    async fn get_order_details(&self, token: &Secret<String>, order_id: &str)
        -> Result<OrderDetails, PineLabsApiError>;

    async fn refund(
        &self,
        token: &Secret<String>,
        order_id: &str,
        refund: &RefundRequest,
    ) -> Result<RefundResponse, PineLabsApiError>;
}

#[async_trait]
impl PaymentProvider for PineLabsApi {
    fn default_token_lifetime(&self) -> Duration {
        self.config().default_token_lifetime
    }

    async fn fetch_access_token(&self) -> Result<AccessToken, PineLabsApiError> {
        PineLabsApi::fetch_access_token(self).await
    }

    async fn create_order(
        &self,
        token: &Secret<String>,
        order: &CreateOrderRequest,
    ) -> Result<OrderResponse, PineLabsApiError> {
        PineLabsApi::create_order(self, token, order).await
    }

    async fn get_order_details(
        &self,
        token: &Secret<String>,
        order_id: &str,
    ) -> Result<OrderDetails, PineLabsApiError> {
        PineLabsApi::get_order_details(self, token, order_id).await
    }

    async fn refund(
        &self,
        token: &Secret<String>,
        order_id: &str,
        refund: &RefundRequest,
    ) -> Result<RefundResponse, PineLabsApiError> {
        PineLabsApi::refund(self, token, order_id, refund).await
    }
}
