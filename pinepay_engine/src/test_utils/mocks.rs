use async_trait::async_trait;
use chrono::Duration;
use mockall::mock;
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

use crate::{
    db_types::{NewOrder, NewTransaction, Order, OrderUpdate, Transaction, TransactionUpdate},
    traits::{OrderManagement, PaymentProvider, StoreError, TransactionManagement},
};

mock! {
    pub Provider {}

    #[async_trait]
    impl PaymentProvider for Provider {
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
}

mock! {
    pub Store {}

    #[async_trait]
    impl OrderManagement for Store {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;
        async fn update_order_by_reference(&self, reference_id: &str, update: OrderUpdate) -> Result<Order, StoreError>;
        async fn fetch_order_by_reference(&self, reference_id: &str) -> Result<Option<Order>, StoreError>;
    }

    #[async_trait]
    impl TransactionManagement for Store {
        async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, StoreError>;
        async fn update_transaction_by_order_id(
            &self,
            order_id: &str,
            update: TransactionUpdate,
        ) -> Result<Transaction, StoreError>;
        async fn fetch_transaction_by_order_id(&self, order_id: &str) -> Result<Option<Transaction>, StoreError>;
        async fn fetch_orphaned_transactions(&self) -> Result<Vec<Transaction>, StoreError>;
    }
}
