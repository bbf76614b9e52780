mod api;
mod config;
mod error;

mod data_objects;

pub use api::PineLabsApi;
pub use config::PineLabsConfig;
pub use data_objects::{
    AccessToken,
    Address,
    CreateOrderRequest,
    Customer,
    OrderAmount,
    OrderDetails,
    OrderResponse,
    ProviderOrder,
    ProviderPayment,
    PurchaseDetails,
    RefundRequest,
    RefundResponse,
    MAX_TOKEN_LIFETIME,
};
pub use error::{provider_message, PineLabsApiError};
