use pine_labs_tools::{provider_message, PineLabsApiError};
use serde_json::Value;
use thiserror::Error;

use crate::traits::StoreError;

#[derive(Debug, Clone, Error)]
pub enum StatusValidationError {
    #[error("invalid status value: {0}")]
    InvalidStatus(String),
}

#[derive(Debug, Clone, Error)]
pub enum TokenCacheError {
    #[error("Could not obtain an access token. {0}")]
    TokenFetchError(String),
    #[error("The token endpoint returned an empty access token")]
    EmptyToken,
}

/// Everything that can go wrong in the order flow. Messages identify the operation and the ids involved, but never
/// contain tokens or credentials.
#[derive(Debug, Error)]
pub enum OrderFlowError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Could not obtain an access token. {0}")]
    TokenFetchError(String),
    #[error("Could not reach the payment provider. {0}")]
    NetworkError(String),
    #[error("The payment provider rejected the request with status {status}. {}", provider_message(.payload))]
    ProviderError { status: u16, payload: Option<Value> },
    #[error("Could not decode the payment provider's response. {0}")]
    DecodeError(String),
    #[error("Could not {context}. {source}")]
    PersistenceError { context: String, source: StoreError },
}

impl OrderFlowError {
    pub fn persistence<S: Into<String>>(context: S, source: StoreError) -> Self {
        Self::PersistenceError { context: context.into(), source }
    }
}

impl From<PineLabsApiError> for OrderFlowError {
    fn from(e: PineLabsApiError) -> Self {
        match e {
            PineLabsApiError::Initialization(s) => Self::NetworkError(s),
            PineLabsApiError::TokenFetchError(s) => Self::TokenFetchError(s),
            PineLabsApiError::NetworkError(s) => Self::NetworkError(s),
            PineLabsApiError::ProviderError { status, payload } => Self::ProviderError { status, payload },
            PineLabsApiError::DecodeError(s) => Self::DecodeError(s),
        }
    }
}

impl From<TokenCacheError> for OrderFlowError {
    fn from(e: TokenCacheError) -> Self {
        match e {
            TokenCacheError::TokenFetchError(s) => Self::TokenFetchError(s),
            e => Self::TokenFetchError(e.to_string()),
        }
    }
}

impl From<StatusValidationError> for OrderFlowError {
    fn from(e: StatusValidationError) -> Self {
        Self::ValidationError(e.to_string())
    }
}
