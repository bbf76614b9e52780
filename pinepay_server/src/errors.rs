use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use pinepay_engine::{OrderFlowError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    OrderFlowError(#[from] OrderFlowError),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::OrderFlowError(e) => match e {
                OrderFlowError::ValidationError(_) => StatusCode::BAD_REQUEST,
                OrderFlowError::TokenFetchError(_) => StatusCode::SERVICE_UNAVAILABLE,
                OrderFlowError::NetworkError(_) => StatusCode::SERVICE_UNAVAILABLE,
                OrderFlowError::ProviderError { .. } => StatusCode::BAD_GATEWAY,
                OrderFlowError::DecodeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                OrderFlowError::PersistenceError { source, .. } => match source {
                    e if e.is_not_found() => StatusCode::NOT_FOUND,
                    StoreError::IllegalStatusChange { .. } => StatusCode::CONFLICT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                },
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}
