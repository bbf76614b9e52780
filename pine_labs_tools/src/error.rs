use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PineLabsApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not obtain an access token. {0}")]
    TokenFetchError(String),
    #[error("Could not reach the payment provider. {0}")]
    NetworkError(String),
    #[error("The payment provider rejected the request. Status {status}. {}", provider_message(.payload))]
    ProviderError { status: u16, payload: Option<Value> },
    #[error("Could not deserialize the provider response: {0}")]
    DecodeError(String),
}

/// Pulls the diagnostic message out of a provider error body, if there is one.
pub fn provider_message(payload: &Option<Value>) -> String {
    let Some(payload) = payload else {
        return "No diagnostic information was provided.".to_string();
    };
    let code = payload["code"].as_str().or_else(|| payload["error_code"].as_str());
    let message = payload["message"].as_str().or_else(|| payload["error_message"].as_str());
    match (code, message) {
        (Some(c), Some(m)) => format!("{c}: {m}"),
        (None, Some(m)) => m.to_string(),
        (Some(c), None) => c.to_string(),
        (None, None) => payload.to_string(),
    }
}
