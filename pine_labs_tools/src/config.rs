use std::{env, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use pinepay_common::Secret;

const DEFAULT_BASE_URL: &str = "https://pluraluat.v2.pinepg.in/api";
const DEFAULT_GRANT_TYPE: &str = "client_credentials";
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::minutes(60);
const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Endpoints and client credentials for the Pine Labs API. Resolved once at start-up and handed to
/// [`crate::PineLabsApi::new`].
#[derive(Debug, Clone)]
pub struct PineLabsConfig {
    pub token_url: String,
    pub order_url: String,
    /// Order details are fetched from `{order_details_url}/{order_id}`
    pub order_details_url: String,
    /// Refunds are posted to `{refund_url}/{order_id}`
    pub refund_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub grant_type: String,
    /// The token lifetime to assume when the token endpoint does not state one.
    pub default_token_lifetime: Duration,
    pub request_timeout: StdDuration,
}

impl Default for PineLabsConfig {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, "", Secret::default())
    }
}

impl PineLabsConfig {
    /// Builds a configuration using the standard endpoint layout below `base_url`.
    pub fn with_base_url(base_url: &str, client_id: &str, client_secret: Secret<String>) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            token_url: format!("{base}/auth/v1/token"),
            order_url: format!("{base}/pay/v1/orders"),
            order_details_url: format!("{base}/pay/v1/orders"),
            refund_url: format!("{base}/pay/v1/refunds"),
            client_id: client_id.to_string(),
            client_secret,
            grant_type: DEFAULT_GRANT_TYPE.to_string(),
            default_token_lifetime: DEFAULT_TOKEN_LIFETIME,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn new_from_env_or_default() -> Self {
        let defaults = Self::default();
        let token_url = env_or("PPG_PINELABS_TOKEN_URL", defaults.token_url);
        let order_url = env_or("PPG_PINELABS_ORDER_URL", defaults.order_url);
        let order_details_url = env_or("PPG_PINELABS_ORDER_DETAILS_URL", defaults.order_details_url);
        let refund_url = env_or("PPG_PINELABS_REFUND_URL", defaults.refund_url);
        let client_id = env::var("PPG_PINELABS_CLIENT_ID").unwrap_or_else(|_| {
            error!("🪛️ PPG_PINELABS_CLIENT_ID is not set. Calls to Pine Labs will be rejected.");
            String::default()
        });
        let client_secret = Secret::new(env::var("PPG_PINELABS_CLIENT_SECRET").unwrap_or_else(|_| {
            error!("🪛️ PPG_PINELABS_CLIENT_SECRET is not set. Calls to Pine Labs will be rejected.");
            String::default()
        }));
        let grant_type = env::var("PPG_PINELABS_GRANT_TYPE").unwrap_or_else(|_| DEFAULT_GRANT_TYPE.to_string());
        let default_token_lifetime = env::var("PPG_PINELABS_TOKEN_LIFETIME")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for PPG_PINELABS_TOKEN_LIFETIME. {e}"))
                    .ok()
            })
            .map(Duration::minutes)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let request_timeout = env::var("PPG_PINELABS_REQUEST_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for PPG_PINELABS_REQUEST_TIMEOUT. {e}"))
                    .ok()
            })
            .map(StdDuration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        Self {
            token_url,
            order_url,
            order_details_url,
            refund_url,
            client_id,
            client_secret,
            grant_type,
            default_token_lifetime,
            request_timeout,
        }
    }
}

fn env_or(name: &str, default: String) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("🪛️ {name} not set, using {default} as default");
        default
    })
}
