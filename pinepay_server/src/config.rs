use std::env;

use chrono::Duration;
use log::*;
use pine_labs_tools::PineLabsConfig;
use pinepay_common::parse_boolean_flag;

const DEFAULT_PPG_HOST: &str = "127.0.0.1";
const DEFAULT_PPG_PORT: u16 = 8460;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/pinepay_store.db";
const DEFAULT_ORPHAN_SWEEP_INTERVAL: Duration = Duration::minutes(15);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How often to look for transactions that have no order. `None` disables the sweep.
    pub orphan_sweep_interval: Option<Duration>,
    /// If true, a successful refund is followed by a reconciliation of the same order.
    pub reconcile_after_refund: bool,
    pub pine_labs: PineLabsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PPG_HOST.to_string(),
            port: DEFAULT_PPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            orphan_sweep_interval: Some(DEFAULT_ORPHAN_SWEEP_INTERVAL),
            reconcile_after_refund: true,
            pine_labs: PineLabsConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PPG_HOST").ok().unwrap_or_else(|| DEFAULT_PPG_HOST.into());
        let port = env::var("PPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PPG_PORT. {e} Using the default, {DEFAULT_PPG_PORT}, instead."
                    );
                    DEFAULT_PPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PPG_PORT);
        let database_url = env::var("PPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ PPG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let orphan_sweep_interval = configure_orphan_sweep(env::var("PPG_ORPHAN_SWEEP_INTERVAL").ok());
        let reconcile_after_refund = parse_boolean_flag(env::var("PPG_RECONCILE_AFTER_REFUND").ok(), true);
        let pine_labs = PineLabsConfig::new_from_env_or_default();
        Self { host, port, database_url, orphan_sweep_interval, reconcile_after_refund, pine_labs }
    }
}

fn configure_orphan_sweep(value: Option<String>) -> Option<Duration> {
    let Some(value) = value else {
        info!(
            "🪛️ PPG_ORPHAN_SWEEP_INTERVAL is not set. Using the default value of {} minutes.",
            DEFAULT_ORPHAN_SWEEP_INTERVAL.num_minutes()
        );
        return Some(DEFAULT_ORPHAN_SWEEP_INTERVAL);
    };
    match value.trim().parse::<i64>() {
        Ok(0) => {
            info!("🪛️ The orphaned transaction sweep is disabled.");
            None
        },
        Ok(m) if m > 0 => Some(Duration::minutes(m)),
        Ok(m) => {
            warn!("🪛️ PPG_ORPHAN_SWEEP_INTERVAL must not be negative, but was {m}. Using the default.");
            Some(DEFAULT_ORPHAN_SWEEP_INTERVAL)
        },
        Err(e) => {
            warn!("🪛️ Invalid configuration value for PPG_ORPHAN_SWEEP_INTERVAL. {e}. Using the default.");
            Some(DEFAULT_ORPHAN_SWEEP_INTERVAL)
        },
    }
}
