//! Configuration module for the feed handler

use std::env;
use std::str::FromStr;

use crate::credentials::Credentials;
use crate::error::{MarketDataError, Result};

pub const DEFAULT_WS_ENDPOINT: &str = "wss://ws-feed.prime.coinbase.com";
pub const DEFAULT_CHANNEL: &str = "l2_data";
pub const DEFAULT_PRODUCT_IDS: &str = "ETH-USD,BTC-USD";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Instruments to subscribe to (e.g., ["ETH-USD", "BTC-USD"])
    pub product_ids: Vec<String>,

    /// WebSocket feed endpoint
    pub ws_endpoint: String,

    /// Market data channel to subscribe to and accept messages from
    pub channel: String,

    /// IPC socket path for publishing quotes, disabled when unset
    pub ipc_socket_path: Option<String>,

    /// Reconnection settings; zero attempts means retry forever
    pub reconnect_delay_ms: u64,
    pub max_reconnect_attempts: u32,

    /// Port of the health/metrics HTTP server
    pub health_port: u16,

    /// Book status logging interval in seconds
    pub status_interval_secs: u64,

    /// Subscription credentials
    pub credentials: Credentials,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Credentials::from_lookup(&lookup)?;

        let product_ids = parse_product_ids(
            &lookup("PRODUCT_IDS").unwrap_or_else(|| DEFAULT_PRODUCT_IDS.to_string()),
        );
        if product_ids.is_empty() {
            return Err(MarketDataError::ConfigError(
                "PRODUCT_IDS must name at least one instrument".to_string(),
            ));
        }

        Ok(Self {
            product_ids,
            ws_endpoint: lookup("WS_ENDPOINT").unwrap_or_else(|| DEFAULT_WS_ENDPOINT.to_string()),
            channel: lookup("CHANNEL").unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
            ipc_socket_path: lookup("IPC_SOCKET_PATH").filter(|p| !p.is_empty()),
            reconnect_delay_ms: parse_or(&lookup, "RECONNECT_DELAY_MS", 1000)?,
            max_reconnect_attempts: parse_or(&lookup, "MAX_RECONNECT_ATTEMPTS", 0)?,
            health_port: parse_or(&lookup, "HEALTH_PORT", 9090)?,
            status_interval_secs: parse_or(&lookup, "STATUS_INTERVAL_SECS", 30)?,
            credentials,
        })
    }
}

fn parse_product_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|e| {
            MarketDataError::ConfigError(format!("Invalid value for {}: {} ({})", name, raw, e))
        }),
        _ => Ok(default),
    }
}
