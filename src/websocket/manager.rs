//! WebSocket connection manager
//!
//! Handles reconnection logic and message dispatch.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout};
use tracing::{error, info, warn};

use super::WebSocketClient;
use crate::error::{MarketDataError, Result};
use crate::signing::SubscribeRequest;
use crate::sink::{LineSink, QuoteSink};
use crate::AppState;

/// Maximum backoff delay in milliseconds (60 seconds)
const MAX_BACKOFF_MS: u64 = 60_000;
/// Cooldown period after which reconnect attempts are reset (5 minutes)
const RECONNECT_COOLDOWN_SECS: u64 = 300;
/// Send a keepalive ping after this much silence
const KEEPALIVE_SECS: u64 = 30;
/// Treat the connection as stale after this much silence
const RECV_TIMEOUT_SECS: u64 = 45;

/// Delay before reconnect attempt `attempt` (1-based)
pub fn backoff_delay(base_delay_ms: u64, attempt: u32) -> Duration {
    let base_delay = base_delay_ms.saturating_mul(2u64.pow(attempt.min(6)));
    Duration::from_millis(base_delay.min(MAX_BACKOFF_MS))
}

/// Manages WebSocket connections with automatic reconnection
pub struct WebSocketManager {
    state: Arc<AppState>,
    client: WebSocketClient,
    sink: Box<dyn QuoteSink + Send>,
    reconnect_attempts: u32,
    last_successful_connection: Option<Instant>,
}

impl WebSocketManager {
    /// Create a new WebSocket manager printing quotes to stdout
    pub fn new(state: Arc<AppState>) -> Self {
        Self::with_sink(state, Box::new(LineSink::stdout()))
    }

    pub fn with_sink(state: Arc<AppState>, sink: Box<dyn QuoteSink + Send>) -> Self {
        let client = WebSocketClient::new(&state.config.ws_endpoint);

        Self {
            state,
            client,
            sink,
            reconnect_attempts: 0,
            last_successful_connection: None,
        }
    }

    /// Run the WebSocket manager until the reconnect budget is exhausted
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting WebSocket manager");

        let status_task = self.spawn_status_logger();
        let result = self.run_connections().await;
        status_task.abort();
        result
    }

    async fn run_connections(&mut self) -> Result<()> {
        let max_attempts = self.state.config.max_reconnect_attempts;

        loop {
            // Reset reconnect attempts if we've been stable for a while
            if let Some(last_success) = self.last_successful_connection {
                if last_success.elapsed() > Duration::from_secs(RECONNECT_COOLDOWN_SECS)
                    && self.reconnect_attempts > 0
                {
                    info!(
                        previous_attempts = self.reconnect_attempts,
                        "Resetting reconnect counter after cooldown period"
                    );
                    self.reconnect_attempts = 0;
                }
            }

            match self.connect_and_process().await {
                Ok(never) => match never {},
                Err(e @ (MarketDataError::SigningError(_) | MarketDataError::SerializationError(_))) => {
                    error!(error = %e, "Cannot build subscription, giving up");
                    return Err(e);
                }
                Err(e) => {
                    error!(error = %e, "WebSocket error");
                    self.client.close().await;
                    self.reconnect_attempts += 1;

                    if max_attempts > 0 && self.reconnect_attempts > max_attempts {
                        return Err(MarketDataError::MaxReconnectAttemptsExceeded);
                    }

                    let delay = backoff_delay(self.state.config.reconnect_delay_ms, self.reconnect_attempts);
                    warn!(
                        attempt = self.reconnect_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Reconnecting after error..."
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Connect, subscribe and process messages until the connection fails
    async fn connect_and_process(&mut self) -> Result<Infallible> {
        self.client.connect().await?;

        // Nothing seen before this connection can be trusted
        {
            let mut feed = self.state.feed.write().await;
            feed.on_reconnect();
        }
        info!("Order books awaiting fresh snapshots");

        let config = &self.state.config;
        let request = SubscribeRequest::new(
            &config.credentials,
            &config.channel,
            &config.product_ids,
            chrono::Utc::now().timestamp(),
        )?;
        self.client.subscribe(&request).await?;

        self.last_successful_connection = Some(Instant::now());
        self.reconnect_attempts = 0;
        info!("WebSocket connected successfully, resetting reconnect counter");

        let mut last_message = Instant::now();
        let keepalive_timeout = Duration::from_secs(KEEPALIVE_SECS);
        let recv_timeout = Duration::from_secs(RECV_TIMEOUT_SECS);

        loop {
            match timeout(recv_timeout, self.client.recv()).await {
                Ok(Ok(Some(text))) => {
                    last_message = Instant::now();
                    if let Err(e) = self.process_message(&text).await {
                        if !e.is_recoverable() {
                            return Err(e);
                        }
                        warn!(error = %e, "Failed to publish best quote");
                    }
                }
                Ok(Ok(None)) => {
                    if last_message.elapsed() > keepalive_timeout {
                        if let Err(e) = self.client.ping().await {
                            warn!(error = %e, "Failed to send keepalive ping");
                        }
                    }
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    warn!(
                        last_message_secs = last_message.elapsed().as_secs(),
                        "No message received within timeout, sending keepalive"
                    );
                    if let Err(e) = self.client.ping().await {
                        warn!(error = %e, "Failed to send keepalive ping, reconnecting");
                        return Err(MarketDataError::ConnectionTimeout);
                    }
                }
            }
        }
    }

    /// Process a single WebSocket message
    async fn process_message(&mut self, raw: &str) -> Result<()> {
        // The whole event is applied under one write lock, readers never see half of it
        let quote = {
            let mut feed = self.state.feed.write().await;
            feed.handle(raw, self.sink.as_mut())
        };

        if let (Some(quote), Some(publisher)) = (quote, self.state.publisher.as_ref()) {
            publisher.publish(&quote).await?;
        }

        Ok(())
    }

    /// Periodically log the top of every book
    fn spawn_status_logger(&self) -> JoinHandle<()> {
        let state = self.state.clone();
        let period = Duration::from_secs(state.config.status_interval_secs.max(1));

        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                let quotes = state.feed.read().await.quotes();
                for quote in quotes {
                    info!(
                        product_id = %quote.product_id,
                        best_bid = %quote.bid.price,
                        best_ask = %quote.ask.price,
                        mid_price = %quote.mid_price(),
                        spread_bps = ?quote.spread_bps(),
                        crossed = quote.is_crossed(),
                        "Order book status"
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(1000, 1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(1000, 2), Duration::from_millis(4000));
        assert_eq!(backoff_delay(1000, 5), Duration::from_millis(32_000));
        assert_eq!(backoff_delay(1000, 6), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_delay(1000, 40), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_delay(u64::MAX, 3), Duration::from_millis(MAX_BACKOFF_MS));
    }
}
