//! Prometheus metrics for the feed handler

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::error::Result;

/// Outcome label values of `feed_messages_total`
pub mod outcome {
    pub const QUOTE: &str = "quote";
    pub const ONE_SIDED: &str = "one_sided";
    pub const IGNORED: &str = "ignored";
    pub const AWAITING_SNAPSHOT: &str = "awaiting_snapshot";
    pub const DECODE_ERROR: &str = "decode_error";
}

/// Counters and gauges owned by the running feed
#[derive(Clone)]
pub struct FeedMetrics {
    registry: Registry,
    messages: IntCounterVec,
    reconnects: IntCounter,
    books: IntGauge,
}

impl FeedMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let messages = IntCounterVec::new(
            Opts::new("feed_messages_total", "Feed messages processed, by outcome"),
            &["outcome"],
        )?;
        let reconnects = IntCounter::new("feed_reconnects_total", "Transport (re)connections")?;
        let books = IntGauge::new("feed_books", "Order books currently tracked")?;

        registry.register(Box::new(messages.clone()))?;
        registry.register(Box::new(reconnects.clone()))?;
        registry.register(Box::new(books.clone()))?;

        Ok(Self {
            registry,
            messages,
            reconnects,
            books,
        })
    }

    pub fn record(&self, outcome: &str) {
        self.messages.with_label_values(&[outcome]).inc();
    }

    pub fn count(&self, outcome: &str) -> u64 {
        self.messages.with_label_values(&[outcome]).get()
    }

    pub fn record_reconnect(&self) {
        self.reconnects.inc();
    }

    pub fn set_books(&self, count: usize) {
        self.books.set(count as i64);
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| crate::error::MarketDataError::MetricsError(e.to_string()))
    }
}

impl std::fmt::Debug for FeedMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedMetrics")
            .field("reconnects", &self.reconnects.get())
            .field("books", &self.books.get())
            .finish()
    }
}
