//! Level-2 order book feed handler library
//!
//! This crate reconstructs per-instrument order books from an authenticated
//! level-2 WebSocket feed and derives the best bid and ask after every update.

use std::sync::Arc;
use tokio::sync::RwLock;

pub mod config;
pub mod credentials;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod orderbook;
pub mod parser;
pub mod publisher;
pub mod signing;
pub mod sink;
pub mod websocket;

pub use config::Config;
pub use credentials::Credentials;
pub use error::{MarketDataError, Result};
pub use feed::FeedProcessor;
pub use metrics::FeedMetrics;
pub use orderbook::{BestQuote, BookRegistry, BookState, Level, OrderBook, PriceLevelMap, Side};
pub use parser::{EventKind, FeedEnvelope, FeedEvent, LevelUpdate};
pub use publisher::Publisher;
pub use signing::{SubscribeRequest, SubscriptionSigner};
pub use sink::{LineSink, QuoteSink};
pub use websocket::WebSocketManager;

/// Application state shared across components
pub struct AppState {
    pub feed: Arc<RwLock<FeedProcessor>>,
    pub publisher: Option<Arc<Publisher>>,
    pub metrics: FeedMetrics,
    pub config: Arc<Config>,
}
