//! Order book module
//!
//! Maintains per-instrument order book state from level-2 snapshot and
//! incremental update events.

mod book;
mod levels;
mod quote;
mod registry;

pub use book::{BookState, OrderBook};
pub use levels::{AskLevels, BidLevels, PriceKey, PriceLevelMap};
pub use quote::BestQuote;
pub use registry::BookRegistry;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    #[serde(alias = "offer")]
    Ask,
}

/// A single level in the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub price: Decimal,
    pub quantity: Decimal,
}
