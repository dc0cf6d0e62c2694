//! Core order book implementation
//!
//! Uses BTreeMap-backed price level maps for efficient sorted price level management.

use rust_decimal::Decimal;
use serde::Serialize;

use super::{AskLevels, BestQuote, BidLevels, Level, Side};
use crate::parser::{EventKind, LevelUpdate};

/// Whether the book content can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookState {
    /// No snapshot since creation or since the last reconnect
    AwaitingSnapshot,
    /// A snapshot has been applied and incrementals build on it
    Synced,
}

/// Order book for a single instrument
#[derive(Debug)]
pub struct OrderBook {
    product_id: String,
    /// Bids sorted by price descending (highest first)
    bids: BidLevels,
    /// Asks sorted by price ascending (lowest first)
    asks: AskLevels,
    state: BookState,
    /// Number of level updates applied since creation
    updates_applied: u64,
}

impl OrderBook {
    /// Create a new empty order book, awaiting its first snapshot
    pub fn new(product_id: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
            bids: BidLevels::new(),
            asks: AskLevels::new(),
            state: BookState::AwaitingSnapshot,
            updates_applied: 0,
        }
    }

    /// Empty both sides ahead of a snapshot batch
    pub fn reset(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.state = BookState::Synced;
    }

    /// Mark the content as stale until the next snapshot
    pub fn invalidate(&mut self) {
        self.state = BookState::AwaitingSnapshot;
    }

    /// Update a single price level; zero quantity removes it
    pub fn apply_update(&mut self, side: Side, price: Decimal, quantity: Decimal) {
        match side {
            Side::Bid => self.bids.apply(price, quantity),
            Side::Ask => self.asks.apply(price, quantity),
        }
        self.updates_applied += 1;
    }

    /// Apply one feed event
    ///
    /// Returns false if an incremental batch was rejected because the book
    /// has no snapshot to build on.
    pub fn apply_event(&mut self, kind: EventKind, updates: &[LevelUpdate]) -> bool {
        match kind {
            EventKind::Snapshot => self.reset(),
            EventKind::Update if self.state == BookState::AwaitingSnapshot => return false,
            EventKind::Update => {}
        }

        for update in updates {
            self.apply_update(update.side, update.price, update.quantity);
        }

        true
    }

    /// Get best bid level
    pub fn best_bid(&self) -> Option<Level> {
        self.bids.best()
    }

    /// Get best ask level
    pub fn best_ask(&self) -> Option<Level> {
        self.asks.best()
    }

    /// Best bid and ask, only when the book is synced and both sides are present
    pub fn best_quote(&self) -> Option<BestQuote> {
        if self.state != BookState::Synced {
            return None;
        }

        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(BestQuote {
                product_id: self.product_id.clone(),
                bid,
                ask,
            }),
            _ => None,
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn state(&self) -> BookState {
        self.state
    }

    pub fn is_synced(&self) -> bool {
        self.state == BookState::Synced
    }

    pub fn bids(&self) -> &BidLevels {
        &self.bids
    }

    pub fn asks(&self) -> &AskLevels {
        &self.asks
    }

    /// Number of (bid, ask) levels
    pub fn depth(&self) -> (usize, usize) {
        (self.bids.len(), self.asks.len())
    }

    pub fn updates_applied(&self) -> u64 {
        self.updates_applied
    }
}
