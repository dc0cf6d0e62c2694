//! One side of the book: price levels kept in priority order.
//!
//! The map key encodes the side's ordering, so the best level is always the
//! first entry of the underlying `BTreeMap` and is reached in O(log n).

use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::Level;

/// Map key that orders prices best-first for one side
pub trait PriceKey: Ord + Copy {
    fn from_price(price: Decimal) -> Self;
    fn price(&self) -> Decimal;
}

/// Asks: lowest price first
impl PriceKey for Decimal {
    fn from_price(price: Decimal) -> Self {
        price
    }

    fn price(&self) -> Decimal {
        *self
    }
}

/// Bids: highest price first
impl PriceKey for Reverse<Decimal> {
    fn from_price(price: Decimal) -> Self {
        Reverse(price)
    }

    fn price(&self) -> Decimal {
        self.0
    }
}

/// Price → quantity map for one side. Never holds a zero quantity.
#[derive(Debug, Clone)]
pub struct PriceLevelMap<K: PriceKey> {
    levels: BTreeMap<K, Decimal>,
}

pub type BidLevels = PriceLevelMap<Reverse<Decimal>>;
pub type AskLevels = PriceLevelMap<Decimal>;

impl<K: PriceKey> Default for PriceLevelMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PriceKey> PriceLevelMap<K> {
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Set the quantity at `price`; zero removes the level.
    ///
    /// Removing an absent level is a no-op.
    pub fn apply(&mut self, price: Decimal, quantity: Decimal) {
        let key = K::from_price(price);
        if quantity.is_zero() {
            self.levels.remove(&key);
        } else {
            self.levels.insert(key, quantity);
        }
    }

    /// Best level of this side
    pub fn best(&self) -> Option<Level> {
        self.levels.first_key_value().map(|(k, q)| Level {
            price: k.price(),
            quantity: *q,
        })
    }

    /// Quantity resting at `price`
    pub fn get(&self, price: Decimal) -> Option<Decimal> {
        self.levels.get(&K::from_price(price)).copied()
    }

    /// Levels best-first
    pub fn iter(&self) -> impl Iterator<Item = Level> + '_ {
        self.levels.iter().map(|(k, q)| Level {
            price: k.price(),
            quantity: *q,
        })
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
