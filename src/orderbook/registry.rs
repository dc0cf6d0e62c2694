//! Book registry
//!
//! Owns the order books of every instrument seen on the feed.

use std::collections::HashMap;

use super::{BestQuote, OrderBook};

/// Order books keyed by instrument id, created on first reference
#[derive(Debug, Default)]
pub struct BookRegistry {
    books: HashMap<String, OrderBook>,
}

impl BookRegistry {
    pub fn new() -> Self {
        Self {
            books: HashMap::new(),
        }
    }

    /// Book for `product_id`, created empty if unseen
    pub fn get_or_create(&mut self, product_id: &str) -> &mut OrderBook {
        self.books
            .entry(product_id.to_string())
            .or_insert_with(|| OrderBook::new(product_id))
    }

    pub fn get(&self, product_id: &str) -> Option<&OrderBook> {
        self.books.get(product_id)
    }

    /// Put every book back into awaiting-snapshot
    pub fn invalidate_all(&mut self) {
        for book in self.books.values_mut() {
            book.invalidate();
        }
    }

    /// Current best quotes, sorted by instrument id
    pub fn quotes(&self) -> Vec<BestQuote> {
        let mut quotes: Vec<BestQuote> = self.books.values().filter_map(|b| b.best_quote()).collect();
        quotes.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        quotes
    }

    /// Get list of instruments being tracked
    pub fn product_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.books.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.books.contains_key(product_id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
