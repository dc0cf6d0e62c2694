//! Feed event processing
//!
//! Classifies raw feed messages, applies them to the owning instrument's book
//! and derives the best quote. A message is decoded completely before the
//! book is touched, so a bad entry never leaves half a batch applied.

use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::metrics::{outcome, FeedMetrics};
use crate::orderbook::{BestQuote, BookRegistry};
use crate::parser::{EventKind, FeedEnvelope};
use crate::sink::QuoteSink;

/// Applies feed messages to the books of one subscription
#[derive(Debug)]
pub struct FeedProcessor {
    channel: String,
    registry: BookRegistry,
    metrics: FeedMetrics,
}

impl FeedProcessor {
    pub fn new(channel: &str, metrics: FeedMetrics) -> Self {
        Self {
            channel: channel.to_string(),
            registry: BookRegistry::new(),
            metrics,
        }
    }

    /// Process one raw message
    ///
    /// Returns the instrument's best quote when the message was applied and
    /// both sides of its book are present.
    pub fn process(&mut self, raw: &str) -> Result<Option<BestQuote>> {
        let envelope = FeedEnvelope::parse(raw)?;

        if envelope.channel() != self.channel {
            trace!(channel = %envelope.channel(), "Ignoring message from other channel");
            self.metrics.record(outcome::IGNORED);
            return Ok(None);
        }

        let event = match envelope.first_event()? {
            Some(event) => event,
            None => {
                trace!("Ignoring message without events");
                self.metrics.record(outcome::IGNORED);
                return Ok(None);
            }
        };

        let product_id = match event.product_id() {
            Some(id) => id,
            None => {
                debug!(kind = ?event.kind, "Ignoring event without product id");
                self.metrics.record(outcome::IGNORED);
                return Ok(None);
            }
        };

        let book = self.registry.get_or_create(product_id);
        if !book.apply_event(event.kind, &event.updates) {
            debug!(
                product_id = %product_id,
                updates = event.updates.len(),
                "Dropping incremental update while awaiting snapshot"
            );
            self.metrics.record(outcome::AWAITING_SNAPSHOT);
            return Ok(None);
        }

        if event.kind == EventKind::Snapshot {
            let (bid_levels, ask_levels) = book.depth();
            debug!(
                product_id = %product_id,
                bid_levels,
                ask_levels,
                "Order book snapshot applied"
            );
        }

        let quote = book.best_quote();
        self.metrics.set_books(self.registry.len());
        self.metrics.record(if quote.is_some() {
            outcome::QUOTE
        } else {
            outcome::ONE_SIDED
        });

        Ok(quote)
    }

    /// Process one raw message and emit its quote, logging any failure
    ///
    /// Decode errors drop the message only; the next one is processed normally.
    pub fn handle(&mut self, raw: &str, sink: &mut dyn QuoteSink) -> Option<BestQuote> {
        match self.process(raw) {
            Ok(Some(quote)) => {
                if let Err(e) = sink.emit(&quote) {
                    warn!(error = %e, product_id = %quote.product_id, "Failed to emit best quote");
                }
                Some(quote)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, len = raw.len(), "Failed to process feed message");
                self.metrics.record(outcome::DECODE_ERROR);
                None
            }
        }
    }

    /// Forget book continuity after a transport reconnect
    pub fn on_reconnect(&mut self) {
        self.registry.invalidate_all();
        self.metrics.record_reconnect();
    }

    /// Current best quotes of all synced, two-sided books
    pub fn quotes(&self) -> Vec<BestQuote> {
        self.registry.quotes()
    }

    pub fn registry(&self) -> &BookRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BookRegistry {
        &mut self.registry
    }

    pub fn metrics(&self) -> &FeedMetrics {
        &self.metrics
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}
