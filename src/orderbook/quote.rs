//! Best bid/ask derived from an order book

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Level;

/// Top of book for one instrument, only built when both sides are present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestQuote {
    pub product_id: String,
    pub bid: Level,
    pub ask: Level,
}

impl BestQuote {
    /// Mid price (average of best bid and ask)
    pub fn mid_price(&self) -> Decimal {
        (self.bid.price + self.ask.price) / Decimal::from(2)
    }

    /// Spread in basis points of the mid price
    pub fn spread_bps(&self) -> Option<Decimal> {
        let mid = self.mid_price();
        if mid > Decimal::ZERO {
            Some((self.ask.price - self.bid.price) / mid * Decimal::from(10000))
        } else {
            None
        }
    }

    /// The feed mirrors the venue, so a crossed or locked book is reported, not fixed
    pub fn is_crossed(&self) -> bool {
        self.bid.price >= self.ask.price
    }
}

const PRICE_DP: u32 = 8;
const QUANTITY_DP: u32 = 6;

/// Round half away from zero; `Decimal`'s precision formatting alone truncates
fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Console line consumed by downstream tooling; keep the layout stable.
impl fmt::Display for BestQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → Best Bid: {:.8} (qty {:.6}) | Best Ask: {:.8} (qty {:.6})",
            self.product_id,
            round_half_up(self.bid.price, PRICE_DP),
            round_half_up(self.bid.quantity, QUANTITY_DP),
            round_half_up(self.ask.price, PRICE_DP),
            round_half_up(self.ask.quantity, QUANTITY_DP),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(bid: Decimal, ask: Decimal) -> BestQuote {
        BestQuote {
            product_id: "ETH-USD".to_string(),
            bid: Level {
                price: bid,
                quantity: dec!(2),
            },
            ask: Level {
                price: ask,
                quantity: dec!(3.25),
            },
        }
    }

    #[test]
    fn test_display_fixed_precision() {
        let q = quote(dec!(100), dec!(101.5));
        assert_eq!(
            q.to_string(),
            "ETH-USD → Best Bid: 100.00000000 (qty 2.000000) | Best Ask: 101.50000000 (qty 3.250000)"
        );
    }

    #[test]
    fn test_display_rounds_half_up() {
        let q = BestQuote {
            product_id: "BTC-USD".to_string(),
            bid: Level {
                price: dec!(100.123456789),
                quantity: dec!(0.1234567),
            },
            ask: Level {
                price: dec!(101.000000005),
                quantity: dec!(0.0000005),
            },
        };
        assert_eq!(
            q.to_string(),
            "BTC-USD → Best Bid: 100.12345679 (qty 0.123457) | Best Ask: 101.00000001 (qty 0.000001)"
        );
    }

    #[test]
    fn test_display_rounds_down_below_midpoint() {
        let q = quote(dec!(99.999999994), dec!(100.000000004));
        assert_eq!(
            q.to_string(),
            "ETH-USD → Best Bid: 99.99999999 (qty 2.000000) | Best Ask: 100.00000000 (qty 3.250000)"
        );
    }

    #[test]
    fn test_mid_and_spread() {
        let q = quote(dec!(100), dec!(101));
        assert_eq!(q.mid_price(), dec!(100.5));
        let spread = q.spread_bps().unwrap();
        assert!(spread > dec!(99) && spread < dec!(100));
        assert!(!q.is_crossed());
    }

    #[test]
    fn test_crossed_book_is_flagged() {
        assert!(quote(dec!(101), dec!(100)).is_crossed());
    }
}
