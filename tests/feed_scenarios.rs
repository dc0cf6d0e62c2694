//! End-to-end feed scenarios through the public API

use l2_book_feed::metrics::outcome;
use l2_book_feed::{FeedMetrics, FeedProcessor, LineSink};
use rust_decimal_macros::dec;

fn processor() -> FeedProcessor {
    FeedProcessor::new("l2_data", FeedMetrics::new().unwrap())
}

fn snapshot(product: &str, bid: (&str, &str), ask: (&str, &str)) -> String {
    format!(
        r#"{{"channel":"l2_data","events":[{{"type":"snapshot","product_id":"{}","updates":[
            {{"side":"bid","px":"{}","qty":"{}"}},
            {{"side":"offer","px":"{}","qty":"{}"}}]}}]}}"#,
        product, bid.0, bid.1, ask.0, ask.1
    )
}

fn update(product: &str, side: &str, px: &str, qty: &str) -> String {
    format!(
        r#"{{"channel":"l2_data","events":[{{"type":"update","product_id":"{}","updates":[{{"side":"{}","px":"{}","qty":"{}"}}]}}]}}"#,
        product, side, px, qty
    )
}

#[test]
fn interleaved_instruments_keep_independent_books() {
    let mut feed = processor();
    let mut sink = LineSink::new(Vec::new());

    feed.handle(&snapshot("ETH-USD", ("2500", "1"), ("2501", "2")), &mut sink);
    feed.handle(&snapshot("BTC-USD", ("43000", "0.5"), ("43001", "0.75")), &mut sink);
    feed.handle(&update("ETH-USD", "bid", "2500.5", "3"), &mut sink);
    feed.handle(&update("BTC-USD", "offer", "43001", "0"), &mut sink);
    feed.handle(&update("ETH-USD", "offer", "2500.75", "1"), &mut sink);

    let eth = feed.registry().get("ETH-USD").unwrap();
    assert_eq!(eth.best_bid().map(|l| l.price), Some(dec!(2500.5)));
    assert_eq!(eth.best_ask().map(|l| l.price), Some(dec!(2500.75)));

    let btc = feed.registry().get("BTC-USD").unwrap();
    assert_eq!(btc.best_bid().map(|l| l.price), Some(dec!(43000)));
    assert_eq!(btc.best_ask(), None);

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            "ETH-USD → Best Bid: 2500.00000000 (qty 1.000000) | Best Ask: 2501.00000000 (qty 2.000000)",
            "BTC-USD → Best Bid: 43000.00000000 (qty 0.500000) | Best Ask: 43001.00000000 (qty 0.750000)",
            "ETH-USD → Best Bid: 2500.50000000 (qty 3.000000) | Best Ask: 2501.00000000 (qty 2.000000)",
            "ETH-USD → Best Bid: 2500.50000000 (qty 3.000000) | Best Ask: 2500.75000000 (qty 1.000000)",
        ]
    );
    assert_eq!(feed.metrics().count(outcome::ONE_SIDED), 1);
}

#[test]
fn best_levels_follow_every_mutation() {
    let mut feed = processor();
    feed.process(&snapshot("ETH-USD", ("100", "1"), ("110", "1"))).unwrap();

    let steps = [
        ("bid", "105", "2", dec!(105), dec!(110)),
        ("offer", "108", "1", dec!(105), dec!(108)),
        ("bid", "105", "0", dec!(100), dec!(108)),
        ("bid", "101", "4", dec!(101), dec!(108)),
        ("ask", "108", "0", dec!(101), dec!(110)),
    ];

    for (side, px, qty, bid, ask) in steps {
        let quote = feed.process(&update("ETH-USD", side, px, qty)).unwrap().unwrap();
        assert_eq!(quote.bid.price, bid);
        assert_eq!(quote.ask.price, ask);
    }
}

#[test]
fn reconnect_discards_continuity_until_snapshot() {
    let mut feed = processor();
    feed.process(&snapshot("ETH-USD", ("100", "1"), ("101", "1"))).unwrap();
    feed.process(&snapshot("BTC-USD", ("200", "1"), ("201", "1"))).unwrap();

    feed.on_reconnect();
    assert!(feed.process(&update("ETH-USD", "bid", "100", "5")).unwrap().is_none());
    assert!(feed.quotes().is_empty());

    feed.process(&snapshot("ETH-USD", ("99", "1"), ("101", "1"))).unwrap();
    let quotes = feed.quotes();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].product_id, "ETH-USD");
    assert_eq!(quotes[0].bid.price, dec!(99));
}
