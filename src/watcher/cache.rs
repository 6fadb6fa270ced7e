//! The orderbook cache: single writer (Watcher), single reader (Brain).
//!
//! Grounded directly on the teacher's `core/cache/order_book.rs`
//! `OrderBookCache` — same `RwLock<HashMap<..>>` shape, same per-ticker
//! atomicity, generalized from token ids to market tickers and from a
//! generic `OrderBook` to this crate's cents-denominated one plus explicit
//! sequence-gap tracking.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::model::{MarketTicker, MarketUpdate, OrderBook};

/// Outcome of applying one [`MarketUpdate`] to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Applied in sequence; book is fresh.
    Applied,
    /// A snapshot was applied, resetting sequence tracking.
    Snapshotted,
    /// The update's sequence didn't match the book's expected next
    /// sequence; the ticker is now marked stale and a re-snapshot should
    /// be requested.
    GapDetected,
}

pub struct OrderBookCache {
    books: RwLock<HashMap<MarketTicker, OrderBook>>,
}

impl OrderBookCache {
    pub fn new() -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
        }
    }

    /// Apply one update, handling snapshot-vs-delta and sequence-gap
    /// detection per spec §4.3. Creates an (initially stale) entry for
    /// tickers seen for the first time.
    pub fn apply(&self, update: MarketUpdate) -> ApplyOutcome {
        let mut books = self.books.write();
        let book = books
            .entry(update.ticker.clone())
            .or_insert_with(|| OrderBook::empty(update.ticker.clone()));

        if update.is_snapshot {
            book.apply_snapshot(update.side, update.levels, update.sequence);
            return ApplyOutcome::Snapshotted;
        }

        if update.sequence != book.next_sequence {
            book.mark_stale();
            return ApplyOutcome::GapDetected;
        }

        book.apply_delta(update.side, update.levels, update.sequence);
        ApplyOutcome::Applied
    }

    /// Mark every book belonging to `tickers` stale — called on reconnect,
    /// before re-subscription snapshots have arrived.
    pub fn mark_stale(&self, tickers: &[MarketTicker]) {
        let mut books = self.books.write();
        for ticker in tickers {
            if let Some(book) = books.get_mut(ticker) {
                book.mark_stale();
            }
        }
    }

    pub fn get(&self, ticker: &MarketTicker) -> Option<OrderBook> {
        self.books.read().get(ticker).cloned()
    }

    pub fn get_many(&self, tickers: &[MarketTicker]) -> Vec<Option<OrderBook>> {
        let books = self.books.read();
        tickers.iter().map(|t| books.get(t).cloned()).collect()
    }

    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OrderBookCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PriceLevel, Side};

    fn update(ticker: &str, seq: u64, snapshot: bool, price: u8) -> MarketUpdate {
        MarketUpdate {
            ticker: MarketTicker::new(ticker),
            sequence: seq,
            is_snapshot: snapshot,
            side: Side::Yes,
            levels: vec![PriceLevel { price_cents: price, size: 10 }],
        }
    }

    #[test]
    fn snapshot_then_in_order_deltas_apply_cleanly() {
        let cache = OrderBookCache::new();
        assert_eq!(cache.apply(update("T1", 4, true, 80)), ApplyOutcome::Snapshotted);
        assert_eq!(cache.apply(update("T1", 5, false, 79)), ApplyOutcome::Applied);
        let book = cache.get(&MarketTicker::new("T1")).unwrap();
        assert_eq!(book.best_yes_ask_cents(), Some(79));
    }

    #[test]
    fn sequence_gap_marks_stale() {
        let cache = OrderBookCache::new();
        cache.apply(update("T1", 4, true, 80));
        cache.apply(update("T1", 5, false, 79));
        let outcome = cache.apply(update("T1", 7, false, 60));
        assert_eq!(outcome, ApplyOutcome::GapDetected);
        let book = cache.get(&MarketTicker::new("T1")).unwrap();
        assert!(book.stale);
        assert_eq!(book.best_yes_ask_cents(), None);
    }

    #[test]
    fn missing_ticker_reads_as_none() {
        let cache = OrderBookCache::new();
        assert!(cache.get(&MarketTicker::new("nope")).is_none());
    }
}
