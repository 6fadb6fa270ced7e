//! `MarketUpdate` and `OrderBook` — the orderbook wire type and cache entry.

use std::time::Instant;

use super::ids::MarketTicker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Yes,
    No,
}

/// One price level: price in integer cents, size in contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLevel {
    pub price_cents: u8,
    pub size: u32,
}

/// An orderbook delta or snapshot for one contract, as received from the
/// exchange stream.
///
/// Invariant: sequence numbers per ticker are strictly monotonic; a gap
/// forces a re-snapshot (see [`crate::watcher::reconnect`]).
#[derive(Debug, Clone)]
pub struct MarketUpdate {
    pub ticker: MarketTicker,
    pub sequence: u64,
    pub is_snapshot: bool,
    pub side: Side,
    pub levels: Vec<PriceLevel>,
}

/// Per-ticker aggregated book held in the [`crate::watcher::OrderBookCache`].
///
/// Invariant: ask prices are in `[1, 99]`; an empty book (no `yes_asks` or
/// `no_asks`) means no edge is computable for this ticker.
#[derive(Debug, Clone)]
pub struct OrderBook {
    pub ticker: MarketTicker,
    pub yes_asks: Vec<PriceLevel>,
    pub no_asks: Vec<PriceLevel>,
    pub next_sequence: u64,
    pub stale: bool,
    pub updated_at: Instant,
}

impl OrderBook {
    pub fn empty(ticker: MarketTicker) -> Self {
        Self {
            ticker,
            yes_asks: Vec::new(),
            no_asks: Vec::new(),
            next_sequence: 0,
            stale: true,
            updated_at: Instant::now(),
        }
    }

    /// Best (lowest) YES ask in cents, if the book is non-empty and fresh.
    pub fn best_yes_ask_cents(&self) -> Option<u8> {
        if self.stale {
            return None;
        }
        self.yes_asks.iter().map(|l| l.price_cents).min()
    }

    pub fn best_no_ask_cents(&self) -> Option<u8> {
        if self.stale {
            return None;
        }
        self.no_asks.iter().map(|l| l.price_cents).min()
    }

    /// Replace one side's levels with a snapshot, resetting sequence tracking.
    pub fn apply_snapshot(&mut self, side: Side, levels: Vec<PriceLevel>, sequence: u64) {
        match side {
            Side::Yes => self.yes_asks = levels,
            Side::No => self.no_asks = levels,
        }
        self.next_sequence = sequence + 1;
        self.stale = false;
        self.updated_at = Instant::now();
    }

    /// Apply a delta. Caller must have already checked `update.sequence ==
    /// self.next_sequence`; a mismatch is the caller's cue to mark stale and
    /// request a re-snapshot instead of calling this.
    pub fn apply_delta(&mut self, side: Side, levels: Vec<PriceLevel>, sequence: u64) {
        match side {
            Side::Yes => self.yes_asks = levels,
            Side::No => self.no_asks = levels,
        }
        self.next_sequence = sequence + 1;
        self.updated_at = Instant::now();
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }
}
