//! Mock [`OrderBookStream`] implementation for testing. Grounded on the
//! teacher's `testkit::stream::ScriptedStream`: pre-loaded connect/subscribe
//! results plus a fixed event queue, adapted from `MarketDataStream` to
//! this crate's `OrderBookStream` seam.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::MarketTicker;
use crate::watcher::{MarketEvent, OrderBookStream};

/// A mock stream with scripted connect/subscribe results and a fixed event queue.
///
/// Each call to `connect()` or `subscribe()` pops the next result from the
/// corresponding queue (defaults to `Ok(())` when exhausted).
pub struct ScriptedStream {
    connect_results: VecDeque<Result<()>>,
    subscribe_results: VecDeque<Result<()>>,
    events: VecDeque<Option<MarketEvent>>,
    connect_count: Arc<AtomicU32>,
    subscribe_count: Arc<AtomicU32>,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self {
            connect_results: VecDeque::new(),
            subscribe_results: VecDeque::new(),
            events: VecDeque::new(),
            connect_count: Arc::new(AtomicU32::new(0)),
            subscribe_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connect_results = results.into();
        self
    }

    pub fn with_subscribe_results(mut self, results: Vec<Result<()>>) -> Self {
        self.subscribe_results = results.into();
        self
    }

    pub fn with_events(mut self, events: Vec<Option<MarketEvent>>) -> Self {
        self.events = events.into();
        self
    }

    pub fn connect_count(&self) -> u32 {
        self.connect_count.load(Ordering::SeqCst)
    }

    pub fn subscribe_count(&self) -> u32 {
        self.subscribe_count.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedStream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderBookStream for ScriptedStream {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        self.connect_results.pop_front().unwrap_or(Ok(()))
    }

    async fn subscribe(&mut self, _tickers: &[MarketTicker]) -> Result<()> {
        self.subscribe_count.fetch_add(1, Ordering::SeqCst);
        self.subscribe_results.pop_front().unwrap_or(Ok(()))
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        self.events.pop_front().flatten()
    }

    fn exchange_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MarketUpdate, PriceLevel, Side};

    fn update(ticker: &str, seq: u64) -> MarketUpdate {
        MarketUpdate {
            ticker: ticker.to_string().into(),
            sequence: seq,
            is_snapshot: true,
            side: Side::Yes,
            levels: vec![PriceLevel { price_cents: 50, size: 10 }],
        }
    }

    #[tokio::test]
    async fn replays_scripted_events_in_order() {
        let mut stream = ScriptedStream::new().with_events(vec![
            Some(MarketEvent::Snapshot(update("NFLTOT-24DEC01-T45", 1))),
            None,
        ]);
        assert!(matches!(stream.next_event().await, Some(MarketEvent::Snapshot(_))));
        assert!(stream.next_event().await.is_none());
    }

    #[tokio::test]
    async fn connect_results_are_consumed_in_order_then_default_ok() {
        let mut stream = ScriptedStream::new()
            .with_connect_results(vec![Err(crate::error::Error::Transport("boom".into())), Ok(())]);
        assert!(stream.connect().await.is_err());
        assert!(stream.connect().await.is_ok());
        assert!(stream.connect().await.is_ok());
        assert_eq!(stream.connect_count(), 3);
    }
}
