//! The stream transport seam Watcher consumes. A concrete implementation
//! lives in [`crate::exchange`]; [`crate::testkit`] provides scripted
//! doubles for tests.
//!
//! Trait shape grounded on the teacher's `MarketDataStream`
//! (`core/exchange/polymarket/websocket.rs`'s `DataStream` impl).

use async_trait::async_trait;

use crate::error::Result;
use crate::model::MarketTicker;

#[derive(Debug, Clone)]
pub enum MarketEvent {
    Snapshot(crate::model::MarketUpdate),
    Delta(crate::model::MarketUpdate),
    Disconnected { reason: String },
}

#[async_trait]
pub trait OrderBookStream: Send {
    async fn connect(&mut self) -> Result<()>;
    async fn subscribe(&mut self, tickers: &[MarketTicker]) -> Result<()>;
    async fn next_event(&mut self) -> Option<MarketEvent>;
    fn exchange_name(&self) -> &'static str;
}
