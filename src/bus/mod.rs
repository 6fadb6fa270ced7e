//! The event bus: a bundle of independent, named, typed, bounded channels
//! with per-channel overflow policies.
//!
//! Bounded channels with drop semantics, rather than an unbounded queue:
//! the arbitrage window is hundreds of milliseconds, so a `GameEvent`
//! queued behind five older ones is worthless, and backpressure into the
//! score poller would stall every game at once.

mod channel;

pub use channel::{Channel, OverflowPolicy, PublishOutcome, Receiver, Sender};

use crate::model::{ExecuteTrade, FillReport, GameEvent};

const GAME_EVENT_CAPACITY: usize = 256;
const EXECUTE_TRADE_CAPACITY: usize = 128;
const FILL_REPORT_CAPACITY: usize = 128;

/// The three inter-agent channels. `MarketUpdate` is intentionally absent:
/// per spec it is applied straight into the orderbook cache by Watcher and
/// is never queued to Brain.
pub struct EventBus {
    game_events: Channel<GameEvent>,
    execute_trades: Channel<ExecuteTrade>,
    fill_reports: Channel<FillReport>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            game_events: Channel::new("game_events", GAME_EVENT_CAPACITY, OverflowPolicy::DropOldest),
            execute_trades: Channel::new("execute_trades", EXECUTE_TRADE_CAPACITY, OverflowPolicy::Block),
            fill_reports: Channel::new("fill_reports", FILL_REPORT_CAPACITY, OverflowPolicy::Block),
        }
    }

    pub fn game_events_sender(&self) -> Sender<GameEvent> {
        self.game_events.sender()
    }

    pub fn game_events_receiver(&self) -> Receiver<GameEvent> {
        self.game_events.receiver()
    }

    pub fn execute_trades_sender(&self) -> Sender<ExecuteTrade> {
        self.execute_trades.sender()
    }

    pub fn execute_trades_receiver(&self) -> Receiver<ExecuteTrade> {
        self.execute_trades.receiver()
    }

    pub fn fill_reports_sender(&self) -> Sender<FillReport> {
        self.fill_reports.sender()
    }

    pub fn fill_reports_receiver(&self) -> Receiver<FillReport> {
        self.fill_reports.receiver()
    }

    /// Close every channel: stop accepting new game events, let
    /// in-flight trades/fills drain, then have consumers exit.
    pub fn close(&self) {
        self.game_events.close();
        self.execute_trades.close();
        self.fill_reports.close();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
