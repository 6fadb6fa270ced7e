//! Pure domain types shared across every agent: events, the orderbook, the
//! trade command/outcome pair, risk state, and the per-game threshold map.
//!
//! These are plain data types with no I/O — every agent module depends on
//! `model`, never the reverse.

mod game_event;
mod ids;
mod order_book;
mod risk;
mod threshold;
mod trade;

pub use game_event::{GameEvent, GameStatus, RawGameRecord};
pub use ids::{GameId, MarketTicker, SportTag};
pub use order_book::{MarketUpdate, OrderBook, PriceLevel, Side};
pub use risk::{RiskSnapshot, RiskState};
pub use threshold::{ThresholdEntry, ThresholdMap};
pub use trade::{ExecuteTrade, FillReport};

/// Net settlement value of a winning YES contract after exchange fees, in
/// cents out of 100. Deterministic by the fee schedule — see spec §1.
pub const NET_PAYOUT_CENTS: u8 = 93;
