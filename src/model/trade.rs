//! `ExecuteTrade` and `FillReport` — the Brain→Sniper→Shield command/outcome pair.

use super::ids::{GameId, MarketTicker};

/// A command from Brain to Sniper.
///
/// Invariant: `limit_price_cents <= 99 - MIN_EDGE_CENTS + slippage budget`
/// and `1 <= quantity <= MAX_QUANTITY` (enforced at construction by
/// [`crate::brain::edge::evaluate`]).
#[derive(Debug, Clone)]
pub struct ExecuteTrade {
    pub ticker: MarketTicker,
    pub limit_price_cents: u8,
    pub quantity: u32,
    pub signal_at: std::time::Instant,
    pub game_id: GameId,
    pub score_at_decision: (u32, u32),
}

/// Outcome from Sniper. Exactly one is published per `ExecuteTrade`.
#[derive(Debug, Clone)]
pub enum FillReport {
    Filled {
        ticker: MarketTicker,
        game_id: GameId,
        qty: u32,
        avg_price_cents: u8,
    },
    PartialFill {
        ticker: MarketTicker,
        game_id: GameId,
        qty: u32,
        avg_price_cents: u8,
    },
    Rejected {
        ticker: MarketTicker,
        game_id: GameId,
        reason: String,
    },
    Error {
        ticker: MarketTicker,
        game_id: GameId,
        reason: String,
    },
}

impl FillReport {
    pub fn game_id(&self) -> &GameId {
        match self {
            FillReport::Filled { game_id, .. }
            | FillReport::PartialFill { game_id, .. }
            | FillReport::Rejected { game_id, .. }
            | FillReport::Error { game_id, .. } => game_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FillReport::Filled { .. } | FillReport::PartialFill { .. })
    }
}
