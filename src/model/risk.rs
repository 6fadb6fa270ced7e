//! `RiskState` — the process-wide risk snapshot, mutated only by Shield.

use std::collections::{HashMap, HashSet};

use super::ids::GameId;

/// A point-in-time, `Copy`-able view of risk state, safe to read off the hot
/// path under a short-lived read lock (see [`crate::shield::Shield`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskSnapshot {
    pub realized_pnl_cents: i64,
    pub open_exposure_cents: i64,
    pub is_halted: bool,
}

/// Full risk ledger. Single writer (Shield); [`RiskSnapshot`] is the
/// hot-path read surface for Brain.
#[derive(Debug, Clone)]
pub struct RiskState {
    pub realized_pnl_cents: i64,
    pub open_exposure_cents: i64,
    pub is_halted: bool,
    pub halt_reason: Option<String>,
    pub trades_per_game: HashMap<GameId, u32>,
    pub halted_games: HashSet<GameId>,
}

impl RiskState {
    pub fn new() -> Self {
        Self {
            realized_pnl_cents: 0,
            open_exposure_cents: 0,
            is_halted: false,
            halt_reason: None,
            trades_per_game: HashMap::new(),
            halted_games: HashSet::new(),
        }
    }

    pub fn snapshot(&self) -> RiskSnapshot {
        RiskSnapshot {
            realized_pnl_cents: self.realized_pnl_cents,
            open_exposure_cents: self.open_exposure_cents,
            is_halted: self.is_halted,
        }
    }

    pub fn trades_this_game(&self, game_id: &GameId) -> u32 {
        self.trades_per_game.get(game_id).copied().unwrap_or(0)
    }

    pub fn game_is_halted(&self, game_id: &GameId) -> bool {
        self.is_halted || self.halted_games.contains(game_id)
    }
}

impl Default for RiskState {
    fn default() -> Self {
        Self::new()
    }
}
