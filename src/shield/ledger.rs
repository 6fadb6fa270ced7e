//! `RiskLedger` — the shared handle Brain and Shield both hold onto
//! [`RiskState`]. Field-level write discipline: `open_exposure_cents`,
//! `realized_pnl_cents`, `is_halted`, and `halted_games` are mutated only
//! by [`super::Shield`]; `trades_per_game` is bumped optimistically by
//! Brain and corrected by Shield on a rejected/errored fill (spec §4.4
//! step 8, §4.6).

use std::sync::Arc;

use parking_lot::RwLock;

use crate::model::{GameId, RiskSnapshot, RiskState};

#[derive(Clone)]
pub struct RiskLedger {
    inner: Arc<RwLock<RiskState>>,
}

impl RiskLedger {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RiskState::new())),
        }
    }

    /// Hot-path read: a single consistent snapshot, no field-by-field reads.
    pub fn snapshot(&self) -> RiskSnapshot {
        self.inner.read().snapshot()
    }

    pub fn trades_this_game(&self, game_id: &GameId) -> u32 {
        self.inner.read().trades_this_game(game_id)
    }

    pub fn game_is_halted(&self, game_id: &GameId) -> bool {
        self.inner.read().game_is_halted(game_id)
    }

    pub fn halt_reason(&self) -> Option<String> {
        self.inner.read().halt_reason.clone()
    }

    /// Brain's optimistic increment before publishing an `ExecuteTrade`.
    pub fn record_optimistic_trade(&self, game_id: &GameId) {
        let mut state = self.inner.write();
        *state.trades_per_game.entry(game_id.clone()).or_insert(0) += 1;
    }

    /// Shield's correction when a fill comes back `Rejected`/`Error`.
    pub fn correct_rejected_trade(&self, game_id: &GameId) {
        let mut state = self.inner.write();
        if let Some(count) = state.trades_per_game.get_mut(game_id) {
            *count = count.saturating_sub(1);
        }
    }

    pub(super) fn write(&self) -> parking_lot::RwLockWriteGuard<'_, RiskState> {
        self.inner.write()
    }
}

impl Default for RiskLedger {
    fn default() -> Self {
        Self::new()
    }
}
