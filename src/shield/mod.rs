//! Shield: the risk circuit breaker. Consumes `FillReport`, maintains
//! exposure/P&L/per-game trade-count limits, and is the sole writer of
//! `is_halted` / `halted_games` / `realized_pnl_cents` / `open_exposure_cents`.
//!
//! Grounded on the teacher's `application/risk/manager.rs`: same
//! ordered-checks shape (here: evaluate after each ledger mutation rather
//! than gate-then-reserve, since Shield reacts to fills instead of vetting
//! opportunities), same single-lock-one-snapshot discipline.

mod ledger;

pub use ledger::RiskLedger;

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::bus::Receiver;
use crate::model::{FillReport, GameId, MarketTicker};

#[derive(Debug, Clone, Error)]
pub enum RiskError {
    #[error("halted: {reason}")]
    Halted { reason: String },
    #[error("game {game_id} halted: per-game trade limit reached")]
    GameHalted { game_id: GameId },
}

/// Brain's risk gate (spec §4.4 steps 1-2): read-only, never mutates.
pub fn risk_gate(ledger: &RiskLedger, game_id: &GameId) -> Result<(), RiskError> {
    if ledger.game_is_halted(game_id) {
        let reason = ledger
            .halt_reason()
            .unwrap_or_else(|| "per-game trade limit".to_string());
        return Err(if ledger.snapshot().is_halted {
            RiskError::Halted { reason }
        } else {
            RiskError::GameHalted { game_id: game_id.clone() }
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct CostBasisEntry {
    qty: u32,
    avg_price_cents: u8,
}

pub struct Shield {
    ledger: RiskLedger,
    max_daily_loss_cents: i64,
    max_open_exposure_cents: i64,
    max_trades_per_game: u32,
    cost_basis: HashMap<(GameId, MarketTicker), CostBasisEntry>,
}

impl Shield {
    pub fn new(
        ledger: RiskLedger,
        max_daily_loss_cents: i64,
        max_open_exposure_cents: i64,
        max_trades_per_game: u32,
    ) -> Self {
        Self {
            ledger,
            max_daily_loss_cents,
            max_open_exposure_cents,
            max_trades_per_game,
            cost_basis: HashMap::new(),
        }
    }

    pub async fn run(mut self, mut fill_reports: Receiver<FillReport>, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                report = fill_reports.recv() => {
                    match report {
                        Some(report) => self.handle(report),
                        None => break,
                    }
                }
            }
        }
    }

    fn handle(&mut self, report: FillReport) {
        match report {
            FillReport::Filled { ticker, game_id, qty, avg_price_cents }
            | FillReport::PartialFill { ticker, game_id, qty, avg_price_cents } => {
                self.record_fill(game_id, ticker, qty, avg_price_cents);
            }
            FillReport::Rejected { game_id, .. } | FillReport::Error { game_id, .. } => {
                self.ledger.correct_rejected_trade(&game_id);
            }
        }
        self.evaluate_limits();
    }

    /// Mark-to-market on fill: bump open exposure and record a cost-basis
    /// entry. Realized P&L is only touched at settlement (see
    /// [`Self::mark_settled`]) — see DESIGN.md's resolution of the §9 open
    /// question on P&L realization timing.
    fn record_fill(&mut self, game_id: GameId, ticker: MarketTicker, qty: u32, avg_price_cents: u8) {
        {
            let mut state = self.ledger.write();
            state.open_exposure_cents += qty as i64 * avg_price_cents as i64;
        }
        self.cost_basis
            .entry((game_id, ticker))
            .and_modify(|e| {
                let total_qty = e.qty + qty;
                e.avg_price_cents = (((e.avg_price_cents as u32 * e.qty) + (avg_price_cents as u32 * qty))
                    / total_qty.max(1)) as u8;
                e.qty = total_qty;
            })
            .or_insert(CostBasisEntry { qty, avg_price_cents });
    }

    /// Reconcile one resolved contract: release its exposure and realize
    /// its P&L (net payout if it won, zero if it lost — the premium paid
    /// is already reflected in `open_exposure_cents`).
    pub fn mark_settled(&mut self, game_id: &GameId, ticker: &MarketTicker, won: bool) {
        let Some(entry) = self.cost_basis.remove(&(game_id.clone(), ticker.clone())) else {
            return;
        };
        let cost = entry.qty as i64 * entry.avg_price_cents as i64;
        let payout = if won {
            entry.qty as i64 * crate::model::NET_PAYOUT_CENTS as i64
        } else {
            0
        };
        let mut state = self.ledger.write();
        state.open_exposure_cents -= cost;
        state.realized_pnl_cents += payout - cost;
        drop(state);
        self.evaluate_limits();
    }

    fn evaluate_limits(&self) {
        let mut state = self.ledger.write();

        if state.realized_pnl_cents <= -self.max_daily_loss_cents && !state.is_halted {
            state.is_halted = true;
            state.halt_reason = Some("daily_loss".to_string());
            warn!(pnl = state.realized_pnl_cents, "shield halting: daily loss limit breached");
        }

        if state.open_exposure_cents > self.max_open_exposure_cents && !state.is_halted {
            state.is_halted = true;
            state.halt_reason = Some("exposure".to_string());
            warn!(exposure = state.open_exposure_cents, "shield halting: exposure limit breached");
        }

        let breaches: Vec<GameId> = state
            .trades_per_game
            .iter()
            .filter(|(_, &count)| count >= self.max_trades_per_game)
            .map(|(g, _)| g.clone())
            .collect();
        for game_id in breaches {
            if state.halted_games.insert(game_id.clone()) {
                info!(%game_id, "shield halting game: per-game trade limit reached");
            }
        }
    }

    /// Sticky reset: the only way to clear a global halt (spec §9: "the
    /// default is sticky-until-manual-reset").
    pub fn reset_halt(&mut self) {
        let mut state = self.ledger.write();
        state.is_halted = false;
        state.halt_reason = None;
    }

    pub fn ledger(&self) -> RiskLedger {
        self.ledger.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shield() -> Shield {
        Shield::new(RiskLedger::new(), 10_000, 50_000, 8)
    }

    #[test]
    fn filled_report_increases_exposure() {
        let mut shield = shield();
        shield.handle(FillReport::Filled {
            ticker: MarketTicker::new("T1"),
            game_id: GameId::new("g1"),
            qty: 10,
            avg_price_cents: 80,
        });
        assert_eq!(shield.ledger.snapshot().open_exposure_cents, 800);
    }

    #[test]
    fn rejected_report_corrects_optimistic_trade_count() {
        let mut shield = shield();
        let game_id = GameId::new("g1");
        shield.ledger.record_optimistic_trade(&game_id);
        shield.ledger.record_optimistic_trade(&game_id);
        shield.handle(FillReport::Rejected { ticker: MarketTicker::new("T1"), game_id: game_id.clone(), reason: "x".into() });
        assert_eq!(shield.ledger.trades_this_game(&game_id), 1);
    }

    #[test]
    fn halts_on_daily_loss_breach() {
        let mut shield = shield();
        let game_id = GameId::new("g1");
        let ticker = MarketTicker::new("T1");
        shield.record_fill(game_id.clone(), ticker.clone(), 200, 90);
        shield.mark_settled(&game_id, &ticker, false); // lose the whole 18000-cent stake
        assert!(shield.ledger.snapshot().is_halted);
        assert_eq!(shield.ledger.halt_reason(), Some("daily_loss".to_string()));
    }

    #[test]
    fn halt_blocks_trades_until_manual_reset() {
        let mut shield = shield();
        let game_id = GameId::new("g1");
        let ticker = MarketTicker::new("T1");
        shield.record_fill(game_id.clone(), ticker.clone(), 200, 90);
        shield.mark_settled(&game_id, &ticker, false);
        assert!(risk_gate(&shield.ledger, &game_id).is_err());
        shield.reset_halt();
        assert!(risk_gate(&shield.ledger, &game_id).is_ok());
    }

    #[test]
    fn exposure_breach_halts_independently_of_pnl() {
        let mut shield = Shield::new(RiskLedger::new(), 1_000_000, 500, 8);
        shield.handle(FillReport::Filled {
            ticker: MarketTicker::new("T1"),
            game_id: GameId::new("g1"),
            qty: 10,
            avg_price_cents: 80,
        });
        assert!(shield.ledger.snapshot().is_halted);
        assert_eq!(shield.ledger.halt_reason(), Some("exposure".to_string()));
    }

    #[test]
    fn per_game_trade_limit_halts_only_that_game() {
        let mut shield = Shield::new(RiskLedger::new(), 1_000_000, 1_000_000, 2);
        let g1 = GameId::new("g1");
        let g2 = GameId::new("g2");
        shield.ledger.record_optimistic_trade(&g1);
        shield.ledger.record_optimistic_trade(&g1);
        shield.evaluate_limits();
        assert!(shield.ledger.game_is_halted(&g1));
        assert!(!shield.ledger.game_is_halted(&g2));
    }
}
