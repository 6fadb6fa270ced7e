//! Sniper: consumes `ExecuteTrade` commands, submits orders to the
//! exchange under a per-order timeout, and publishes exactly one
//! `FillReport` per command. Grounded on the teacher's
//! `core/exchange/reconnecting.rs` breaker shape for the gating logic, and
//! `app/orchestrator`'s single-consumer-loop pattern for `run`.

mod breaker;

pub use breaker::{Breaker, CircuitState};

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::bus::{Receiver, Sender};
use crate::config::SniperConfig;
use crate::error::Result;
use crate::model::{ExecuteTrade, FillReport};

/// Outcome of a single order submission attempt, as reported by the
/// exchange transport. Distinct from [`FillReport`]: this is Sniper's
/// private view before it's stamped with the originating ticker/game.
#[derive(Debug, Clone)]
pub enum OrderOutcome {
    Filled { qty: u32, avg_price_cents: u8 },
    PartialFill { qty: u32, avg_price_cents: u8 },
    Rejected { reason: String },
}

/// Abstraction over "place this order" — the only exchange call Sniper
/// needs. A concrete implementation lives in [`crate::exchange`].
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    async fn submit(&self, trade: &ExecuteTrade) -> Result<OrderOutcome>;
}

pub struct Sniper<E: OrderExecutor> {
    executor: E,
    breaker: Breaker,
    order_timeout: Duration,
}

impl<E: OrderExecutor> Sniper<E> {
    pub fn new(executor: E, cfg: &SniperConfig) -> Self {
        Self {
            executor,
            breaker: Breaker::new(cfg),
            order_timeout: Duration::from_millis(cfg.order_timeout_ms),
        }
    }

    pub async fn run(
        mut self,
        mut execute_trades: Receiver<ExecuteTrade>,
        fill_reports: Sender<FillReport>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                trade = execute_trades.recv() => {
                    match trade {
                        Some(trade) => {
                            let report = self.handle(trade).await;
                            fill_reports.publish(report).await;
                        }
                        None => break,
                    }
                }
            }
        }
    }

    /// Spec §4.5: no retries. Exactly one `FillReport` per command, whether
    /// the breaker is open, the order times out, or the exchange responds.
    async fn handle(&mut self, trade: ExecuteTrade) -> FillReport {
        if !self.breaker.allows_attempt() {
            warn!(ticker = %trade.ticker, "sniper: breaker open, rejecting locally");
            return FillReport::Rejected {
                ticker: trade.ticker,
                game_id: trade.game_id,
                reason: "sniper_open".to_string(),
            };
        }

        let outcome = tokio::time::timeout(self.order_timeout, self.executor.submit(&trade)).await;

        match outcome {
            Ok(Ok(OrderOutcome::Filled { qty, avg_price_cents })) => {
                self.breaker.record_success();
                FillReport::Filled { ticker: trade.ticker, game_id: trade.game_id, qty, avg_price_cents }
            }
            Ok(Ok(OrderOutcome::PartialFill { qty, avg_price_cents })) => {
                self.breaker.record_success();
                FillReport::PartialFill { ticker: trade.ticker, game_id: trade.game_id, qty, avg_price_cents }
            }
            Ok(Ok(OrderOutcome::Rejected { reason })) => {
                self.breaker.record_failure();
                FillReport::Rejected { ticker: trade.ticker, game_id: trade.game_id, reason }
            }
            Ok(Err(e)) => {
                self.breaker.record_failure();
                FillReport::Error { ticker: trade.ticker, game_id: trade.game_id, reason: e.to_string() }
            }
            Err(_) => {
                self.breaker.record_failure();
                FillReport::Error {
                    ticker: trade.ticker,
                    game_id: trade.game_id,
                    reason: "order_timeout".to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GameId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn cfg() -> SniperConfig {
        SniperConfig {
            order_timeout_ms: 50,
            breaker_failure_threshold: 2,
            breaker_cooldown_ms: 30_000,
            breaker_max_cooldown_ms: 300_000,
        }
    }

    fn trade() -> ExecuteTrade {
        ExecuteTrade {
            ticker: "T1".into(),
            limit_price_cents: 80,
            quantity: 10,
            signal_at: std::time::Instant::now(),
            game_id: GameId::new("g1"),
            score_at_decision: (10, 7),
        }
    }

    struct AlwaysFills;
    #[async_trait]
    impl OrderExecutor for AlwaysFills {
        async fn submit(&self, trade: &ExecuteTrade) -> Result<OrderOutcome> {
            Ok(OrderOutcome::Filled { qty: trade.quantity, avg_price_cents: trade.limit_price_cents })
        }
    }

    struct AlwaysRejects;
    #[async_trait]
    impl OrderExecutor for AlwaysRejects {
        async fn submit(&self, _trade: &ExecuteTrade) -> Result<OrderOutcome> {
            Ok(OrderOutcome::Rejected { reason: "no_liquidity".into() })
        }
    }

    struct NeverResponds;
    #[async_trait]
    impl OrderExecutor for NeverResponds {
        async fn submit(&self, _trade: &ExecuteTrade) -> Result<OrderOutcome> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            unreachable!()
        }
    }

    struct CountingExecutor {
        calls: Arc<AtomicUsize>,
    }
    #[async_trait]
    impl OrderExecutor for CountingExecutor {
        async fn submit(&self, _trade: &ExecuteTrade) -> Result<OrderOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(OrderOutcome::Rejected { reason: "x".into() })
        }
    }

    #[tokio::test]
    async fn filled_order_produces_filled_report() {
        let mut sniper = Sniper::new(AlwaysFills, &cfg());
        let report = sniper.handle(trade()).await;
        assert!(matches!(report, FillReport::Filled { qty: 10, .. }));
    }

    #[tokio::test]
    async fn timed_out_order_produces_error_report_not_a_hang() {
        let mut sniper = Sniper::new(NeverResponds, &cfg());
        let report = sniper.handle(trade()).await;
        match report {
            FillReport::Error { reason, .. } => assert_eq!(reason, "order_timeout"),
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn breaker_trips_after_threshold_and_rejects_locally_without_calling_executor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut sniper = Sniper::new(CountingExecutor { calls: calls.clone() }, &cfg());
        sniper.handle(trade()).await; // failure 1
        sniper.handle(trade()).await; // failure 2 -> trips (threshold 2)
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let report = sniper.handle(trade()).await; // breaker open, no executor call
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match report {
            FillReport::Rejected { reason, .. } => assert_eq!(reason, "sniper_open"),
            other => panic!("expected local rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_outcome_does_not_panic_and_reports_rejected() {
        let mut sniper = Sniper::new(AlwaysRejects, &cfg());
        let report = sniper.handle(trade()).await;
        assert!(matches!(report, FillReport::Rejected { .. }));
    }
}
