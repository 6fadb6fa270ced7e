//! Brain: matches score events to alt-total contracts and evaluates the
//! fee-aware edge (spec §4.4).

pub mod edge;
pub mod resolver;
pub mod ticker;
pub mod threshold_map;

pub use threshold_map::{MarketLister, ThresholdMapBuilder};

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::bus::{Receiver, Sender};
use crate::config::{EdgeConfig, RiskLimitsConfig};
use crate::model::{ExecuteTrade, GameEvent, GameId, ThresholdMap};
use crate::shield::{risk_gate, RiskLedger};
use crate::watcher::{OrderBookCache, WatcherHandle};

pub struct Brain<L: MarketLister> {
    ledger: RiskLedger,
    cache: Arc<OrderBookCache>,
    watcher: WatcherHandle,
    threshold_builder: ThresholdMapBuilder<L>,
    subscribed_games: Mutex<HashSet<GameId>>,
    edge_cfg: EdgeConfig,
    risk_cfg: RiskLimitsConfig,
}

impl<L: MarketLister> Brain<L> {
    pub fn new(
        ledger: RiskLedger,
        cache: Arc<OrderBookCache>,
        watcher: WatcherHandle,
        threshold_builder: ThresholdMapBuilder<L>,
        edge_cfg: EdgeConfig,
        risk_cfg: RiskLimitsConfig,
    ) -> Self {
        Self {
            ledger,
            cache,
            watcher,
            threshold_builder,
            subscribed_games: Mutex::new(HashSet::new()),
            edge_cfg,
            risk_cfg,
        }
    }

    pub async fn run(
        self,
        mut game_events: Receiver<GameEvent>,
        execute_trades: Sender<ExecuteTrade>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                event = game_events.recv() => {
                    match event {
                        Some(event) => self.handle_event(event, &execute_trades).await,
                        None => break,
                    }
                }
            }
        }
    }

    async fn handle_event(&self, event: GameEvent, execute_trades: &Sender<ExecuteTrade>) {
        if risk_gate(&self.ledger, &event.game_id).is_err() {
            debug!(game_id = %event.game_id, "brain: risk gate closed, discarding event");
            return;
        }
        if self.ledger.trades_this_game(&event.game_id) >= self.risk_cfg.max_trades_per_game {
            debug!(game_id = %event.game_id, "brain: per-game trade count gate closed");
            return;
        }

        let map = match self.threshold_map_for(&event).await {
            Ok(map) => map,
            Err(e) => {
                warn!(game_id = %event.game_id, error = %e, "brain: threshold map build failed");
                return;
            }
        };
        if map.is_empty() {
            return;
        }

        let risk_snapshot = self.ledger.snapshot();
        let trades = edge::evaluate(
            (event.away_score, event.home_score),
            &map,
            &self.cache,
            risk_snapshot,
            &self.edge_cfg,
            self.risk_cfg.max_open_exposure_cents,
            &event.game_id,
            std::time::Instant::now(),
        );

        for trade in trades {
            self.ledger.record_optimistic_trade(&event.game_id);
            execute_trades.publish(trade).await;
        }
    }

    async fn threshold_map_for(&self, event: &GameEvent) -> crate::error::Result<ThresholdMap> {
        // `ThresholdMapBuilder::build` already memoizes per game_id and
        // coalesces concurrent in-flight builds; this just decides whether
        // the resulting tickers still need to be handed to Watcher.
        let map = self.threshold_builder.build(event).await?;

        let first_time = self.subscribed_games.lock().insert(event.game_id.clone());
        if first_time {
            let tickers: Vec<_> = map.entries().iter().map(|e| e.ticker.clone()).collect();
            if !tickers.is_empty() {
                self.watcher.subscribe(tickers).await;
            }
        }
        Ok(map)
    }
}
