//! The fee-aware edge evaluator: candidate selection, orderbook read, edge
//! calculation, exposure gate, and `ExecuteTrade` construction (spec §4.4
//! steps 4-8).

use crate::config::EdgeConfig;
use crate::model::{ExecuteTrade, GameId, RiskSnapshot, ThresholdMap, NET_PAYOUT_CENTS};
use crate::watcher::OrderBookCache;

/// Evaluate one `GameEvent`'s observed total against a game's threshold
/// map and the live orderbook cache, producing zero or more `ExecuteTrade`
/// commands — one per qualifying line, ascending by threshold, per spec's
/// explicit "emit one per qualifying line" resolution of the open question
/// in §9.
///
/// Exposure accumulates across candidates within this single call, seeded
/// from the risk snapshot's current open exposure, so multiple trades
/// emitted from one event share the same exposure budget.
#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    score_at_decision: (u32, u32),
    threshold_map: &ThresholdMap,
    cache: &OrderBookCache,
    risk: RiskSnapshot,
    edge_cfg: &EdgeConfig,
    max_open_exposure_cents: i64,
    game_id: &GameId,
    signal_at: std::time::Instant,
) -> Vec<ExecuteTrade> {
    let observed_total = score_at_decision.0 + score_at_decision.1;
    let mut trades = Vec::new();
    let mut running_exposure = risk.open_exposure_cents;

    for candidate in threshold_map.candidates_below(observed_total) {
        let book = match cache.get(&candidate.ticker) {
            Some(book) => book,
            None => continue,
        };
        let best_ask = match book.best_yes_ask_cents() {
            Some(ask) => ask,
            None => continue,
        };

        let edge_cents = NET_PAYOUT_CENTS as i32 - best_ask as i32;
        if edge_cents < edge_cfg.min_edge_cents as i32 {
            continue;
        }

        let quantity = edge_cfg.default_quantity.min(edge_cfg.max_quantity);
        let cost_cents = best_ask as i64 * quantity as i64;
        if running_exposure + cost_cents > max_open_exposure_cents {
            continue;
        }

        let cap_price = NET_PAYOUT_CENTS as i32 - edge_cfg.min_edge_cents as i32
            + edge_cfg.max_price_slippage_cents as i32;
        let limit_price = (best_ask as i32 + edge_cfg.max_price_slippage_cents as i32).min(cap_price);

        running_exposure += cost_cents;
        trades.push(ExecuteTrade {
            ticker: candidate.ticker.clone(),
            limit_price_cents: limit_price.clamp(1, 99) as u8,
            quantity,
            signal_at,
            game_id: game_id.clone(),
            score_at_decision,
        });
    }

    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MarketTicker, PriceLevel, Side, ThresholdEntry};

    fn edge_cfg() -> EdgeConfig {
        EdgeConfig {
            min_edge_cents: 3,
            max_price_slippage_cents: 2,
            default_quantity: 10,
            max_quantity: 50,
        }
    }

    fn snapshot() -> RiskSnapshot {
        RiskSnapshot {
            realized_pnl_cents: 0,
            open_exposure_cents: 0,
            is_halted: false,
        }
    }

    fn seed_book(cache: &OrderBookCache, ticker: &str, ask: u8) {
        cache.apply(crate::model::MarketUpdate {
            ticker: MarketTicker::new(ticker),
            sequence: 1,
            is_snapshot: true,
            side: Side::Yes,
            levels: vec![PriceLevel { price_cents: ask, size: 100 }],
        });
    }

    fn run(score: (u32, u32), map: &ThresholdMap, cache: &OrderBookCache) -> Vec<ExecuteTrade> {
        evaluate(
            score,
            map,
            cache,
            snapshot(),
            &edge_cfg(),
            50_000,
            &GameId::new("g1"),
            std::time::Instant::now(),
        )
    }

    #[test]
    fn scenario_one_happy_path() {
        let cache = OrderBookCache::new();
        seed_book(&cache, "T1", 80);
        seed_book(&cache, "T2", 60);

        let map = ThresholdMap::new(vec![
            ThresholdEntry { ticker: MarketTicker::new("T1"), line: 175 },
            ThresholdEntry { ticker: MarketTicker::new("T2"), line: 178 },
            ThresholdEntry { ticker: MarketTicker::new("T3"), line: 181 },
        ]);

        let trades = run((100, 78), &map, &cache);

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].ticker.as_str(), "T1");
        assert_eq!(trades[0].limit_price_cents, 82);
        assert_eq!(trades[0].quantity, 10);
        assert_eq!(trades[1].ticker.as_str(), "T2");
    }

    #[test]
    fn boundary_edge_exactly_min_fires() {
        let cache = OrderBookCache::new();
        seed_book(&cache, "T1", 90); // edge = 93 - 90 = 3 == MIN_EDGE_CENTS
        let map = ThresholdMap::new(vec![ThresholdEntry { ticker: MarketTicker::new("T1"), line: 100 }]);
        let trades = run((60, 41), &map, &cache);
        assert_eq!(trades.len(), 1);
    }

    #[test]
    fn boundary_best_ask_at_net_payout_no_edge() {
        let cache = OrderBookCache::new();
        seed_book(&cache, "T1", 93);
        let map = ThresholdMap::new(vec![ThresholdEntry { ticker: MarketTicker::new("T1"), line: 100 }]);
        let trades = run((60, 41), &map, &cache);
        assert!(trades.is_empty());
    }

    #[test]
    fn stale_or_missing_book_produces_no_trade_and_does_not_panic() {
        let cache = OrderBookCache::new();
        let map = ThresholdMap::new(vec![ThresholdEntry { ticker: MarketTicker::new("T1"), line: 100 }]);
        let trades = run((60, 41), &map, &cache);
        assert!(trades.is_empty());
    }

    #[test]
    fn exposure_gate_skips_candidates_that_would_exceed_the_cap() {
        let cache = OrderBookCache::new();
        seed_book(&cache, "T1", 80);
        seed_book(&cache, "T2", 80);
        let map = ThresholdMap::new(vec![
            ThresholdEntry { ticker: MarketTicker::new("T1"), line: 50 },
            ThresholdEntry { ticker: MarketTicker::new("T2"), line: 60 },
        ]);
        let trades = evaluate(
            (40, 30),
            &map,
            &cache,
            snapshot(),
            &edge_cfg(),
            850, // room for exactly one 10-lot @ 80c (800), not two
            &GameId::new("g1"),
            std::time::Instant::now(),
        );
        assert_eq!(trades.len(), 1);
    }
}
