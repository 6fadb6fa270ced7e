//! Mock [`OrderExecutor`] implementation for testing. Same scripted-double
//! idiom as [`super::stream::ScriptedStream`]: pre-loaded submit results,
//! consumed in order, with a call counter for breaker-trip assertions.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::ExecuteTrade;
use crate::sniper::{OrderExecutor, OrderOutcome};

/// A mock executor with a scripted sequence of submit results.
///
/// Each call to `submit()` pops the next result from the queue; once
/// exhausted, repeats the last result (or `Rejected` if the queue was
/// never populated).
pub struct ScriptedExecutor {
    results: Mutex<Vec<Result<OrderOutcome>>>,
    calls: AtomicU32,
}

impl ScriptedExecutor {
    pub fn new(results: Vec<Result<OrderOutcome>>) -> Self {
        let mut results = results;
        results.reverse();
        Self { results: Mutex::new(results), calls: AtomicU32::new(0) }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderExecutor for ScriptedExecutor {
    async fn submit(&self, _trade: &ExecuteTrade) -> Result<OrderOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.results.lock().unwrap().pop() {
            Some(result) => result,
            None => Ok(OrderOutcome::Rejected { reason: "no scripted response".to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GameId;

    fn trade() -> ExecuteTrade {
        ExecuteTrade {
            ticker: "NFLTOT-24DEC01-T45".to_string().into(),
            limit_price_cents: 50,
            quantity: 10,
            signal_at: std::time::Instant::now(),
            game_id: GameId::new("g1"),
            score_at_decision: (7, 0),
        }
    }

    #[tokio::test]
    async fn replays_scripted_outcomes_and_counts_calls() {
        let executor =
            ScriptedExecutor::new(vec![Ok(OrderOutcome::Filled { qty: 10, avg_price_cents: 50 })]);
        let outcome = executor.submit(&trade()).await.unwrap();
        assert!(matches!(outcome, OrderOutcome::Filled { .. }));
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn exhausted_queue_falls_back_to_rejected() {
        let executor = ScriptedExecutor::new(Vec::new());
        let outcome = executor.submit(&trade()).await.unwrap();
        assert!(matches!(outcome, OrderOutcome::Rejected { .. }));
    }
}
