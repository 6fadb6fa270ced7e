//! Mock [`ScoreProvider`] implementation for testing. Same scripted-double
//! idiom as [`super::stream::ScriptedStream`]: pre-loaded poll results,
//! consumed in order.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{RawGameRecord, SportTag};
use crate::oracle::ScoreProvider;

/// A mock score provider with a scripted sequence of poll results.
///
/// Each call to `poll()` pops the next result from the queue; once
/// exhausted, returns an empty record list.
pub struct ScriptedScoreProvider {
    sport: SportTag,
    results: Mutex<Vec<Result<Vec<RawGameRecord>>>>,
}

impl ScriptedScoreProvider {
    pub fn new(sport: SportTag, results: Vec<Result<Vec<RawGameRecord>>>) -> Self {
        let mut results = results;
        results.reverse();
        Self { sport, results: Mutex::new(results) }
    }
}

#[async_trait]
impl ScoreProvider for ScriptedScoreProvider {
    async fn poll(&self) -> Result<Vec<RawGameRecord>> {
        match self.results.lock().unwrap().pop() {
            Some(result) => result,
            None => Ok(Vec::new()),
        }
    }

    fn sport(&self) -> &SportTag {
        &self.sport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameId, GameStatus};
    use chrono::Utc;

    fn record(id: &str) -> RawGameRecord {
        RawGameRecord {
            game_id: GameId::new(id),
            sport: SportTag::new("nfl"),
            status: GameStatus::InProgress,
            away_code: "DEN".into(),
            home_code: "KC".into(),
            away_score: 7,
            home_score: 0,
            kickoff: Utc::now(),
        }
    }

    #[tokio::test]
    async fn replays_scripted_polls_then_returns_empty() {
        let provider =
            ScriptedScoreProvider::new(SportTag::new("nfl"), vec![Ok(vec![record("g1")]), Ok(Vec::new())]);
        assert_eq!(provider.poll().await.unwrap().len(), 1);
        assert_eq!(provider.poll().await.unwrap().len(), 0);
        assert_eq!(provider.poll().await.unwrap().len(), 0);
    }
}
