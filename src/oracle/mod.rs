//! Oracle: polls score-feed adapters, normalizes, and emits [`GameEvent`]s
//! deduped strictly by total-score change.

mod provider;

pub use provider::{HttpScoreProvider, ScoreProvider};

use std::collections::HashMap;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::bus::Sender;
use crate::model::{GameEvent, GameId, GameStatus, RawGameRecord};

/// How far into the future a kickoff timestamp may be before a record is
/// treated as a provider clock-skew artifact and discarded.
const CLOCK_SKEW_GUARD: ChronoDuration = ChronoDuration::minutes(10);

/// Cap on exponential backoff after a transient poll failure; the poll
/// loop itself never exits on a transient error.
const MAX_BACKOFF: Duration = Duration::from_secs(5);

pub struct Oracle {
    providers: Vec<Box<dyn ScoreProvider>>,
    poll_interval: Duration,
    last_total_by_game: HashMap<GameId, u32>,
}

impl Oracle {
    pub fn new(providers: Vec<Box<dyn ScoreProvider>>, poll_interval: Duration) -> Self {
        Self {
            providers,
            poll_interval,
            last_total_by_game: HashMap::new(),
        }
    }

    /// Drive the poll loop until `shutdown` fires.
    pub async fn run(mut self, game_events: Sender<GameEvent>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        let mut backoff = self.poll_interval;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("oracle shutting down");
                        break;
                    }
                }
                _ = interval.tick() => {
                    let mut any_failure = false;
                    for provider in &self.providers {
                        match provider.poll().await {
                            Ok(records) => {
                                for record in records {
                                    if let Some(event) = self.process_record(&record) {
                                        game_events.publish(event).await;
                                    }
                                }
                            }
                            Err(e) => {
                                any_failure = true;
                                warn!(sport = %provider.sport(), error = %e, "score provider poll failed");
                            }
                        }
                    }
                    backoff = if any_failure {
                        std::cmp::min(backoff * 2, MAX_BACKOFF)
                    } else {
                        self.poll_interval
                    };
                    if any_failure {
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
    }

    /// Apply the clock-skew guard, status filter, and dedup-by-total-change
    /// rule to one raw record. Returns `Some(event)` only when a GameEvent
    /// should be emitted.
    fn process_record(&mut self, record: &RawGameRecord) -> Option<GameEvent> {
        let now = chrono::Utc::now();
        if record.kickoff > now + CLOCK_SKEW_GUARD {
            debug!(game_id = %record.game_id, "discarding record: kickoff too far in the future");
            return None;
        }
        if record.status != GameStatus::InProgress {
            return None;
        }

        let total = record.total();
        let changed = match self.last_total_by_game.get(&record.game_id) {
            Some(&last) => last != total,
            None => total != 0,
        };
        self.last_total_by_game.insert(record.game_id.clone(), total);

        if changed {
            Some(GameEvent::from_record(record, None))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, status: GameStatus, away: u32, home: u32) -> RawGameRecord {
        RawGameRecord {
            game_id: GameId::new(id),
            sport: crate::model::SportTag::new("nfl"),
            status,
            away_code: "DEN".into(),
            home_code: "KC".into(),
            away_score: away,
            home_score: home,
            kickoff: Utc::now(),
        }
    }

    fn oracle() -> Oracle {
        Oracle::new(Vec::new(), Duration::from_millis(750))
    }

    #[test]
    fn first_observation_of_a_nonzero_total_emits() {
        let mut oracle = oracle();
        let rec = record("g1", GameStatus::InProgress, 7, 0);
        assert!(oracle.process_record(&rec).is_some());
    }

    #[test]
    fn repeated_identical_total_does_not_re_emit() {
        let mut oracle = oracle();
        let rec = record("g1", GameStatus::InProgress, 7, 0);
        assert!(oracle.process_record(&rec).is_some());
        assert!(oracle.process_record(&rec).is_none());
    }

    #[test]
    fn first_observation_of_a_zero_total_does_not_emit() {
        let mut oracle = oracle();
        let rec = record("g1", GameStatus::InProgress, 0, 0);
        assert!(oracle.process_record(&rec).is_none());
    }

    #[test]
    fn zero_total_then_nonzero_emits_once_it_changes() {
        let mut oracle = oracle();
        oracle.process_record(&record("g1", GameStatus::InProgress, 0, 0));
        let scored = record("g1", GameStatus::InProgress, 7, 0);
        assert!(oracle.process_record(&scored).is_some());
    }

    #[test]
    fn total_change_emits_again() {
        let mut oracle = oracle();
        oracle.process_record(&record("g1", GameStatus::InProgress, 7, 0));
        let changed = record("g1", GameStatus::InProgress, 7, 7);
        assert!(oracle.process_record(&changed).is_some());
    }

    #[test]
    fn non_in_progress_status_is_discarded() {
        let mut oracle = oracle();
        let rec = record("g1", GameStatus::Scheduled, 0, 0);
        assert!(oracle.process_record(&rec).is_none());
    }

    #[test]
    fn far_future_kickoff_is_discarded_as_clock_skew() {
        let mut oracle = oracle();
        let mut rec = record("g1", GameStatus::InProgress, 7, 0);
        rec.kickoff = Utc::now() + ChronoDuration::hours(1);
        assert!(oracle.process_record(&rec).is_none());
    }
}
