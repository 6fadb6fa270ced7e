//! `GameEvent` — a score-change observation emitted by the Oracle.

use chrono::{DateTime, Utc};

use super::ids::{GameId, SportTag};

/// A normalized score record as produced by a [`crate::oracle::ScoreProvider`]
/// adapter, before Oracle's dedup-by-total-change filter runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGameRecord {
    pub game_id: GameId,
    pub sport: SportTag,
    pub status: GameStatus,
    pub away_code: String,
    pub home_code: String,
    pub away_score: u32,
    pub home_score: u32,
    pub kickoff: DateTime<Utc>,
}

impl RawGameRecord {
    pub fn total(&self) -> u32 {
        self.away_score + self.home_score
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Final,
    Other,
}

/// A score-change observation. Invariant: `total == away_score + home_score`.
///
/// Emitted by Oracle only when the prior total it has seen for this game
/// differs from the newly observed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEvent {
    pub game_id: GameId,
    pub sport: SportTag,
    pub kickoff: DateTime<Utc>,
    pub away_code: String,
    pub home_code: String,
    pub away_score: u32,
    pub home_score: u32,
    pub clock: Option<String>,
    /// Monotonic observation instant, used only for staleness reasoning —
    /// never serialized, never compared across process restarts.
    pub observed_at: std::time::Instant,
}

impl GameEvent {
    pub fn from_record(record: &RawGameRecord, clock: Option<String>) -> Self {
        Self {
            game_id: record.game_id.clone(),
            sport: record.sport.clone(),
            kickoff: record.kickoff,
            away_code: record.away_code.clone(),
            home_code: record.home_code.clone(),
            away_score: record.away_score,
            home_score: record.home_score,
            clock,
            observed_at: std::time::Instant::now(),
        }
    }

    pub fn total(&self) -> u32 {
        self.away_score + self.home_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(away: u32, home: u32) -> RawGameRecord {
        RawGameRecord {
            game_id: GameId::new("nfl:1"),
            sport: SportTag::new("nfl"),
            status: GameStatus::InProgress,
            away_code: "DEN".into(),
            home_code: "KC".into(),
            away_score: away,
            home_score: home,
            kickoff: Utc::now(),
        }
    }

    #[test]
    fn total_is_sum_of_scores() {
        let r = record(14, 17);
        assert_eq!(r.total(), 31);
        let ev = GameEvent::from_record(&r, None);
        assert_eq!(ev.total(), 31);
    }
}
