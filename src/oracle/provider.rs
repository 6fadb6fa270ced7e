//! Pluggable score-feed adapters.
//!
//! New score sources are added without touching the poll loop: implement
//! [`ScoreProvider`] and register it with [`crate::oracle::Oracle::new`].
//! Shaped the same way the teacher makes `MarketFetcher`/`ExchangeConfig`
//! pluggable (`core/exchange/traits.rs`, `core/exchange/factory.rs`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::Result;
use crate::model::{GameId, GameStatus, RawGameRecord, SportTag};

#[async_trait]
pub trait ScoreProvider: Send + Sync {
    /// Fetch the current state of all live games this provider covers.
    async fn poll(&self) -> Result<Vec<RawGameRecord>>;

    fn sport(&self) -> &SportTag;
}

/// A raw record as the upstream JSON array encodes it, before normalization.
#[derive(Debug, Clone, Deserialize)]
struct WireRecord {
    id: String,
    status: String,
    away_code: String,
    home_code: String,
    away_score: u32,
    home_score: u32,
    start_time: DateTime<Utc>,
}

fn normalize_status(raw: &str) -> GameStatus {
    match raw.to_ascii_lowercase().as_str() {
        "scheduled" | "pre" | "pregame" => GameStatus::Scheduled,
        "in_progress" | "live" | "inprogress" => GameStatus::InProgress,
        "final" | "complete" | "closed" => GameStatus::Final,
        _ => GameStatus::Other,
    }
}

/// Generic polling adapter for a provider that exposes a flat JSON array of
/// live games at a fixed URL. One instance is configured per sport tag.
pub struct HttpScoreProvider {
    client: reqwest::Client,
    url: String,
    sport: SportTag,
}

impl HttpScoreProvider {
    pub fn new(base_url: &str, competition_path: &str, sport: SportTag) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/{}", base_url.trim_end_matches('/'), competition_path),
            sport,
        }
    }
}

#[async_trait]
impl ScoreProvider for HttpScoreProvider {
    async fn poll(&self) -> Result<Vec<RawGameRecord>> {
        let records: Vec<WireRecord> = self.client.get(&self.url).send().await?.json().await?;

        Ok(records
            .into_iter()
            .filter_map(|r| {
                Some(RawGameRecord {
                    game_id: GameId::new(r.id),
                    sport: self.sport.clone(),
                    status: normalize_status(&r.status),
                    away_code: r.away_code,
                    home_code: r.home_code,
                    away_score: r.away_score,
                    home_score: r.home_score,
                    kickoff: r.start_time,
                })
            })
            .collect())
    }

    fn sport(&self) -> &SportTag {
        &self.sport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_known_status_strings() {
        assert_eq!(normalize_status("LIVE"), GameStatus::InProgress);
        assert_eq!(normalize_status("final"), GameStatus::Final);
        assert_eq!(normalize_status("weird"), GameStatus::Other);
    }
}
