//! Threshold-map construction: fetch today's markets for a game's series,
//! parse tickers, resolve the away/home split, and memoize the result.
//!
//! Concurrent builds for the same `game_id` coalesce onto a single
//! in-flight future rather than firing duplicate REST calls — the same
//! single-flight shape the teacher uses for inference memoization
//! (`core/inference`), adapted here with a plain `tokio::sync::Mutex` cell
//! per game rather than a full actor.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::config::SeriesConfig;
use crate::error::Result;
use crate::model::{GameEvent, GameId, SportTag, ThresholdEntry, ThresholdMap};

use super::resolver::ResolverMemo;
use super::ticker;

/// Abstraction over "list today's markets for this series" — the only
/// exchange REST call Brain needs. A concrete implementation lives in
/// [`crate::exchange`].
#[async_trait]
pub trait MarketLister: Send + Sync {
    async fn list_tickers(&self, series_prefix: &str, datecode_hint: &str) -> Result<Vec<String>>;
}

pub struct ThresholdMapBuilder<L: MarketLister> {
    lister: L,
    series: HashMap<SportTag, SeriesConfig>,
    resolver: ResolverMemo,
    in_flight: SyncMutex<HashMap<GameId, Arc<AsyncMutex<Option<ThresholdMap>>>>>,
}

impl<L: MarketLister> ThresholdMapBuilder<L> {
    pub fn new(lister: L, series: HashMap<SportTag, SeriesConfig>) -> Self {
        Self {
            lister,
            series,
            resolver: ResolverMemo::new(),
            in_flight: SyncMutex::new(HashMap::new()),
        }
    }

    /// Build (or return the memoized) threshold map for the game this
    /// event belongs to. Idempotent per `game_id`: a second call returns
    /// the same map without an additional REST call.
    pub async fn build(&self, event: &GameEvent) -> Result<ThresholdMap> {
        let cell = {
            let mut in_flight = self.in_flight.lock();
            in_flight
                .entry(event.game_id.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(None)))
                .clone()
        };

        let mut guard = cell.lock().await;
        if let Some(map) = guard.as_ref() {
            return Ok(map.clone());
        }

        let series_config = self.series.get(&event.sport).ok_or_else(|| {
            crate::error::Error::Config(format!("no series config for sport {}", event.sport))
        })?;

        let datecode_hint = event.kickoff.format("%Y%m%d").to_string();
        let tickers = self
            .lister
            .list_tickers(&series_config.series_prefix, &datecode_hint)
            .await?;

        let mut entries = Vec::new();
        for raw in tickers {
            let parsed = match ticker::parse(&raw, &[series_config.series_prefix.as_str()]) {
                Ok(p) => p,
                Err(_) => continue,
            };
            let split = self.resolver.split(
                &parsed.series,
                event.game_id.as_str(),
                &parsed.team_blob,
                &event.away_code,
                &event.home_code,
            );
            if split.is_none() {
                // Resolver no-match is non-fatal: exclude this market.
                continue;
            }
            entries.push(ThresholdEntry {
                ticker: raw.into(),
                line: parsed.threshold,
            });
        }

        let map = ThresholdMap::new(entries);
        *guard = Some(map.clone());
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeLister {
        tickers: Vec<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketLister for FakeLister {
        async fn list_tickers(&self, _series_prefix: &str, _datecode_hint: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.tickers.clone())
        }
    }

    fn event() -> GameEvent {
        GameEvent {
            game_id: GameId::new("g1"),
            sport: SportTag::new("nfl"),
            kickoff: Utc::now(),
            away_code: "DENF".into(),
            home_code: "KC".into(),
            away_score: 14,
            home_score: 17,
            clock: None,
            observed_at: std::time::Instant::now(),
        }
    }

    fn series_map() -> HashMap<SportTag, SeriesConfig> {
        let mut m = HashMap::new();
        m.insert(
            SportTag::new("nfl"),
            SeriesConfig {
                series_prefix: "NFLTOT".into(),
                line_spacing: 1,
                score_provider_competition_id: None,
            },
        );
        m
    }

    #[tokio::test]
    async fn builds_a_threshold_map_from_parseable_tickers() {
        let lister = FakeLister {
            tickers: vec![
                "NFLTOT-20260103DENKC-T44".into(),
                "NFLTOT-20260103DENKC-T31".into(),
                "NBATOT-20260103DENKC-T10".into(), // wrong series, skipped
            ],
            calls: AtomicUsize::new(0),
        };
        let builder = ThresholdMapBuilder::new(lister, series_map());
        let map = builder.build(&event()).await.unwrap();
        assert_eq!(map.entries().len(), 2);
        assert_eq!(map.entries()[0].line, 31);
        assert_eq!(map.entries()[1].line, 44);
    }

    #[tokio::test]
    async fn second_build_for_same_game_is_memoized_without_another_fetch() {
        let lister = FakeLister {
            tickers: vec!["NFLTOT-20260103DENKC-T44".into()],
            calls: AtomicUsize::new(0),
        };
        let builder = ThresholdMapBuilder::new(lister, series_map());
        builder.build(&event()).await.unwrap();
        builder.build(&event()).await.unwrap();
        assert_eq!(builder.lister.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unresolvable_market_is_excluded_not_fatal() {
        let lister = FakeLister {
            tickers: vec!["NFLTOT-20260103ZZZZZZ-T44".into()],
            calls: AtomicUsize::new(0),
        };
        let builder = ThresholdMapBuilder::new(lister, series_map());
        let map = builder.build(&event()).await.unwrap();
        assert!(map.is_empty());
    }
}
