//! Bootstrap and shutdown sequencing: load config, pre-flight health
//! check, wire the five agents onto the event bus, run until signalled,
//! then shut down in dependency order. Grounded on the teacher's
//! `app/orchestrator::{Orchestrator, health_check, HealthReport}` — same
//! fail-fast-health-check-before-connecting shape and
//! `run`/`run_with_shutdown` split, generalized from one exchange
//! connection to this pipeline's five tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::brain::{Brain, MarketLister, ThresholdMapBuilder};
use crate::bus::EventBus;
use crate::config::Config;
use crate::error::Result;
use crate::exchange::{load_signer, KalshiOrderBookStream, KalshiRestClient};
use crate::model::SportTag;
use crate::oracle::{HttpScoreProvider, Oracle, ScoreProvider};
use crate::shield::{RiskLedger, Shield};
use crate::sniper::{OrderExecutor, Sniper};
use crate::watcher::{OrderBookCache, OrderBookStream, ReconnectingStream, Watcher};

/// Bounded wait for in-flight work to drain after a shutdown signal before
/// tasks are abandoned.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

#[derive(Debug, Clone)]
pub struct HealthCheck {
    name: &'static str,
    critical: bool,
    status: HealthStatus,
}

impl HealthCheck {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn status(&self) -> &HealthStatus {
        &self.status
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    checks: Vec<HealthCheck>,
}

impl HealthReport {
    pub fn checks(&self) -> &[HealthCheck] {
        &self.checks
    }

    pub fn is_healthy(&self) -> bool {
        self.checks.iter().filter(|c| c.critical()).all(HealthCheck::is_healthy)
    }
}

/// Pre-flight check run before any network connection is attempted.
pub fn health_check(config: &Config) -> HealthReport {
    let mut checks = Vec::new();

    checks.push(HealthCheck {
        name: "exchange_rest",
        critical: true,
        status: if config.network.rest_url.trim().is_empty() {
            HealthStatus::Unhealthy("rest_url is empty".to_string())
        } else {
            HealthStatus::Healthy
        },
    });

    checks.push(HealthCheck {
        name: "exchange_ws",
        critical: true,
        status: if config.network.ws_url.trim().is_empty() {
            HealthStatus::Unhealthy("ws_url is empty".to_string())
        } else {
            HealthStatus::Healthy
        },
    });

    checks.push(HealthCheck {
        name: "score_feed",
        critical: true,
        status: if config.score_feed.base_url.trim().is_empty() {
            HealthStatus::Unhealthy("score_feed.base_url is empty".to_string())
        } else {
            HealthStatus::Healthy
        },
    });

    checks.push(HealthCheck {
        name: "series_config",
        critical: true,
        status: if config.series.is_empty() {
            HealthStatus::Unhealthy("no series configured".to_string())
        } else {
            HealthStatus::Healthy
        },
    });

    checks.push(HealthCheck {
        name: "signing_key",
        critical: !config.dry_run,
        status: if config.private_key_pem.is_some() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy(format!(
                "{} / {} not set",
                crate::config::PRIVATE_KEY_ENV,
                crate::config::PRIVATE_KEY_PATH_ENV
            ))
        },
    });

    HealthReport { checks }
}

pub async fn run(config: Config) -> Result<()> {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    run_with_shutdown(config, shutdown_rx).await
}

pub async fn run_with_shutdown(config: Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    let report = health_check(&config);
    for check in report.checks() {
        if let HealthStatus::Unhealthy(reason) = check.status() {
            if check.critical() {
                error!(check = check.name(), %reason, "supervisor: critical health check failed");
                return Err(crate::error::Error::Config(format!(
                    "{}: {reason}",
                    check.name()
                )));
            }
            warn!(check = check.name(), %reason, "supervisor: non-critical health check failed");
        }
    }
    info!(dry_run = config.dry_run, "altarb starting");

    let api_key_id = std::env::var("ALTARB_API_KEY_ID").unwrap_or_default();
    let signer = config
        .private_key_pem
        .as_deref()
        .map(load_signer)
        .transpose()?;

    let bus = EventBus::new();
    let ledger = RiskLedger::new();
    let cache = Arc::new(OrderBookCache::new());

    let series: HashMap<SportTag, crate::config::SeriesConfig> = config
        .series
        .iter()
        .map(|(tag, cfg)| (SportTag::new(tag.clone()), cfg.clone()))
        .collect();

    // Two independent signer instances: REST and WS sign distinct request
    // lines and are driven by separate tasks, so each transport owns one.
    let ws_signer = config.private_key_pem.as_deref().map(load_signer).transpose()?;
    let rest_client = signer
        .map(|s| Arc::new(KalshiRestClient::new(config.network.rest_url.clone(), api_key_id.clone(), s)));

    warm_connections(&config, &api_key_id, rest_client.as_deref()).await?;

    // Independent shutdown watches so termination can be staged: Oracle
    // stops first (no new game events), then the bus drains downstream
    // agents under a grace period, then Watcher is cancelled last.
    let (oracle_shutdown_tx, oracle_shutdown_rx) = watch::channel(false);
    let (watcher_shutdown_tx, watcher_shutdown_rx) = watch::channel(false);
    let (downstream_shutdown_tx, downstream_shutdown_rx) = watch::channel(false);

    // Watcher: requires a live exchange connection; in dry-run without a
    // signing key, Watcher is skipped and Brain runs against an always-stale
    // cache (no fills will ever be attempted since no orderbook data arrives).
    let mut watcher_task = None;
    let watcher_handle = if let Some(ws_signer) = ws_signer {
        let stream = KalshiOrderBookStream::new(config.network.ws_url.clone(), api_key_id.clone(), ws_signer);
        let reconnecting = ReconnectingStream::new(stream, config.reconnection.clone());
        let (watcher, watcher_handle) = Watcher::new(reconnecting, Arc::clone(&cache));
        watcher_task = Some(tokio::spawn(watcher.run(watcher_shutdown_rx)));
        watcher_handle
    } else {
        warn!("supervisor: no signing key configured, running without a live orderbook stream");
        let (_watcher, watcher_handle) = Watcher::new(NullStream, Arc::clone(&cache));
        watcher_handle
    };

    // Oracle: one HTTP score provider per configured series/sport.
    let providers: Vec<Box<dyn ScoreProvider>> = config
        .series
        .iter()
        .map(|(sport, series_cfg)| {
            let competition_path = series_cfg.score_provider_competition_id.as_deref().unwrap_or(sport);
            let provider: Box<dyn ScoreProvider> = Box::new(HttpScoreProvider::new(
                &config.score_feed.base_url,
                competition_path,
                SportTag::new(sport.clone()),
            ));
            provider
        })
        .collect();
    let oracle = Oracle::new(providers, Duration::from_millis(config.score_feed.poll_interval_ms));
    let game_events_tx = bus.game_events_sender();
    let oracle_task = tokio::spawn(oracle.run(game_events_tx, oracle_shutdown_rx));

    let mut downstream_handles = Vec::new();

    // Brain
    if let Some(rest) = rest_client.clone() {
        let builder = ThresholdMapBuilder::new(RestLister(rest), series);
        let brain = Brain::new(
            ledger.clone(),
            Arc::clone(&cache),
            watcher_handle,
            builder,
            config.edge.clone(),
            config.risk.clone(),
        );
        let game_events_rx = bus.game_events_receiver();
        let execute_trades_tx = bus.execute_trades_sender();
        let brain_shutdown = downstream_shutdown_rx.clone();
        downstream_handles.push(tokio::spawn(brain.run(game_events_rx, execute_trades_tx, brain_shutdown)));

        // Sniper
        let sniper = Sniper::new(RestExecutor(rest), &config.sniper);
        let execute_trades_rx = bus.execute_trades_receiver();
        let fill_reports_tx = bus.fill_reports_sender();
        let sniper_shutdown = downstream_shutdown_rx.clone();
        downstream_handles.push(tokio::spawn(sniper.run(execute_trades_rx, fill_reports_tx, sniper_shutdown)));
    } else {
        warn!("supervisor: no signing key configured, Brain/Sniper not started");
    }

    // Shield always runs: it's the sole writer of risk state and must
    // drain `fill_reports` even if nothing is producing them.
    let shield = Shield::new(
        ledger,
        config.risk.max_daily_loss_cents,
        config.risk.max_open_exposure_cents,
        config.risk.max_trades_per_game,
    );
    let fill_reports_rx = bus.fill_reports_receiver();
    let shield_shutdown = downstream_shutdown_rx.clone();
    downstream_handles.push(tokio::spawn(shield.run(fill_reports_rx, shield_shutdown)));

    wait_for_shutdown(shutdown).await;

    info!("supervisor: stopping oracle");
    let _ = oracle_shutdown_tx.send(true);
    if tokio::time::timeout(SHUTDOWN_GRACE, oracle_task).await.is_err() {
        warn!("supervisor: oracle did not stop within the grace period");
    }

    info!("supervisor: draining execute_trades and fill_reports");
    bus.close();
    let _ = downstream_shutdown_tx.send(true);
    drain(downstream_handles).await;

    info!("supervisor: cancelling watcher");
    let _ = watcher_shutdown_tx.send(true);
    if let Some(watcher_task) = watcher_task {
        if tokio::time::timeout(SHUTDOWN_GRACE, watcher_task).await.is_err() {
            warn!("supervisor: watcher did not stop within the grace period");
        }
    }

    Ok(())
}

/// Pre-resolve DNS for the REST and WS hosts and open one warmed
/// connection to each before any agent starts, so a bad key or an
/// unreachable host fails the boot instead of surfacing mid-trade.
async fn warm_connections(config: &Config, api_key_id: &str, rest_client: Option<&KalshiRestClient>) -> Result<()> {
    pre_resolve(&config.network.rest_url).await?;
    pre_resolve(&config.network.ws_url).await?;

    let Some(rest_client) = rest_client else {
        warn!("supervisor: no signing key configured, skipping authenticated connection warm-up");
        return Ok(());
    };

    rest_client.account_lookup().await.map_err(|e| {
        error!(error = %e, "supervisor: REST warm-up account lookup failed");
        e
    })?;

    let warm_signer = config
        .private_key_pem
        .as_deref()
        .map(load_signer)
        .transpose()?
        .expect("signing key is present: rest_client was built from one");
    let mut warm_stream =
        KalshiOrderBookStream::new(config.network.ws_url.clone(), api_key_id.to_string(), warm_signer);
    warm_stream.connect().await.map_err(|e| {
        error!(error = %e, "supervisor: WS warm-up connection failed");
        e
    })?;

    info!("supervisor: warmed REST and WS connections");
    Ok(())
}

/// Resolves `url`'s host to catch DNS failures before any agent attempts a
/// live connection against it.
async fn pre_resolve(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url)?;
    let host = parsed
        .host_str()
        .ok_or_else(|| crate::error::Error::Config(format!("url has no host: {url}")))?;
    let port = parsed.port_or_known_default().unwrap_or(443);

    let mut addrs = tokio::net::lookup_host((host, port)).await?;
    if addrs.next().is_none() {
        return Err(crate::error::Error::Transport(format!("dns resolution returned no addresses for {host}")));
    }
    Ok(())
}

/// Waits for either an external shutdown signal on the watch channel or
/// Ctrl+C/SIGTERM directly, whichever comes first.
async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    tokio::select! {
        _ = shutdown.changed() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("supervisor: received shutdown signal");
        }
    }
}

async fn drain(handles: Vec<tokio::task::JoinHandle<()>>) {
    let all = futures_util::future::join_all(handles);
    match tokio::time::timeout(SHUTDOWN_GRACE, all).await {
        Ok(_) => info!("supervisor: all tasks drained cleanly"),
        Err(_) => warn!("supervisor: shutdown grace period elapsed, some tasks may have been abandoned"),
    }
}

/// A `MarketLister` adapter over the shared REST client handle, so Brain's
/// builder doesn't need to know about `Arc`.
struct RestLister(Arc<KalshiRestClient>);

#[async_trait::async_trait]
impl crate::brain::MarketLister for RestLister {
    async fn list_tickers(&self, series_prefix: &str, datecode_hint: &str) -> Result<Vec<String>> {
        self.0.list_tickers(series_prefix, datecode_hint).await
    }
}

struct RestExecutor(Arc<KalshiRestClient>);

#[async_trait::async_trait]
impl crate::sniper::OrderExecutor for RestExecutor {
    async fn submit(&self, trade: &crate::model::ExecuteTrade) -> Result<crate::sniper::OrderOutcome> {
        self.0.submit(trade).await
    }
}

/// No-op stream used when the crate is started without a signing key
/// (dry-run exploration of Oracle/config alone); never produces events.
struct NullStream;

#[async_trait::async_trait]
impl crate::watcher::OrderBookStream for NullStream {
    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    async fn subscribe(&mut self, _tickers: &[crate::model::MarketTicker]) -> Result<()> {
        Ok(())
    }

    async fn next_event(&mut self) -> Option<crate::watcher::MarketEvent> {
        std::future::pending().await
    }

    fn exchange_name(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        let mut config = Config::default();
        config.series.insert(
            "nfl".to_string(),
            crate::config::SeriesConfig {
                series_prefix: "NFLTOT".to_string(),
                line_spacing: 1,
                score_provider_competition_id: None,
            },
        );
        config
    }

    #[test]
    fn health_check_passes_with_a_complete_dry_run_config() {
        let mut config = base_config();
        config.dry_run = true;
        let report = health_check(&config);
        assert!(report.is_healthy());
    }

    #[test]
    fn health_check_fails_without_series_config() {
        let report = health_check(&Config::default());
        assert!(!report.is_healthy());
        let check = report.checks().iter().find(|c| c.name() == "series_config").unwrap();
        assert!(!check.is_healthy());
    }

    #[test]
    fn health_check_requires_signing_key_unless_dry_run() {
        let config = base_config();
        let report = health_check(&config);
        assert!(!report.is_healthy());
        let check = report.checks().iter().find(|c| c.name() == "signing_key").unwrap();
        assert!(!check.is_healthy());
    }

    #[test]
    fn health_report_checks_accessor_exposes_all_checks() {
        let report = health_check(&base_config());
        assert!(report.checks().len() >= 5);
    }
}
