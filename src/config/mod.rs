//! Typed configuration: on-disk TOML document, env var overrides for
//! secrets, and fail-fast validation.
//!
//! Mirrors the teacher's `app/config` split: the document shape maps
//! directly onto the config file, secrets are never read from the file
//! itself, and `Config::load` always ends with `validate()` before any I/O
//! happens.

mod logging;

pub use logging::LoggingConfig;

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Env var holding the PEM-encoded exchange private key. Never read from
/// the config file — see spec.md §1's "request signing primitives" scoping
/// and the teacher's `WALLET_PRIVATE_KEY`-from-env-only convention.
pub const PRIVATE_KEY_ENV: &str = "ALTARB_PRIVATE_KEY";
pub const PRIVATE_KEY_PATH_ENV: &str = "ALTARB_PRIVATE_KEY_PATH";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub rest_url: String,
    pub ws_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rest_url: "https://trading-api.kalshi.com/trade-api/v2".into(),
            ws_url: "wss://trading-api.kalshi.com/trade-api/ws/v2".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoreFeedConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
}

impl Default for ScoreFeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://scores.example.com".into(),
            poll_interval_ms: 750,
        }
    }
}

/// One entry in the series map: per sport tag, how its tickers and the
/// score provider's competition id relate.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesConfig {
    pub series_prefix: String,
    pub line_spacing: u32,
    pub score_provider_competition_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskLimitsConfig {
    pub max_daily_loss_cents: i64,
    pub max_open_exposure_cents: i64,
    pub max_trades_per_game: u32,
}

impl Default for RiskLimitsConfig {
    fn default() -> Self {
        Self {
            max_daily_loss_cents: 10_000,
            max_open_exposure_cents: 50_000,
            max_trades_per_game: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub min_edge_cents: u8,
    pub max_price_slippage_cents: u8,
    pub default_quantity: u32,
    pub max_quantity: u32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            min_edge_cents: 3,
            max_price_slippage_cents: 2,
            default_quantity: 10,
            max_quantity: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectionConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_pct: f64,
    pub idle_timeout_ms: u64,
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 100,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter_pct: 0.10,
            idle_timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SniperConfig {
    pub order_timeout_ms: u64,
    pub breaker_failure_threshold: u32,
    pub breaker_cooldown_ms: u64,
    pub breaker_max_cooldown_ms: u64,
}

impl Default for SniperConfig {
    fn default() -> Self {
        Self {
            order_timeout_ms: 500,
            breaker_failure_threshold: 3,
            breaker_cooldown_ms: 30_000,
            breaker_max_cooldown_ms: 300_000,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub score_feed: ScoreFeedConfig,
    pub series: HashMap<String, SeriesConfig>,
    pub risk: RiskLimitsConfig,
    pub edge: EdgeConfig,
    pub reconnection: ReconnectionConfig,
    pub sniper: SniperConfig,
    pub logging: LoggingConfig,
    pub dry_run: bool,

    /// Loaded from `ALTARB_PRIVATE_KEY` / `ALTARB_PRIVATE_KEY_PATH` at load
    /// time, never deserialized from the file.
    #[serde(skip)]
    pub private_key_pem: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            score_feed: ScoreFeedConfig::default(),
            series: HashMap::new(),
            risk: RiskLimitsConfig::default(),
            edge: EdgeConfig::default(),
            reconnection: ReconnectionConfig::default(),
            sniper: SniperConfig::default(),
            logging: LoggingConfig::default(),
            dry_run: false,
            private_key_pem: None,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file: {e}")))?;

        let mut config: Config = toml::from_str(&content)?;
        config.private_key_pem = Self::load_private_key()?;
        config.validate()?;
        Ok(config)
    }

    fn load_private_key() -> Result<Option<String>> {
        if let Ok(pem) = std::env::var(PRIVATE_KEY_ENV) {
            return Ok(Some(pem));
        }
        if let Ok(path) = std::env::var(PRIVATE_KEY_PATH_ENV) {
            let pem = std::fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("failed to read {PRIVATE_KEY_PATH_ENV}: {e}")))?;
            return Ok(Some(pem));
        }
        Ok(None)
    }

    fn validate(&self) -> Result<()> {
        if self.network.rest_url.is_empty() {
            return Err(Error::Config("network.rest_url cannot be empty".into()));
        }
        if self.network.ws_url.is_empty() {
            return Err(Error::Config("network.ws_url cannot be empty".into()));
        }
        if self.score_feed.base_url.is_empty() {
            return Err(Error::Config("score_feed.base_url cannot be empty".into()));
        }
        if self.series.is_empty() {
            return Err(Error::Config(
                "series map must contain at least one sport entry".into(),
            ));
        }
        for (sport, series) in &self.series {
            if series.series_prefix.is_empty() {
                return Err(Error::Config(format!(
                    "series[{sport}].series_prefix cannot be empty"
                )));
            }
            if series.line_spacing == 0 {
                return Err(Error::Config(format!(
                    "series[{sport}].line_spacing must be positive"
                )));
            }
        }
        if self.risk.max_daily_loss_cents <= 0 {
            return Err(Error::Config("risk.max_daily_loss_cents must be positive".into()));
        }
        if self.risk.max_open_exposure_cents <= 0 {
            return Err(Error::Config(
                "risk.max_open_exposure_cents must be positive".into(),
            ));
        }
        if self.risk.max_trades_per_game == 0 {
            return Err(Error::Config("risk.max_trades_per_game must be positive".into()));
        }
        if self.edge.min_edge_cents == 0 || self.edge.min_edge_cents > 93 {
            return Err(Error::Config("edge.min_edge_cents must be in 1..=93".into()));
        }
        if self.edge.default_quantity == 0 || self.edge.default_quantity > self.edge.max_quantity {
            return Err(Error::Config(
                "edge.default_quantity must be positive and <= max_quantity".into(),
            ));
        }
        if self.reconnection.initial_delay_ms == 0
            || self.reconnection.max_delay_ms < self.reconnection.initial_delay_ms
        {
            return Err(Error::Config(
                "reconnection delay bounds must be positive and ordered".into(),
            ));
        }
        if self.reconnection.backoff_multiplier <= 1.0 {
            return Err(Error::Config(
                "reconnection.backoff_multiplier must be > 1.0".into(),
            ));
        }
        if self.sniper.order_timeout_ms == 0 {
            return Err(Error::Config("sniper.order_timeout_ms must be positive".into()));
        }
        if self.sniper.breaker_failure_threshold == 0 {
            return Err(Error::Config(
                "sniper.breaker_failure_threshold must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        self.logging.init();
    }
}
