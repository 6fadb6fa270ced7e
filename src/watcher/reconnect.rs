//! Reconnecting wrapper around any [`OrderBookStream`]: exponential
//! backoff with jitter, and a circuit breaker that pauses reconnect
//! attempts after repeated failure.
//!
//! Grounded on the teacher's `core/exchange/reconnecting.rs`
//! `ReconnectingDataStream` — same `CircuitState`/backoff/resubscribe
//! shape, generalized to this crate's tickers and config fields.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use tracing::{info, warn};

use crate::config::ReconnectionConfig;
use crate::error::Result;
use crate::model::MarketTicker;

use super::stream::{MarketEvent, OrderBookStream};

const MAX_CONSECUTIVE_FAILURES: u32 = 5;
const CIRCUIT_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
enum CircuitState {
    Closed,
    Open { until: Instant },
}

pub struct ReconnectingStream<S: OrderBookStream> {
    inner: S,
    config: ReconnectionConfig,
    subscribed: Vec<MarketTicker>,
    consecutive_failures: u32,
    current_delay_ms: u64,
    circuit: CircuitState,
    connected: bool,
}

impl<S: OrderBookStream> ReconnectingStream<S> {
    pub fn new(inner: S, config: ReconnectionConfig) -> Self {
        let current_delay_ms = config.initial_delay_ms;
        Self {
            inner,
            config,
            subscribed: Vec::new(),
            consecutive_failures: 0,
            current_delay_ms,
            circuit: CircuitState::Closed,
            connected: false,
        }
    }

    fn reset_backoff(&mut self) {
        self.current_delay_ms = self.config.initial_delay_ms;
        self.consecutive_failures = 0;
    }

    fn next_delay(&mut self) -> Duration {
        let base = self.current_delay_ms;
        self.current_delay_ms = std::cmp::min(
            (self.current_delay_ms as f64 * self.config.backoff_multiplier) as u64,
            self.config.max_delay_ms,
        );
        let jitter_span = (base as f64 * self.config.jitter_pct) as i64;
        let jitter = if jitter_span > 0 {
            rand::thread_rng().gen_range(-jitter_span..=jitter_span)
        } else {
            0
        };
        Duration::from_millis((base as i64 + jitter).max(0) as u64)
    }

    fn circuit_allows_connection(&mut self) -> bool {
        match self.circuit {
            CircuitState::Closed => true,
            CircuitState::Open { until } => {
                if Instant::now() >= until {
                    self.circuit = CircuitState::Closed;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn record_failure(&mut self) {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
            warn!(
                failures = self.consecutive_failures,
                "watcher stream tripping circuit breaker"
            );
            self.circuit = CircuitState::Open {
                until: Instant::now() + CIRCUIT_COOLDOWN,
            };
        }
    }

    async fn reconnect(&mut self) {
        loop {
            if !self.circuit_allows_connection() {
                tokio::time::sleep(Duration::from_millis(250)).await;
                continue;
            }
            let delay = self.next_delay();
            tokio::time::sleep(delay).await;

            match self.inner.connect().await {
                Ok(()) => {
                    if !self.subscribed.is_empty() {
                        if let Err(e) = self.inner.subscribe(&self.subscribed).await {
                            warn!(error = %e, "resubscribe after reconnect failed");
                            self.record_failure();
                            continue;
                        }
                    }
                    info!("watcher stream reconnected");
                    self.connected = true;
                    self.reset_backoff();
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "watcher stream reconnect failed");
                    self.record_failure();
                }
            }
        }
    }
}

#[async_trait]
impl<S: OrderBookStream> OrderBookStream for ReconnectingStream<S> {
    async fn connect(&mut self) -> Result<()> {
        match self.inner.connect().await {
            Ok(()) => {
                self.connected = true;
                Ok(())
            }
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        }
    }

    async fn subscribe(&mut self, tickers: &[MarketTicker]) -> Result<()> {
        self.subscribed = tickers.to_vec();
        self.inner.subscribe(tickers).await
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        loop {
            if !self.connected {
                self.reconnect().await;
            }
            match self.inner.next_event().await {
                Some(MarketEvent::Disconnected { reason }) => {
                    warn!(reason, "watcher stream disconnected, reconnecting");
                    self.connected = false;
                    self.record_failure();
                    continue;
                }
                Some(event) => {
                    if self.consecutive_failures > 0 {
                        self.reset_backoff();
                    }
                    return Some(event);
                }
                None => return None,
            }
        }
    }

    fn exchange_name(&self) -> &'static str {
        self.inner.exchange_name()
    }
}
